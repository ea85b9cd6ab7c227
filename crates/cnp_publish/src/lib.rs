pub mod composer;
pub mod dry_run;
pub mod images;
pub mod x;

pub use composer::TemplateComposer;
pub use dry_run::DryRunPublisher;
pub use x::{XConfig, XPublisher};

pub mod prelude {
    pub use super::composer::TemplateComposer;
    pub use super::dry_run::DryRunPublisher;
    pub use super::x::{XConfig, XPublisher};
    pub use cnp_core::{PostComposer, PostPayload, PublishError, Publisher};
}
