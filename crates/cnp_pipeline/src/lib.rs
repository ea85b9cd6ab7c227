pub mod backoff;
pub mod orchestrator;
pub mod queue;
pub mod scheduler;

pub use backoff::{BackoffPolicy, PublishEvent, PublishState};
pub use orchestrator::{CycleReport, Orchestrator, PipelineParts};
pub use queue::{bounded, QueueClosed, QueueConsumer, QueueFull, QueueProducer};
pub use scheduler::{Scheduler, Trigger};

pub mod prelude {
    pub use super::orchestrator::{CycleReport, Orchestrator, PipelineParts};
    pub use super::scheduler::{Scheduler, Trigger};
    pub use tokio_util::sync::CancellationToken;
}
