pub mod dedup;
pub mod file;
pub mod identity;
pub mod similarity;

pub use dedup::{DedupEntry, DedupStore, StoreStats};
pub use identity::{fingerprint, normalize_url};
pub use similarity::{SimilarityError, TfIdf};

pub mod prelude {
    pub use super::dedup::DedupStore;
    pub use super::identity::normalize_url;
}
