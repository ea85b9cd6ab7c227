pub mod config;
pub mod error;
pub mod models;
pub mod outcome;
pub mod publish;
pub mod source;
pub mod time;
pub mod types;

pub use error::{Error, PublishError, Result};
pub use models::{fallback_ranking, fallback_summary, Ranker, Summarizer};
pub use outcome::Outcome;
pub use publish::{PostComposer, Publisher};
pub use source::{fetch_all, ArticleSource, ContentExtractor, SourceKind};
pub use time::{Clock, Sleeper, SystemClock, TokioSleeper};
pub use types::{ArticleRecord, EnrichedArticle, Extraction, PostPayload, PublishReceipt};
