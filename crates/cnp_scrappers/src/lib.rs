pub mod manager;
pub mod scrapers;

pub use manager::SourceManager;
pub use scrapers::extractor::HtmlExtractor;
pub use scrapers::feed::FeedSource;
pub use scrapers::page::ScrapeSource;

pub mod prelude {
    pub use super::manager::SourceManager;
    pub use cnp_core::{ArticleRecord, ArticleSource, ContentExtractor, Error, Result};
}
