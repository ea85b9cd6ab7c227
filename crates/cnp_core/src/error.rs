use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Scraping error: {0}")]
    Scraping(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Compose error: {0}")]
    Compose(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::InvalidUrl(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure classes a publisher reports back to the pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    #[error("rate limited by destination")]
    RateLimited,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("transient failure: {0}")]
    Transient(String),
}

impl PublishError {
    /// Rate limits and transient faults are worth another attempt; permission
    /// problems are not.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, PublishError::Forbidden(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PublishError::RateLimited => "rate_limited",
            PublishError::Forbidden(_) => "forbidden",
            PublishError::Transient(_) => "transient",
        }
    }
}
