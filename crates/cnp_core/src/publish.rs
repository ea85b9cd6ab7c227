use async_trait::async_trait;

use crate::error::PublishError;
use crate::types::{EnrichedArticle, PostPayload, PublishReceipt};
use crate::Result;

#[async_trait]
pub trait PostComposer: Send + Sync {
    async fn compose(&self, article: &EnrichedArticle) -> Result<PostPayload>;
}

#[async_trait]
pub trait Publisher: Send + Sync {
    fn name(&self) -> &str;

    /// Send one payload. A single call is a single attempt; retries belong to
    /// the caller.
    async fn publish(&self, payload: &PostPayload) -> std::result::Result<PublishReceipt, PublishError>;
}
