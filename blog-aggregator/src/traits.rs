use crate::types::Result;
use async_trait::async_trait;

/// Source of raw feed documents.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the document at `url` in a single attempt.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}
