pub mod fetcher;
pub mod normalize;
pub mod types;

use async_trait::async_trait;
use thiserror::Error;
use types::RawRecord;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream payload is not a JSON array: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Anything that can hand back one pull of the raw GPS feed.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<RawRecord>, FetchError>;
}
