use async_trait::async_trait;
use bytes::Bytes;

use crate::api::ApiError;

/// Network dependency of the asset cache.
///
/// Any non-success status or transport failure is an error.
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, url: &str) -> Result<Bytes, ApiError>;
}
