use async_trait::async_trait;

use super::ApiError;
use crate::models::{CatalogRecord, Category, Credits, Page, ProviderMap, RecordId};

/// One fetch per logical query against the remote catalog.
///
/// Implementations are stateless and do no caching; the sync layer decides
/// what to keep.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    async fn list_by_category(
        &self,
        category: Category,
        page: u32,
    ) -> Result<Page<CatalogRecord>, ApiError>;

    async fn get_detail(&self, id: RecordId) -> Result<CatalogRecord, ApiError>;

    async fn get_credits(&self, id: RecordId) -> Result<Credits, ApiError>;

    async fn list_similar(
        &self,
        id: RecordId,
        page: Option<u32>,
    ) -> Result<Page<CatalogRecord>, ApiError>;

    /// Providers keyed by region code. `None` when the service has no
    /// provider data for the record at all.
    async fn get_providers(&self, id: RecordId) -> Result<Option<ProviderMap>, ApiError>;
}
