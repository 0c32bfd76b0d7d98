use std::sync::Arc;

use tracing::{debug, error, info};

use crate::api::RemoteSource;
use crate::assets::{AssetCache, AssetType};
use crate::config::DEFAULT_REGION;
use crate::error::Result;
use crate::models::{CatalogRecord, Category, Credits, Providers, RecordId};
use crate::store::LocalStore;

/// Decides per request whether to answer from the local store or the remote
/// source, and when to refresh the store in the background.
///
/// Background refreshes are detached `tokio` tasks: callers get no handle,
/// and failures only reach the log. A caller that wants fresher data asks
/// again later.
pub struct SyncOrchestrator {
    remote: Arc<dyn RemoteSource>,
    store: Arc<LocalStore>,
    assets: Option<AssetCache>,
    region: String,
}

impl SyncOrchestrator {
    pub fn new(remote: Arc<dyn RemoteSource>, store: Arc<LocalStore>) -> Self {
        Self {
            remote,
            store,
            assets: None,
            region: DEFAULT_REGION.to_string(),
        }
    }

    /// Prefetch poster and backdrop images for every listing fetched remotely.
    pub fn with_assets(mut self, assets: AssetCache) -> Self {
        self.assets = Some(assets);
        self
    }

    /// Region whose watch providers `fetch_providers` returns.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn store(&self) -> &Arc<LocalStore> {
        &self.store
    }

    /// One page of `category`.
    ///
    /// Page 1 is served from the store when it has members for `category`,
    /// with a background refresh scheduled. Otherwise the remote is asked
    /// directly and its errors are returned; page 1 results replace the
    /// stored members before returning.
    pub async fn fetch_page(&self, page: u32, category: Category) -> Result<Vec<CatalogRecord>> {
        info!(page, %category, "Fetching catalog page");

        if page == 1 {
            let stored = self.store.get_category(category).await;
            if !stored.is_empty() {
                debug!(%category, count = stored.len(), "Serving stored listing");
                self.spawn_category_refresh(category);
                return Ok(stored);
            }
        }

        let mut records = self.remote.list_by_category(category, page).await?.results;
        prefetch_artwork(self.assets.as_ref(), &records);

        if page == 1 {
            self.store.replace_category(records.clone(), category).await?;
            for record in &mut records {
                record.category = Some(category);
            }
        }
        self.mark_favorites(&mut records).await;

        debug!(%category, page, count = records.len(), "Fetched listing from remote");
        Ok(records)
    }

    /// Details for `id`, from the store if present (refreshed in the
    /// background), else from the remote and then stored.
    pub async fn fetch_detail(&self, id: RecordId) -> Result<CatalogRecord> {
        info!(id, "Fetching record detail");

        if let Some(stored) = self.store.get_by_id(id).await {
            debug!(id, "Serving stored detail");
            self.spawn_detail_refresh(id);
            return Ok(stored);
        }

        let record = self.remote.get_detail(id).await?;
        Ok(self.store.upsert_record(record).await?)
    }

    pub async fn fetch_related(&self, id: RecordId, page: Option<u32>) -> Result<Vec<CatalogRecord>> {
        let mut records = self.remote.list_similar(id, page).await?.results;
        self.mark_favorites(&mut records).await;
        Ok(records)
    }

    pub async fn fetch_credits(&self, id: RecordId) -> Result<Credits> {
        Ok(self.remote.get_credits(id).await?)
    }

    /// Watch providers for the configured region, if the remote has any.
    pub async fn fetch_providers(&self, id: RecordId) -> Result<Option<Providers>> {
        let providers = self.remote.get_providers(id).await?;
        Ok(providers.and_then(|mut by_region| by_region.remove(&self.region)))
    }

    pub async fn toggle_favorite(&self, id: RecordId) -> Result<()> {
        Ok(self.store.toggle_favorite(id).await?)
    }

    pub async fn is_favorite(&self, id: RecordId) -> bool {
        self.store.is_favorite(id).await
    }

    /// Remote payloads never carry the user's favorite marks.
    async fn mark_favorites(&self, records: &mut [CatalogRecord]) {
        for record in records.iter_mut() {
            record.is_favorite = self.store.is_favorite(record.id).await;
        }
    }

    fn spawn_category_refresh(&self, category: Category) {
        let remote = Arc::clone(&self.remote);
        let store = Arc::clone(&self.store);
        let assets = self.assets.clone();

        tokio::spawn(async move {
            match refresh_category(remote.as_ref(), &store, assets.as_ref(), category).await {
                Ok(count) => debug!(%category, count, "Background refresh completed"),
                Err(e) => error!(%category, error = %e, "Background refresh failed"),
            }
        });
    }

    fn spawn_detail_refresh(&self, id: RecordId) {
        let remote = Arc::clone(&self.remote);
        let store = Arc::clone(&self.store);

        tokio::spawn(async move {
            let result: Result<CatalogRecord> = async {
                let fresh = remote.get_detail(id).await?;
                Ok(store.upsert_record(fresh).await?)
            }
            .await;
            match result {
                Ok(_) => debug!(id, "Background detail refresh completed"),
                Err(e) => error!(id, error = %e, "Background detail refresh failed"),
            }
        });
    }
}

async fn refresh_category(
    remote: &dyn RemoteSource,
    store: &LocalStore,
    assets: Option<&AssetCache>,
    category: Category,
) -> Result<usize> {
    let records = remote.list_by_category(category, 1).await?.results;
    prefetch_artwork(assets, &records);
    let count = records.len();
    store.replace_category(records, category).await?;
    Ok(count)
}

fn prefetch_artwork(assets: Option<&AssetCache>, records: &[CatalogRecord]) {
    let Some(assets) = assets else {
        return;
    };
    assets.prefetch(records.iter().filter_map(|r| r.poster_path.clone()), AssetType::Poster);
    assets.prefetch(records.iter().filter_map(|r| r.backdrop_path.clone()), AssetType::Backdrop);
}

// ============================================================================
// Tests
// ============================================================================
