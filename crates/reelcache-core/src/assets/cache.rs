use std::collections::{HashMap, HashSet};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::disk::DiskTier;
use super::memory::MemoryTier;
use super::{Asset, AssetType, Downloader, ImageConfiguration};
use crate::config::Config;

/// A download every concurrent caller for the same URL awaits.
type SharedFetch = Shared<BoxFuture<'static, Option<Asset>>>;

/// Sizing and limits for an `AssetCache`.
#[derive(Debug, Clone)]
pub struct AssetCacheOptions {
    pub images: ImageConfiguration,
    pub memory_entries: usize,
    pub memory_bytes: usize,
    pub max_concurrent_downloads: usize,
}

impl Default for AssetCacheOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for AssetCacheOptions {
    fn from(config: &Config) -> Self {
        Self {
            images: ImageConfiguration::with_base_url(&config.image_base_url),
            memory_entries: config.memory_cache_entries,
            memory_bytes: config.memory_cache_bytes,
            max_concurrent_downloads: config.max_concurrent_downloads,
        }
    }
}

/// Two-tier image cache with coalesced downloads.
/// Clone is cheap - all clones share the same tiers and in-flight map.
#[derive(Clone)]
pub struct AssetCache {
    inner: Arc<Inner>,
}

struct Inner {
    images: ImageConfiguration,
    memory: Mutex<MemoryTier>,
    disk: DiskTier,
    downloader: Arc<dyn Downloader>,
    in_flight: Mutex<HashMap<String, SharedFetch>>,
    download_permits: Semaphore,
}

/// Lock ignoring poisoning; the guarded maps stay consistent between calls.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl AssetCache {
    pub fn new(
        dir: impl Into<PathBuf>,
        downloader: Arc<dyn Downloader>,
        options: AssetCacheOptions,
    ) -> io::Result<Self> {
        let disk = DiskTier::new(dir)?;
        info!(dir = %disk.dir().display(), "Opened image cache");
        Ok(Self {
            inner: Arc::new(Inner {
                images: options.images,
                memory: Mutex::new(MemoryTier::new(options.memory_entries, options.memory_bytes)),
                disk,
                downloader,
                in_flight: Mutex::new(HashMap::new()),
                download_permits: Semaphore::new(options.max_concurrent_downloads.max(1)),
            }),
        })
    }

    /// Resolve a logical reference to the URL `fetch` would use.
    pub fn resolve(
        &self,
        reference: Option<&str>,
        asset_type: AssetType,
        desired_width: Option<u32>,
    ) -> String {
        self.inner.images.resolve(reference, asset_type, desired_width)
    }

    /// Return the asset for `reference`, or `None` if it cannot be had.
    ///
    /// Lookup order is memory, disk, network; `force` skips both tiers.
    /// Failures are logged and collapse to `None`.
    pub async fn fetch(
        &self,
        reference: Option<&str>,
        asset_type: AssetType,
        force: bool,
    ) -> Option<Asset> {
        let url = self.resolve(reference, asset_type, None);

        if !force {
            if let Some(asset) = self.lookup_cached(&url).await {
                return Some(asset);
            }
        }

        self.download_coalesced(url, force).await
    }

    /// Start fetches for every reference without waiting for them.
    pub fn prefetch<I, S>(&self, references: I, asset_type: AssetType)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let unique: HashSet<String> = references.into_iter().map(Into::into).collect();
        debug!(count = unique.len(), %asset_type, "Prefetching assets");

        for reference in unique {
            let cache = self.clone();
            tokio::spawn(async move {
                cache.fetch(Some(&reference), asset_type, false).await;
            });
        }
    }

    /// Empty the memory tier and wipe the disk tier.
    pub fn clear(&self) {
        // Hold the memory lock across the disk clear so a finishing download
        // cannot slip an old asset back into memory in between.
        let mut memory = lock(&self.inner.memory);
        memory.clear();
        if let Err(e) = self.inner.disk.clear() {
            warn!(dir = %self.inner.disk.dir().display(), error = %e, "Failed to clear image cache directory");
        }
        info!("Image cache cleared");
    }

    async fn lookup_cached(&self, url: &str) -> Option<Asset> {
        let cached = lock(&self.inner.memory).get(url);
        if cached.is_some() {
            return cached;
        }

        let generation = self.inner.disk.generation();
        let bytes = self.inner.disk.read(url).await?;
        self.promote(url, bytes, generation)
    }

    /// Move bytes read from disk into memory, unless the tiers were cleared
    /// after the read started in `generation`.
    fn promote(&self, url: &str, bytes: Bytes, generation: u64) -> Option<Asset> {
        match Asset::from_bytes(url, bytes) {
            Ok(asset) => {
                let mut memory = lock(&self.inner.memory);
                if self.inner.disk.generation() != generation {
                    debug!(url, "Image cache cleared during disk read, not promoting");
                    return None;
                }
                memory.insert(asset.clone());
                debug!(url, "Promoted asset from disk");
                Some(asset)
            }
            Err(e) => {
                warn!(url, error = %e, "Discarding unreadable cached asset");
                self.inner.disk.remove(url);
                None
            }
        }
    }

    /// Join the in-flight download for `url`, starting one if there is none.
    fn download_coalesced(&self, url: String, force: bool) -> SharedFetch {
        let mut in_flight = lock(&self.inner.in_flight);
        if let Some(existing) = in_flight.get(&url) {
            debug!(url = %url, "Joining in-flight download");
            return existing.clone();
        }

        // A download can finish between the tier lookup and taking the
        // in-flight lock; it fills memory before leaving the map.
        if !force {
            if let Some(asset) = lock(&self.inner.memory).get(&url) {
                return futures::future::ready(Some(asset)).boxed().shared();
            }
        }

        // The download runs as its own task so it completes (and leaves the
        // in-flight map) even if every caller stops waiting.
        let cache = self.clone();
        let task_url = url.clone();
        let handle = tokio::spawn(async move {
            let result = cache.download(&task_url).await;
            lock(&cache.inner.in_flight).remove(&task_url);
            result
        });

        let shared = async move {
            handle.await.unwrap_or_else(|e| {
                warn!(error = %e, "Asset download task failed");
                None
            })
        }
        .boxed()
        .shared();

        in_flight.insert(url, shared.clone());
        shared
    }

    async fn download(&self, url: &str) -> Option<Asset> {
        let generation = self.inner.disk.generation();
        let _permit = self.inner.download_permits.acquire().await.ok()?;

        let bytes = match self.inner.downloader.download(url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(url, error = %e, "Asset download failed");
                return None;
            }
        };
        let asset = match Asset::from_bytes(url, bytes) {
            Ok(asset) => asset,
            Err(e) => {
                warn!(url, error = %e, "Downloaded asset is not a usable image");
                return None;
            }
        };

        {
            let mut memory = lock(&self.inner.memory);
            if self.inner.disk.generation() != generation {
                debug!(url, "Image cache cleared during download, not caching");
                return Some(asset);
            }
            memory.insert(asset.clone());
        }
        self.schedule_disk_write(&asset, generation);

        debug!(url, size = asset.len(), "Downloaded asset");
        Some(asset)
    }

    fn schedule_disk_write(&self, asset: &Asset, generation: u64) {
        let inner = Arc::clone(&self.inner);
        let url = asset.url().to_string();
        let bytes = asset.bytes().clone();
        tokio::task::spawn_blocking(move || match inner.disk.write(&url, &bytes, generation) {
            Ok(true) => {}
            Ok(false) => debug!(url = %url, "Skipped disk write after cache clear"),
            Err(e) => warn!(url = %url, error = %e, "Failed to write asset to disk cache"),
        });
    }
}

// ============================================================================
// Tests
// ============================================================================
