//! Fakes and fixtures shared by the unit tests.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::io::Cursor;
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::api::{ApiError, RemoteSource};
use crate::assets::Downloader;
use crate::models::{CatalogRecord, Category, Credits, Page, ProviderMap, RecordId};

pub fn record(id: RecordId) -> CatalogRecord {
    CatalogRecord {
        poster_path: Some(format!("/poster-{}.jpg", id)),
        vote_average: Some(7.0),
        ..CatalogRecord::new(id, format!("Movie {}", id))
    }
}

pub fn records(ids: RangeInclusive<RecordId>) -> Vec<CatalogRecord> {
    ids.map(record).collect()
}

/// A valid PNG of the given size.
pub fn png_bytes(width: u32, height: u32) -> Bytes {
    let image = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    Bytes::from(buf)
}

/// Poll `check` until it holds or two seconds pass.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// In-memory `RemoteSource` with call counters and injectable failure/delay.
#[derive(Default)]
pub struct FakeRemote {
    listings: Mutex<HashMap<Category, Vec<CatalogRecord>>>,
    details: Mutex<HashMap<RecordId, CatalogRecord>>,
    similar: Mutex<Vec<CatalogRecord>>,
    providers: Mutex<Option<ProviderMap>>,
    failure: Mutex<Option<ApiError>>,
    delay: Mutex<Duration>,
    list_calls: AtomicUsize,
    detail_calls: AtomicUsize,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_listing(&self, category: Category, records: Vec<CatalogRecord>) {
        self.listings.lock().unwrap().insert(category, records);
    }

    pub fn set_detail(&self, record: CatalogRecord) {
        self.details.lock().unwrap().insert(record.id, record);
    }

    pub fn set_similar(&self, records: Vec<CatalogRecord>) {
        *self.similar.lock().unwrap() = records;
    }

    pub fn set_providers(&self, providers: Option<ProviderMap>) {
        *self.providers.lock().unwrap() = providers;
    }

    pub fn fail_with(&self, error: ApiError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    async fn respond(&self) -> Result<(), ApiError> {
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match self.failure.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteSource for FakeRemote {
    async fn list_by_category(
        &self,
        category: Category,
        _page: u32,
    ) -> Result<Page<CatalogRecord>, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.respond().await?;
        let results = self.listings.lock().unwrap().get(&category).cloned().unwrap_or_default();
        Ok(Page::single(results))
    }

    async fn get_detail(&self, id: RecordId) -> Result<CatalogRecord, ApiError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.respond().await?;
        self.details
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(ApiError::ResponseStatus {
                status: 404,
                message: Some("The resource you requested could not be found.".into()),
            })
    }

    async fn get_credits(&self, id: RecordId) -> Result<Credits, ApiError> {
        self.respond().await?;
        Ok(Credits {
            id,
            ..Credits::default()
        })
    }

    async fn list_similar(
        &self,
        _id: RecordId,
        _page: Option<u32>,
    ) -> Result<Page<CatalogRecord>, ApiError> {
        self.respond().await?;
        Ok(Page::single(self.similar.lock().unwrap().clone()))
    }

    async fn get_providers(&self, _id: RecordId) -> Result<Option<ProviderMap>, ApiError> {
        self.respond().await?;
        Ok(self.providers.lock().unwrap().clone())
    }
}

/// `Downloader` that serves a small PNG for every URL, counting calls.
pub struct FakeDownloader {
    payload: Bytes,
    delay: Duration,
    failing: Mutex<HashSet<String>>,
    calls: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl FakeDownloader {
    pub fn new() -> Self {
        Self {
            payload: png_bytes(2, 3),
            delay: Duration::ZERO,
            failing: Mutex::new(HashSet::new()),
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    pub fn returning_garbage() -> Self {
        Self {
            payload: Bytes::from_static(b"<!doctype html><p>not an image</p>"),
            ..Self::new()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn fail_url(&self, url: &str) {
        self.failing.lock().unwrap().insert(url.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Downloader for FakeDownloader {
    async fn download(&self, url: &str) -> Result<Bytes, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.failing.lock().unwrap().contains(url) {
            return Err(ApiError::ResponseStatus {
                status: 404,
                message: None,
            });
        }
        Ok(self.payload.clone())
    }
}
