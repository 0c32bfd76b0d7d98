use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::StoreError;
use crate::models::{CatalogRecord, Category, RecordId};

/// Snapshot file name in the store directory
const SNAPSHOT_FILE: &str = "catalog.json";

/// Everything the store persists, written as a whole on every mutation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Snapshot {
    records: BTreeMap<RecordId, CatalogRecord>,
    #[serde(default)]
    listings: BTreeMap<Category, Listing>,
}

/// Member order and refresh time of the last replace for a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Listing {
    order: Vec<RecordId>,
    refreshed_at: DateTime<Utc>,
}

/// Persistent record collection keyed by identifier.
///
/// Mutations take the write lock for their whole duration, build the next
/// snapshot, persist it, and only then make it visible. Readers therefore
/// observe either the state before or after a mutation, never a mix.
pub struct LocalStore {
    path: PathBuf,
    state: RwLock<Snapshot>,
}

impl LocalStore {
    /// Open (or create) a store in `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .map_err(|e| StoreError::Unavailable(format!("creating {}: {}", dir.display(), e)))?;

        let path = dir.join(SNAPSHOT_FILE);
        let snapshot = if path.exists() {
            let contents = std::fs::read(&path)
                .map_err(|e| StoreError::Unavailable(format!("reading {}: {}", path.display(), e)))?;
            serde_json::from_slice(&contents)
                .map_err(|e| StoreError::Unavailable(format!("parsing {}: {}", path.display(), e)))?
        } else {
            Snapshot::default()
        };

        info!(path = %path.display(), records = snapshot.records.len(), "Opened catalog store");
        Ok(Self {
            path,
            state: RwLock::new(snapshot),
        })
    }

    async fn persist(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let contents = serde_json::to_vec(snapshot)
            .map_err(|e| StoreError::Unavailable(format!("encoding snapshot: {}", e)))?;
        let tmp = self.path.with_extension("json.tmp");
        let written = match tokio::fs::write(&tmp, contents).await {
            Ok(()) => tokio::fs::rename(&tmp, &self.path).await,
            Err(e) => Err(e),
        };
        written.map_err(|e| StoreError::Unavailable(format!("writing {}: {}", self.path.display(), e)))
    }

    /// Replace all members of `category` with `records` in one step.
    ///
    /// Records already stored under another category move to this one.
    /// Favorite flags of already-known identifiers are kept, and a favorite
    /// that drops out of the listing stays stored without a category.
    pub async fn replace_category(
        &self,
        records: Vec<CatalogRecord>,
        category: Category,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let mut next = Snapshot::clone(&state);

        // Stale members are dropped, except favorites which stay untagged.
        next.records.retain(|_, r| r.category != Some(category) || r.is_favorite);
        for record in next.records.values_mut() {
            if record.category == Some(category) {
                record.category = None;
            }
        }

        let mut order = Vec::with_capacity(records.len());
        let mut seen = HashSet::with_capacity(records.len());
        for mut record in records {
            record.category = Some(category);
            record.is_favorite = merged_favorite(state.records.get(&record.id), &record);
            if seen.insert(record.id) {
                order.push(record.id);
            }
            next.records.insert(record.id, record);
        }

        let count = order.len();
        next.listings.insert(
            category,
            Listing {
                order,
                refreshed_at: Utc::now(),
            },
        );

        self.persist(&next).await?;
        *state = next;
        debug!(%category, count, "Replaced category members");
        Ok(())
    }

    /// Current members of `category`, in the order they were last supplied.
    pub async fn get_category(&self, category: Category) -> Vec<CatalogRecord> {
        let state = self.state.read().await;
        let positions: HashMap<RecordId, usize> = state
            .listings
            .get(&category)
            .map(|l| l.order.iter().enumerate().map(|(i, id)| (*id, i)).collect())
            .unwrap_or_default();

        let mut members: Vec<CatalogRecord> = state
            .records
            .values()
            .filter(|r| r.category == Some(category))
            .cloned()
            .collect();
        members.sort_by_key(|r| (positions.get(&r.id).copied().unwrap_or(usize::MAX), r.id));
        members
    }

    /// Insert or overwrite one record, keeping a known favorite flag.
    ///
    /// The record is stored with whatever category it carries; detail
    /// payloads carry none, so the record drops out of its listing.
    pub async fn upsert_record(&self, mut record: CatalogRecord) -> Result<CatalogRecord, StoreError> {
        let mut state = self.state.write().await;
        record.is_favorite = merged_favorite(state.records.get(&record.id), &record);

        let mut next = Snapshot::clone(&state);
        next.records.insert(record.id, record.clone());
        self.persist(&next).await?;
        *state = next;
        debug!(id = record.id, "Upserted record");
        Ok(record)
    }

    pub async fn get_by_id(&self, id: RecordId) -> Option<CatalogRecord> {
        self.state.read().await.records.get(&id).cloned()
    }

    /// Like `get_by_id`, for callers that require the record to exist.
    pub async fn get_required(&self, id: RecordId) -> Result<CatalogRecord, StoreError> {
        self.get_by_id(id).await.ok_or(StoreError::NotFound(id))
    }

    /// Flip the favorite flag. Unknown identifiers are ignored.
    pub async fn toggle_favorite(&self, id: RecordId) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let Some(current) = state.records.get(&id) else {
            warn!(id, "Cannot toggle favorite, record not in store");
            return Ok(());
        };
        let favorite = !current.is_favorite;

        let mut next = Snapshot::clone(&state);
        if let Some(record) = next.records.get_mut(&id) {
            record.is_favorite = favorite;
        }
        self.persist(&next).await?;
        *state = next;
        debug!(id, favorite, "Toggled favorite");
        Ok(())
    }

    /// Unknown identifiers are not favorites.
    pub async fn is_favorite(&self, id: RecordId) -> bool {
        self.state
            .read()
            .await
            .records
            .get(&id)
            .map(|r| r.is_favorite)
            .unwrap_or(false)
    }

    /// When `category` was last replaced, if ever.
    pub async fn category_refreshed_at(&self, category: Category) -> Option<DateTime<Utc>> {
        self.state
            .read()
            .await
            .listings
            .get(&category)
            .map(|l| l.refreshed_at)
    }

    pub async fn favorites(&self) -> Vec<CatalogRecord> {
        self.state
            .read()
            .await
            .records
            .values()
            .filter(|r| r.is_favorite)
            .cloned()
            .collect()
    }
}

/// The favorite flag belongs to the user, not the remote payload.
fn merged_favorite(existing: Option<&CatalogRecord>, incoming: &CatalogRecord) -> bool {
    existing.map(|r| r.is_favorite).unwrap_or(incoming.is_favorite)
}

// ============================================================================
// Tests
// ============================================================================
