use std::collections::{HashMap, VecDeque};

use tracing::trace;

use super::Asset;

/// Bounded in-memory tier, keyed by resolved URL.
///
/// Bounded both by entry count and by total payload bytes; the least
/// recently used entry is evicted first when either limit is exceeded.
pub(crate) struct MemoryTier {
    entries: HashMap<String, Asset>,
    recency: VecDeque<String>,
    total_bytes: usize,
    max_entries: usize,
    max_bytes: usize,
}

impl MemoryTier {
    pub(crate) fn new(max_entries: usize, max_bytes: usize) -> Self {
        Self {
            entries: HashMap::new(),
            recency: VecDeque::new(),
            total_bytes: 0,
            max_entries: max_entries.max(1),
            max_bytes,
        }
    }

    pub(crate) fn get(&mut self, url: &str) -> Option<Asset> {
        let asset = self.entries.get(url)?.clone();
        self.touch(url);
        Some(asset)
    }

    pub(crate) fn insert(&mut self, asset: Asset) {
        if asset.len() > self.max_bytes {
            trace!(url = asset.url(), size = asset.len(), "Asset larger than memory tier, not cached");
            return;
        }

        let url = asset.url().to_string();
        self.remove(&url);
        self.total_bytes += asset.len();
        self.entries.insert(url.clone(), asset);
        self.recency.push_back(url);

        while self.entries.len() > self.max_entries || self.total_bytes > self.max_bytes {
            let Some(oldest) = self.recency.pop_front() else {
                break;
            };
            if let Some(evicted) = self.entries.remove(&oldest) {
                self.total_bytes -= evicted.len();
                trace!(url = %oldest, "Evicted asset from memory tier");
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
        self.total_bytes = 0;
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    fn remove(&mut self, url: &str) {
        if let Some(old) = self.entries.remove(url) {
            self.total_bytes -= old.len();
            self.recency.retain(|u| u != url);
        }
    }

    fn touch(&mut self, url: &str) {
        if let Some(pos) = self.recency.iter().position(|u| u == url) {
            if let Some(key) = self.recency.remove(pos) {
                self.recency.push_back(key);
            }
        }
    }
}
