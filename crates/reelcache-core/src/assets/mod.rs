//! Image asset cache.
//!
//! Assets referenced by catalog records (posters, backdrops, ...) are
//! resolved to concrete URLs and cached in two tiers:
//!
//! - memory: bounded, least recently used entries evicted first
//! - disk: unbounded until `AssetCache::clear`
//!
//! Concurrent requests for the same URL share a single download.

mod asset;
mod cache;
mod disk;
mod download;
mod memory;
mod resolve;

pub use asset::{Asset, AssetError};
pub use cache::{AssetCache, AssetCacheOptions};
pub use download::Downloader;
pub use resolve::{AssetType, ImageConfiguration, PLACEHOLDER_URL};
