//! Core library for reelcache.
//!
//! Offline-first data layer for a movie catalog browser:
//!
//! - `api`: REST client for the remote catalog service (`RemoteSource`)
//! - `store`: persistent local copy of catalog records (`LocalStore`)
//! - `sync`: stale-while-revalidate policy over the two (`SyncOrchestrator`)
//! - `assets`: two-tier image cache with coalesced downloads (`AssetCache`)

pub mod api;
pub mod assets;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod sync;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::{ApiClient, ApiError, RemoteSource};
pub use assets::{Asset, AssetCache, AssetType, Downloader};
pub use config::{Config, ConfigError};
pub use error::{Error, Result};
pub use models::{CatalogRecord, Category, Credits, Page, ProviderMap, Providers, RecordId};
pub use store::{LocalStore, StoreError};
pub use sync::SyncOrchestrator;
