//! Data models for catalog entities.
//!
//! These are the domain types handed to callers and persisted locally.
//! Wire formats live in `api::wire` and are converted into these.
//!
//! - `CatalogRecord`, `Category`: listing and detail data
//! - `Credits`: cast and crew
//! - `Providers`, `ProviderMap`: watch providers per region
//! - `Page`: one page of a paginated listing

pub mod credits;
pub mod providers;
pub mod record;

pub use credits::{CastMember, Credits, CrewMember};
pub use providers::{Provider, ProviderMap, Providers};
pub use record::{CatalogRecord, Category, RecordId};

use serde::{Deserialize, Serialize};

/// One page of a paginated remote listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub page: u32,
    pub results: Vec<T>,
    pub total_pages: u32,
    pub total_results: u32,
}

impl<T> Page<T> {
    pub fn single(results: Vec<T>) -> Self {
        let total = results.len() as u32;
        Self {
            page: 1,
            results,
            total_pages: 1,
            total_results: total,
        }
    }
}
