//! Response payloads as the service sends them.
//!
//! Kept private to the api module; everything leaves as a domain type.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::models::{CatalogRecord, Page, ProviderMap, RecordId};

#[derive(Debug, Deserialize)]
pub(super) struct MovieResponse {
    id: RecordId,
    #[serde(default)]
    title: String,
    overview: Option<String>,
    release_date: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    vote_average: Option<f64>,
    vote_count: Option<u32>,
}

impl MovieResponse {
    pub(super) fn to_record(&self) -> CatalogRecord {
        CatalogRecord {
            id: self.id,
            title: self.title.clone(),
            overview: self.overview.clone().filter(|s| !s.trim().is_empty()),
            release_date: self.release_date.as_deref().and_then(parse_release_date),
            poster_path: self.poster_path.clone().filter(|s| !s.is_empty()),
            backdrop_path: self.backdrop_path.clone().filter(|s| !s.is_empty()),
            vote_average: self.vote_average,
            vote_count: self.vote_count,
            is_favorite: false,
            category: None,
        }
    }
}

/// The service sends "" for unknown dates.
fn parse_release_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

#[derive(Debug, Deserialize)]
pub(super) struct PageResponse {
    #[serde(default = "first_page")]
    page: u32,
    #[serde(default)]
    results: Vec<MovieResponse>,
    #[serde(default)]
    total_pages: u32,
    #[serde(default)]
    total_results: u32,
}

fn first_page() -> u32 {
    1
}

impl PageResponse {
    pub(super) fn into_page(self) -> Page<CatalogRecord> {
        Page {
            page: self.page,
            results: self.results.iter().map(|m| m.to_record()).collect(),
            total_pages: self.total_pages,
            total_results: self.total_results,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ProvidersResponse {
    #[serde(default)]
    pub(super) results: ProviderMap,
}
