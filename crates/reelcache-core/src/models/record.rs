use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier assigned by the remote catalog, unique across all records.
pub type RecordId = i64;

/// Fixed listing groups used as partition keys for cached pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    NowPlaying,
    Popular,
    TopRated,
    Upcoming,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::NowPlaying,
        Category::Popular,
        Category::TopRated,
        Category::Upcoming,
    ];

    /// Stable tag used both in storage and as the remote path segment.
    pub fn tag(&self) -> &'static str {
        match self {
            Category::NowPlaying => "now_playing",
            Category::Popular => "popular",
            Category::TopRated => "top_rated",
            Category::Upcoming => "upcoming",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Category::NowPlaying => "Now Playing",
            Category::Popular => "Popular",
            Category::TopRated => "Top Rated",
            Category::Upcoming => "Upcoming",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Category::ALL
            .into_iter()
            .find(|c| c.tag() == normalized)
            .ok_or_else(|| format!("unknown category: {}", s))
    }
}

/// One catalog item as stored locally and returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: RecordId,
    pub title: String,
    pub overview: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<u32>,
    #[serde(default)]
    pub is_favorite: bool,
    /// `None` means the record belongs to no cached listing.
    #[serde(default)]
    pub category: Option<Category>,
}

impl CatalogRecord {
    pub fn new(id: RecordId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            overview: None,
            release_date: None,
            poster_path: None,
            backdrop_path: None,
            vote_average: None,
            vote_count: None,
            is_favorite: false,
            category: None,
        }
    }

    pub fn release_year(&self) -> Option<i32> {
        use chrono::Datelike;
        self.release_date.map(|d| d.year())
    }
}
