use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Region code (e.g. "US") to that region's watch providers.
pub type ProviderMap = HashMap<String, Providers>;

/// Where a record can be watched in one region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Providers {
    pub link: Option<String>,
    #[serde(default)]
    pub flatrate: Vec<Provider>,
    #[serde(default)]
    pub rent: Vec<Provider>,
    #[serde(default)]
    pub buy: Vec<Provider>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub provider_id: i64,
    pub provider_name: String,
    pub logo_path: Option<String>,
    #[serde(default)]
    pub display_priority: i32,
}

impl Providers {
    pub fn is_empty(&self) -> bool {
        self.flatrate.is_empty() && self.rent.is_empty() && self.buy.is_empty()
    }
}
