//! Local persistent copy of catalog records.
//!
//! `LocalStore` keeps every record ever fetched, tagged with the listing
//! category it was last written under. Data is persisted as one JSON
//! snapshot and survives restarts, so listings can be served offline.

pub mod error;
pub mod local;

pub use error::StoreError;
pub use local::LocalStore;
