//! Display helpers shared by front ends.

pub mod format;

pub use format::{format_age, format_rating, format_release, truncate_string};
