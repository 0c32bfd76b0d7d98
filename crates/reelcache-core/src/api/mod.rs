//! REST client module for the remote catalog service.
//!
//! This module provides the `RemoteSource` trait consumed by the sync layer
//! and `ApiClient`, its implementation against a TMDb-style API.
//!
//! Requests authenticate with an API key query parameter and/or a bearer
//! access token, depending on what is configured.

pub mod client;
pub mod error;
pub mod source;
mod wire;

pub use client::ApiClient;
pub use error::ApiError;
pub use source::RemoteSource;
