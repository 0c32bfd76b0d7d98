//! API client for the remote catalog service.
//!
//! `ApiClient` implements `RemoteSource` for catalog queries and
//! `Downloader` for image assets, sharing one connection pool.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, Client, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::wire::{MovieResponse, PageResponse, ProvidersResponse};
use super::{ApiError, RemoteSource};
use crate::assets::Downloader;
use crate::config::Config;
use crate::models::{CatalogRecord, Category, Credits, Page, ProviderMap, RecordId};

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// API client for the catalog service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    access_token: Option<String>,
    language: String,
}

impl ApiClient {
    /// Create a new API client from configuration
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            access_token: config.access_token.clone(),
            language: config.language.clone(),
        })
    }

    /// Build the full URL for an API path, with language and key appended.
    fn endpoint(&self, path: &str, extra: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, path.trim_start_matches('/')))
            .map_err(|e| ApiError::Transport(format!("invalid request URL for {}: {}", path, e)))?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in extra {
                query.append_pair(key, value);
            }
            query.append_pair("language", &self.language);
            if let Some(ref key) = self.api_key {
                query.append_pair("api_key", key);
            }
        }
        Ok(url)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        if let Some(ref token) = self.access_token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ApiError::Transport(format!("invalid access token: {}", e)))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(
        response: reqwest::Response,
    ) -> Result<Option<reqwest::Response>, ApiError> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, extra: &[(&str, String)]) -> Result<T, ApiError> {
        let url = self.endpoint(path, extra)?;
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            debug!(path, "GET");
            let response = self
                .client
                .get(url.clone())
                .headers(self.auth_headers()?)
                .send()
                .await?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => {
                    let body = response.bytes().await?;
                    return serde_json::from_slice(&body).map_err(|e| {
                        ApiError::Decode(format!("unexpected payload from {}: {}", path, e))
                    });
                }
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::ResponseStatus {
                            status: 429,
                            message: Some("rate limited".to_string()),
                        });
                    }
                    warn!(path, retry = retries, backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2; // Exponential backoff
                }
            }
        }
    }
}

#[async_trait]
impl RemoteSource for ApiClient {
    async fn list_by_category(
        &self,
        category: Category,
        page: u32,
    ) -> Result<Page<CatalogRecord>, ApiError> {
        let response: PageResponse = self
            .get(&format!("movie/{}", category.tag()), &[("page", page.to_string())])
            .await?;
        let page = response.into_page();
        debug!(%category, count = page.results.len(), "Fetched listing page");
        Ok(page)
    }

    async fn get_detail(&self, id: RecordId) -> Result<CatalogRecord, ApiError> {
        let response: MovieResponse = self.get(&format!("movie/{}", id), &[]).await?;
        Ok(response.to_record())
    }

    async fn get_credits(&self, id: RecordId) -> Result<Credits, ApiError> {
        self.get(&format!("movie/{}/credits", id), &[]).await
    }

    async fn list_similar(
        &self,
        id: RecordId,
        page: Option<u32>,
    ) -> Result<Page<CatalogRecord>, ApiError> {
        let extra: Vec<(&str, String)> = page.map(|p| ("page", p.to_string())).into_iter().collect();
        let response: PageResponse = self.get(&format!("movie/{}/similar", id), &extra).await?;
        Ok(response.into_page())
    }

    async fn get_providers(&self, id: RecordId) -> Result<Option<ProviderMap>, ApiError> {
        let response: ProvidersResponse = self
            .get(&format!("movie/{}/watch/providers", id), &[])
            .await?;
        Ok((!response.results.is_empty()).then_some(response.results))
    }
}

#[async_trait]
impl Downloader for ApiClient {
    async fn download(&self, url: &str) -> Result<Bytes, ApiError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body));
        }
        Ok(response.bytes().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api_key: Option<&str>) -> ApiClient {
        let config = Config {
            api_base_url: "https://api.example.test/3/".to_string(),
            api_key: api_key.map(str::to_string),
            ..Config::default()
        };
        ApiClient::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_appends_language_and_key() {
        let url = client(Some("k3y"))
            .endpoint("movie/popular", &[("page", "2".to_string())])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.test/3/movie/popular?page=2&language=en-US&api_key=k3y"
        );
    }

    #[test]
    fn test_endpoint_without_key() {
        let url = client(None).endpoint("/movie/42", &[]).unwrap();
        assert_eq!(url.as_str(), "https://api.example.test/3/movie/42?language=en-US");
    }

    #[test]
    fn test_auth_headers_include_bearer_when_configured() {
        let mut api = client(None);
        assert!(api.auth_headers().unwrap().get(header::AUTHORIZATION).is_none());

        api.access_token = Some("tok".to_string());
        let headers = api.auth_headers().unwrap();
        assert_eq!(headers.get(header::AUTHORIZATION).unwrap(), "Bearer tok");
    }
}
