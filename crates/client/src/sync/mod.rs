//! HTTP source for popular products.
//!
//! Pulls a batch from the product API so the offline cache has something to
//! show before the user searches.
//!
//! - **Endpoint**: `GET {base_url}/api/products/search?q=popular&limit={n}`
//! - **Body**: `{"success": bool, "products": [...]}`
//! - **Retries**: none. A failed sync simply caches nothing.

pub mod error;
pub mod request;
pub mod response;

pub use error::SyncError;
pub use request::PopularRequest;
pub use response::PopularProductsResponse;

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use pantry_core::{ProductSource, SyncConfig};
use reqwest::header;
use serde_json::Value;
use url::Url;

/// Path of the search endpoint relative to the base URL.
const SEARCH_PATH: &str = "api/products/search";

/// Client for the popular-products endpoint.
#[derive(Debug, Clone)]
pub struct HttpProductSource {
    http: reqwest::Client,
    endpoint: Url,
}

impl HttpProductSource {
    /// Build a client from sync settings.
    ///
    /// Fails if `base_url` is not an absolute http(s) URL.
    pub fn new(config: SyncConfig) -> Result<Self, SyncError> {
        let endpoint = search_endpoint(&config.base_url)?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| SyncError::Network(Arc::new(e)))?;

        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Fetch up to `limit` popular products as raw payloads.
    pub async fn popular(&self, limit: usize) -> Result<Vec<Value>, SyncError> {
        let start = Instant::now();
        tracing::debug!(endpoint = %self.endpoint, limit, "fetching popular products");

        let http_response = self
            .http
            .get(self.endpoint.clone())
            .header(header::ACCEPT, "application/json")
            .query(&PopularRequest::new(limit))
            .send()
            .await?;

        let status = http_response.status();
        tracing::debug!("popular products response status: {}", status);

        if status.is_client_error() || status.is_server_error() {
            return Err(SyncError::HttpError { status: status.as_u16() });
        }

        let bytes = http_response.bytes().await?;
        let body: PopularProductsResponse =
            serde_json::from_slice(&bytes).map_err(|e| SyncError::Parse(e.to_string()))?;

        if !body.success {
            return Err(SyncError::Unsuccessful);
        }

        tracing::debug!("sync fetch completed in {:?}, {} products", start.elapsed(), body.products.len());

        Ok(body.products)
    }
}

#[async_trait]
impl ProductSource for HttpProductSource {
    async fn fetch_popular(&self, limit: usize) -> Result<Vec<Value>, pantry_core::Error> {
        self.popular(limit).await.map_err(pantry_core::Error::from)
    }
}

/// Join the search path onto `base_url`, keeping any path prefix it has.
fn search_endpoint(base_url: &str) -> Result<Url, SyncError> {
    let mut base = Url::parse(base_url).map_err(|e| SyncError::InvalidUrl(format!("{base_url}: {e}")))?;

    if !matches!(base.scheme(), "http" | "https") {
        return Err(SyncError::InvalidUrl(format!("unsupported scheme: {}", base.scheme())));
    }

    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    base.join(SEARCH_PATH).map_err(|e| SyncError::InvalidUrl(e.to_string()))
}
