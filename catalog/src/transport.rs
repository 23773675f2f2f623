use crate::volume::{SearchResponse, Volume};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Timeout applied to every upstream call, so a slow catalog response
/// can never block a caller indefinitely.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("upstream unavailable")]
    Unavailable,

    #[error("request timed out")]
    TimedOut,

    #[error("no response from upstream")]
    NoResponse,

    #[error("unexpected upstream status: {0}")]
    Status(u16),

    #[error("malformed upstream payload: {0}")]
    Malformed(String),

    #[error("http client build failed: {0}")]
    Client(String),
}

impl TransportError {
    /// Transient failures are the only ones worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable | Self::TimedOut | Self::NoResponse)
    }
}

#[async_trait]
pub trait CatalogTransport: Send + Sync {
    /// Run a paged free-text search against the catalog.
    async fn search(
        &self,
        query: &str,
        start_index: u32,
        max_results: u32,
    ) -> Result<SearchResponse, TransportError>;

    /// Fetch a single volume by its external identifier.
    async fn fetch_volume(&self, volume_id: &str) -> Result<Volume, TransportError>;
}

/// HTTPS transport against the real catalog API. Authentication is a
/// static API key passed as a query parameter.
pub struct HttpCatalogTransport {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpCatalogTransport {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key,
        })
    }

    fn with_key(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.query(&[("key", key.as_str())]),
            None => request,
        }
    }
}

fn send_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::TimedOut
    } else {
        TransportError::NoResponse
    }
}

fn status_error(status: StatusCode) -> TransportError {
    if status == StatusCode::SERVICE_UNAVAILABLE {
        TransportError::Unavailable
    } else {
        TransportError::Status(status.as_u16())
    }
}

fn decode_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::TimedOut
    } else {
        TransportError::Malformed(err.to_string())
    }
}

#[async_trait]
impl CatalogTransport for HttpCatalogTransport {
    async fn search(
        &self,
        query: &str,
        start_index: u32,
        max_results: u32,
    ) -> Result<SearchResponse, TransportError> {
        let request = self
            .client
            .get(&self.base_url)
            .query(&[("q", query)])
            .query(&[("startIndex", start_index), ("maxResults", max_results)]);

        let response = self.with_key(request).send().await.map_err(send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status));
        }

        response.json::<SearchResponse>().await.map_err(decode_error)
    }

    async fn fetch_volume(&self, volume_id: &str) -> Result<Volume, TransportError> {
        let url = format!("{}/{}", self.base_url, volume_id);
        let request = self.client.get(&url);

        let response = self.with_key(request).send().await.map_err(send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status));
        }

        response.json::<Volume>().await.map_err(decode_error)
    }
}
