use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{Transport, TransportError};
use crate::models::{ApiResponse, RequestDescriptor};

/// Production transport backed by `reqwest`.
///
/// Keeps a cookie jar so the HttpOnly refresh cookie set at login travels with
/// the refresh call.
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::InvalidRequest(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Resolve a descriptor URL against the base URL. Absolute URLs pass through.
    pub fn resolve(&self, url: &str) -> String {
        if url.contains("://") {
            url.to_string()
        } else {
            format!("{}/{}", self.base_url, url.trim_start_matches('/'))
        }
    }
}

fn map_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else if e.is_connect() {
        TransportError::Connect(e.to_string())
    } else if e.is_builder() {
        TransportError::InvalidRequest(e.to_string())
    } else {
        TransportError::Other(e.to_string())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &RequestDescriptor) -> Result<ApiResponse, TransportError> {
        let url = self.resolve(&request.url);
        debug!("Sending {} request to: {}", request.method, url);

        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_error)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(map_error)?;

        debug!("Received status {} from: {}", status, url);
        Ok(ApiResponse::new(status, headers, body.to_vec()))
    }
}
