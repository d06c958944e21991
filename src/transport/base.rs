use async_trait::async_trait;

use crate::models::{ApiResponse, RequestDescriptor};

/// A failure where no HTTP response was obtained.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("transport error: {0}")]
    Other(String),
}

/// The Transport trait abstracts how a descriptor turns into a response.
///
/// Any HTTP status, including 4xx and 5xx, is a successful `send`; only the
/// absence of a response is an `Err`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &RequestDescriptor) -> Result<ApiResponse, TransportError>;
}
