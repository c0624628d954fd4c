//! HTTP client port for webhook delivery.

use crate::webhook::domain::HttpMethod;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Result type for HTTP client operations.
pub type HttpClientResult<T> = Result<T, HttpClientError>;

/// One outbound request, fully resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Injected URL.
    pub url: String,
    /// Request headers.
    pub headers: BTreeMap<String, String>,
    /// JSON body, when the method carries one.
    pub body: Option<Value>,
}

/// Status and raw body of a delivered request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

impl HttpResponse {
    /// Returns whether the status is in the 2xx range.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Parses the body as JSON, if it is JSON.
    #[must_use]
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Delivery contract for outbound webhook requests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Sends a request and returns its response.
    ///
    /// # Errors
    ///
    /// Returns [`HttpClientError::Transport`] when the request cannot
    /// be delivered at all (connection, timeout, TLS).
    async fn send(&self, request: HttpRequest) -> HttpClientResult<HttpResponse>;
}

/// Errors returned by HTTP client implementations.
#[derive(Debug, Clone, Error)]
pub enum HttpClientError {
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl HttpClientError {
    /// Wraps a transport error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}
