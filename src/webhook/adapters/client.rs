//! Reqwest-backed HTTP client.

use crate::webhook::domain::HttpMethod;
use crate::webhook::ports::{HttpClient, HttpClientError, HttpClientResult, HttpRequest, HttpResponse};
use async_trait::async_trait;
use std::time::Duration;

/// Production HTTP client with a per-request timeout.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Builds a client with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`HttpClientError::Transport`] when the underlying TLS
    /// backend cannot be initialised.
    pub fn new(timeout: Duration) -> HttpClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(HttpClientError::transport)?;
        Ok(Self { client })
    }
}

const fn method_of(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Put => reqwest::Method::PUT,
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn send(&self, request: HttpRequest) -> HttpClientResult<HttpResponse> {
        let mut builder = self.client.request(method_of(request.method), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let response = builder.send().await.map_err(HttpClientError::transport)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(HttpClientError::transport)?;
        Ok(HttpResponse { status, body })
    }
}
