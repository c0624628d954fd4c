//! Port contracts for outbound HTTP delivery.

mod http;

pub use http::{HttpClient, HttpClientError, HttpClientResult, HttpRequest, HttpResponse};

#[cfg(test)]
pub use http::MockHttpClient;
