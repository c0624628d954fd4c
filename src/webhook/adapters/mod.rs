//! Adapter implementations for webhook delivery.

mod client;

pub use client::ReqwestHttpClient;
