//! Mirror transport
//!
//! The refresh logic only needs "GET this URL and give me the bytes"; the
//! [`Transport`] trait is that seam. [`HttpTransport`] is the production
//! implementation, tests substitute a recording fake.

pub mod config;
pub mod http;

#[cfg(test)]
pub(crate) mod recording;

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::errors::TransportResult;

pub use config::ClientConfig;
pub use http::HttpTransport;

/// Abstraction over fetching a payload or signature from a mirror
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the complete body at `url`
    ///
    /// Non-success statuses, connection failures and short bodies are all
    /// errors; a successful return is the whole body.
    async fn get(&self, url: &Url) -> TransportResult<Bytes>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn get(&self, url: &Url) -> TransportResult<Bytes> {
        (**self).get(url).await
    }
}
