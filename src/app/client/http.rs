//! Mirror HTTP transport with rate limiting
//!
//! Single-shot GETs: no retries and no backoff. A failed mirror is simply
//! skipped by the caller, so the only resilience here is the shared rate
//! limiter that keeps a burst of due sources from hammering mirrors.

use std::num::NonZeroU32;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use governor::{clock::DefaultClock, state::InMemoryState, Jitter, Quota, RateLimiter};
use reqwest::Client;
use url::Url;

use crate::app::client::config::ClientConfig;
use crate::app::client::Transport;
use crate::errors::{TransportError, TransportResult};

/// reqwest-backed [`Transport`]
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    rate_limiter: RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>,
}

impl HttpTransport {
    /// Creates a transport from configuration
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the client cannot be built or the rate
    /// limit is zero
    pub fn new(config: &ClientConfig) -> TransportResult<Self> {
        let client = config.build_http_client()?;
        Self::with_client(client, config.rate_limit_rps)
    }

    /// Creates a transport around an existing client
    pub fn with_client(client: Client, rate_limit_rps: u32) -> TransportResult<Self> {
        let rate_limiter = Self::build_rate_limiter(rate_limit_rps)?;
        Ok(Self {
            client,
            rate_limiter,
        })
    }

    fn build_rate_limiter(
        rate_limit_rps: u32,
    ) -> TransportResult<RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>> {
        let rate = NonZeroU32::new(rate_limit_rps).ok_or_else(|| TransportError::Request {
            reason: "rate limit must be non-zero".to_string(),
        })?;
        Ok(RateLimiter::direct(Quota::per_second(rate)))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> TransportResult<Bytes> {
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(50)))
            .await;

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(TransportError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("GET {} returned {}", url, status);
            return Err(TransportError::Status {
                status: status.as_u16(),
            });
        }

        let expected = response.content_length();
        let body = response.bytes().await.map_err(|err| {
            if err.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::IncompleteBody {
                    expected,
                    detail: err.to_string(),
                }
            }
        })?;

        if let Some(expected) = expected {
            if (body.len() as u64) < expected {
                return Err(TransportError::IncompleteBody {
                    expected: Some(expected),
                    detail: format!("received {} of {} bytes", body.len(), expected),
                });
            }
        }

        tracing::debug!("GET {} returned {} bytes", url, body.len());
        Ok(body)
    }
}
