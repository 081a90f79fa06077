//! HTTP client configuration and building logic
//!
//! This module handles the configuration and construction of the HTTP
//! client used to reach mirrors.

use std::time::Duration;

use reqwest::{redirect, Client};
use serde::{Deserialize, Serialize};

use crate::constants::http;
use crate::errors::{TransportError, TransportResult};

/// Configuration for the mirror HTTP client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Whole-request timeout, body included
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Connect timeout
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Connection pool idle timeout
    #[serde(with = "humantime_serde")]
    pub pool_idle_timeout: Duration,
    /// User agent sent with every request
    pub user_agent: String,
    /// Rate limit across all mirrors (requests per second)
    pub rate_limit_rps: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: http::DEFAULT_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            pool_idle_timeout: http::POOL_IDLE_TIMEOUT,
            user_agent: http::USER_AGENT.to_string(),
            rate_limit_rps: http::DEFAULT_RATE_LIMIT_RPS,
        }
    }
}

impl ClientConfig {
    /// Builds the HTTP client with the specified configuration
    pub fn build_http_client(&self) -> TransportResult<Client> {
        Client::builder()
            .timeout(self.request_timeout)
            .connect_timeout(self.connect_timeout)
            .pool_idle_timeout(self.pool_idle_timeout)
            .user_agent(self.user_agent.as_str())
            .redirect(redirect::Policy::limited(http::MAX_REDIRECTS))
            .build()
            .map_err(TransportError::from_reqwest)
    }
}
