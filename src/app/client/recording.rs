//! In-memory transport that records every request

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::app::client::Transport;
use crate::errors::{TransportError, TransportResult};

/// Canned response for one URL
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Body(Bytes),
    Status(u16),
    Truncated,
    Unreachable,
}

/// Fake transport; unknown URLs answer 404
#[derive(Debug, Default)]
pub(crate) struct RecordingTransport {
    replies: HashMap<String, Reply>,
    requests: Mutex<Vec<String>>,
}

impl RecordingTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(mut self, url: &str, reply: Reply) -> Self {
        self.replies.insert(url.to_string(), reply);
        self
    }

    pub(crate) fn body(self, url: &str, body: impl Into<Bytes>) -> Self {
        self.reply(url, Reply::Body(body.into()))
    }

    /// Every URL requested so far, in order
    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub(crate) fn clear(&self) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.clear();
        }
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn get(&self, url: &Url) -> TransportResult<Bytes> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }

        match self.replies.get(url.as_str()) {
            Some(Reply::Body(body)) => Ok(body.clone()),
            Some(Reply::Status(status)) => Err(TransportError::Status { status: *status }),
            Some(Reply::Truncated) => Err(TransportError::IncompleteBody {
                expected: Some(1),
                detail: "received 0 of 1 bytes".to_string(),
            }),
            Some(Reply::Unreachable) => Err(TransportError::Connect {
                reason: "connection refused".to_string(),
            }),
            None => Err(TransportError::Status { status: 404 }),
        }
    }
}
