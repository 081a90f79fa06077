//! Construction parameters for a source

use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{refresh, SUPPORTED_FORMAT};
use crate::errors::{GateError, GateResult};

/// Everything needed to construct a [`Source`](crate::app::source::Source)
///
/// Values are taken as given; the format tag and key are validated when the
/// source is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDefinition {
    /// Label used in logs
    pub name: String,
    /// Mirror URLs in priority order; may be empty for a cache-only source
    pub mirrors: Vec<String>,
    /// Base64 minisign public key
    pub public_key: String,
    /// Payload cache file; the signature lives next to it with a `.minisig` suffix
    pub cache_path: PathBuf,
    /// Container format tag
    pub format: String,
    /// Maximum age of a cached payload before a refresh is attempted
    pub cache_ttl: Duration,
    /// Delay before the next refresh after a successful one
    pub refresh_interval: Duration,
    /// Delay before the next refresh after a failed one
    pub min_refresh_interval: Duration,
}

impl SourceDefinition {
    /// Definition with default format and intervals and no mirrors
    pub fn new(
        name: impl Into<String>,
        cache_path: impl Into<PathBuf>,
        public_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            mirrors: Vec::new(),
            public_key: public_key.into(),
            cache_path: cache_path.into(),
            format: SUPPORTED_FORMAT.to_string(),
            cache_ttl: refresh::DEFAULT_CACHE_TTL,
            refresh_interval: refresh::DEFAULT_REFRESH_INTERVAL,
            min_refresh_interval: refresh::MIN_REFRESH_INTERVAL,
        }
    }

    /// Set the mirror list, highest priority first
    pub fn with_mirrors<I, S>(mut self, mirrors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mirrors = mirrors.into_iter().map(Into::into).collect();
        self
    }

    /// Set the container format tag
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Set the cache TTL
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Set the success-path refresh interval
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Set the failure-path refresh interval
    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    /// Reject zero durations
    ///
    /// A zero refresh interval would leave the source due again at the very
    /// instant it was refreshed.
    pub fn check_intervals(&self) -> GateResult<()> {
        for (field, value) in [
            ("cache_ttl", self.cache_ttl),
            ("refresh_interval", self.refresh_interval),
            ("min_refresh_interval", self.min_refresh_interval),
        ] {
            if value.is_zero() {
                return Err(GateError::ZeroInterval { field });
            }
        }
        Ok(())
    }
}
