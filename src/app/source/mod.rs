//! Signed sources and their refresh state machine
//!
//! A [`Source`] pairs a trusted key with an ordered mirror list and a cache
//! location, and holds the last payload that verified against that key.
//! Construction and periodic refresh share one state machine:
//!
//! ```text
//! CheckCache --fresh--------------------------------> Done(Fresh)
//!     |  expired (payload kept as fallback)
//!     |  invalid / missing (nothing kept)
//!     v
//! FetchMirrors --verified pair--> persist, adopt ---> Done(Downloaded)
//!     |  every mirror failed
//!     +-------------------------------------------> Done(Failed)
//! ```
//!
//! Periodic refreshes start at `FetchMirrors`. A source without mirrors never
//! reaches the network and never schedules itself.

pub mod definition;

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use url::Url;

use crate::app::cache::{load_cache, signature_path, store_cache};
use crate::app::client::Transport;
use crate::app::clock::add_duration;
use crate::app::mirror::fetch_from_mirrors;
use crate::app::signature::{check_parameters, PublicKey, SourceFormat};
use crate::errors::{GateResult, RefreshError};

pub use definition::SourceDefinition;

/// Terminal state of one refresh attempt
#[derive(Debug)]
pub enum RefreshOutcome {
    /// Cache was within its TTL; no mirror was contacted
    Fresh,
    /// A mirror served a verified payload, now adopted and cached
    Downloaded { mirror: Url },
    /// Cache-only source; whatever the cache held (if anything) was kept
    Static,
    /// Refresh failed; the previous trusted payload, if any, is still in use
    Failed(RefreshError),
}

impl RefreshOutcome {
    /// Whether the attempt ended without error
    pub fn is_success(&self) -> bool {
        !matches!(self, RefreshOutcome::Failed(_))
    }

    /// The failure, if the attempt failed
    pub fn error(&self) -> Option<&RefreshError> {
        match self {
            RefreshOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Consume the outcome, keeping only the failure
    pub fn into_error(self) -> Option<RefreshError> {
        match self {
            RefreshOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Short label for logs and status output
    pub fn label(&self) -> &'static str {
        match self {
            RefreshOutcome::Fresh => "fresh",
            RefreshOutcome::Downloaded { .. } => "downloaded",
            RefreshOutcome::Static => "static",
            RefreshOutcome::Failed(_) => "failed",
        }
    }
}

/// Entry point into the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshPath {
    /// Cache first, then mirrors
    Construction,
    /// Straight to the mirrors, in-memory payload as fallback
    Periodic,
}

#[derive(Debug)]
enum Step {
    CheckCache,
    FetchMirrors,
    Done(RefreshOutcome),
}

/// A mirrored, signature-verified resource
pub struct Source {
    name: String,
    mirrors: Vec<String>,
    format: SourceFormat,
    key: PublicKey,
    cache_path: PathBuf,
    cache_ttl: Duration,
    refresh_interval: Duration,
    min_refresh_interval: Duration,
    payload: Option<Bytes>,
    trusted_comment: Option<String>,
    next_refresh: Option<DateTime<Utc>>,
}

impl Source {
    /// Validate `definition`, load the cache and, unless it is fresh, fetch
    /// from the mirrors
    ///
    /// Only an unsupported format, an undecodable key or a zero interval is
    /// an `Err`; every
    /// cache or mirror failure still yields a usable source alongside a
    /// `RefreshOutcome::Failed`.
    pub async fn open<T>(
        definition: SourceDefinition,
        transport: &T,
        now: DateTime<Utc>,
    ) -> GateResult<(Self, RefreshOutcome)>
    where
        T: Transport + ?Sized,
    {
        let (format, key) = check_parameters(&definition.format, &definition.public_key)?;
        definition.check_intervals()?;

        let mut source = Self {
            name: definition.name,
            mirrors: definition.mirrors,
            format,
            key,
            cache_path: definition.cache_path,
            cache_ttl: definition.cache_ttl,
            refresh_interval: definition.refresh_interval,
            min_refresh_interval: definition.min_refresh_interval,
            payload: None,
            trusted_comment: None,
            next_refresh: None,
        };

        let outcome = source
            .run(RefreshPath::Construction, transport, now)
            .await;
        Ok((source, outcome))
    }

    /// Refresh from the mirrors, skipping the cache
    ///
    /// `now` is the attempt's start time; the next refresh is scheduled
    /// relative to it.
    pub async fn refresh<T>(&mut self, transport: &T, now: DateTime<Utc>) -> RefreshOutcome
    where
        T: Transport + ?Sized,
    {
        self.run(RefreshPath::Periodic, transport, now).await
    }

    async fn run<T>(&mut self, path: RefreshPath, transport: &T, now: DateTime<Utc>) -> RefreshOutcome
    where
        T: Transport + ?Sized,
    {
        let mut step = match path {
            RefreshPath::Construction => Step::CheckCache,
            RefreshPath::Periodic => Step::FetchMirrors,
        };

        loop {
            debug!("[{}] refresh step {:?}", self.name, step);
            step = match step {
                Step::CheckCache => self.check_cache(now).await,
                Step::FetchMirrors => self.fetch_mirrors(transport, now).await,
                Step::Done(outcome) => return outcome,
            };
        }
    }

    async fn check_cache(&mut self, now: DateTime<Utc>) -> Step {
        match load_cache(&self.cache_path, &self.key, self.cache_ttl, now).await {
            Ok(status) => {
                let fresh = status.is_fresh();
                let cached = status.into_cached();
                if fresh {
                    info!(
                        "[{}] Using fresh cache {} ({} bytes)",
                        self.name,
                        self.cache_path.display(),
                        cached.payload.len()
                    );
                } else {
                    info!(
                        "[{}] Cache {} expired, keeping it until a refresh succeeds",
                        self.name,
                        self.cache_path.display()
                    );
                }
                self.adopt(cached.payload, cached.trusted_comment);

                if self.mirrors.is_empty() {
                    Step::Done(if fresh {
                        RefreshOutcome::Fresh
                    } else {
                        RefreshOutcome::Static
                    })
                } else if fresh {
                    self.schedule(now, self.refresh_interval);
                    Step::Done(RefreshOutcome::Fresh)
                } else {
                    Step::FetchMirrors
                }
            }
            Err(err) => {
                warn!("[{}] Cache unusable: {}", self.name, err);
                if self.mirrors.is_empty() {
                    Step::Done(RefreshOutcome::Failed(RefreshError::Cache(err)))
                } else {
                    Step::FetchMirrors
                }
            }
        }
    }

    async fn fetch_mirrors<T>(&mut self, transport: &T, now: DateTime<Utc>) -> Step
    where
        T: Transport + ?Sized,
    {
        if self.mirrors.is_empty() {
            return Step::Done(RefreshOutcome::Static);
        }

        match fetch_from_mirrors(&self.mirrors, &self.key, transport).await {
            Ok(download) => {
                if let Err(err) =
                    store_cache(&self.cache_path, &download.payload, &download.signature).await
                {
                    warn!(
                        "[{}] Verified payload not cached: {}; keeping it in memory",
                        self.name, err
                    );
                }
                self.adopt(download.payload, download.trusted_comment);
                self.schedule(now, self.refresh_interval);
                Step::Done(RefreshOutcome::Downloaded {
                    mirror: download.mirror,
                })
            }
            Err(err) => {
                self.schedule(now, self.min_refresh_interval);
                warn!(
                    "[{}] Refresh failed: {}; will retry in {:?}{}",
                    self.name,
                    err,
                    self.min_refresh_interval,
                    if self.payload.is_some() {
                        ", serving previous payload"
                    } else {
                        ""
                    }
                );
                Step::Done(RefreshOutcome::Failed(err))
            }
        }
    }

    /// Only called with bytes that verified against `self.key`
    fn adopt(&mut self, payload: Bytes, trusted_comment: String) {
        self.payload = Some(payload);
        self.trusted_comment = Some(trusted_comment);
    }

    fn schedule(&mut self, now: DateTime<Utc>, delay: Duration) {
        let next = add_duration(now, delay);
        debug!("[{}] next refresh at {}", self.name, next);
        self.next_refresh = Some(next);
    }

    /// Whether the scheduled refresh time has arrived
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        matches!(self.next_refresh, Some(at) if at <= now)
    }

    /// Source name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mirror URLs in priority order
    pub fn mirrors(&self) -> &[String] {
        &self.mirrors
    }

    /// Container format
    pub fn format(&self) -> SourceFormat {
        self.format
    }

    /// Trusted key
    pub fn public_key(&self) -> &PublicKey {
        &self.key
    }

    /// Current trusted payload
    pub fn payload(&self) -> Option<Bytes> {
        self.payload.clone()
    }

    /// Trusted comment of the signature that admitted the current payload
    pub fn trusted_comment(&self) -> Option<&str> {
        self.trusted_comment.as_deref()
    }

    /// When the next refresh is due; `None` for cache-only sources
    pub fn next_refresh(&self) -> Option<DateTime<Utc>> {
        self.next_refresh
    }

    /// Payload cache file
    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    /// Signature cache file
    pub fn signature_path(&self) -> PathBuf {
        signature_path(&self.cache_path)
    }

    /// Maximum cache age before a refresh is attempted
    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    /// Delay applied after a successful refresh
    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// Delay applied after a failed refresh
    pub fn min_refresh_interval(&self) -> Duration {
        self.min_refresh_interval
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Source")
            .field("name", &self.name)
            .field("mirrors", &self.mirrors)
            .field("key", &self.key)
            .field("cache_path", &self.cache_path)
            .field("payload_len", &self.payload.as_ref().map(Bytes::len))
            .field("next_refresh", &self.next_refresh)
            .finish()
    }
}
