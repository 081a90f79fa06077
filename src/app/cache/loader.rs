//! Cache validation
//!
//! Reads the payload and detached signature pair for a source, verifies it
//! against the trusted key and classifies it by age. Anything that fails to
//! read or verify is rejected outright and never becomes a fallback.

use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::app::cache::signature_path;
use crate::app::clock::sub_duration;
use crate::app::signature::PublicKey;
use crate::errors::{CacheError, CacheResult};

/// A cached payload that passed signature verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPayload {
    /// Verified payload bytes
    pub payload: Bytes,
    /// Modification time of the payload file
    pub modified: DateTime<Utc>,
    /// Trusted comment of the verified signature
    pub trusted_comment: String,
}

/// Classification of a verified cache pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheStatus {
    /// Within TTL; no refresh needed
    Fresh(CachedPayload),
    /// Older than TTL; usable as a fallback while refreshing
    Expired(CachedPayload),
}

impl CacheStatus {
    /// Whether the payload is within its TTL
    pub fn is_fresh(&self) -> bool {
        matches!(self, CacheStatus::Fresh(_))
    }

    /// Consume the status, keeping the verified payload
    pub fn into_cached(self) -> CachedPayload {
        match self {
            CacheStatus::Fresh(cached) | CacheStatus::Expired(cached) => cached,
        }
    }
}

/// Load and verify the cache pair at `cache_path`
///
/// # Errors
///
/// - `CacheError::Open` if the payload or signature file does not exist
/// - `CacheError::Read` if either exists but cannot be read
/// - `CacheError::Signature` if the pair does not verify against `key`
pub async fn load_cache(
    cache_path: &Path,
    key: &PublicKey,
    ttl: Duration,
    now: DateTime<Utc>,
) -> CacheResult<CacheStatus> {
    let sig_path = signature_path(cache_path);

    let payload = read_cache_file(cache_path).await?;
    let signature = read_cache_file(&sig_path).await?;

    let decoded = key
        .verify_detached(&payload, &signature)
        .map_err(|source| CacheError::Signature {
            path: cache_path.to_path_buf(),
            source,
        })?;

    let modified = tokio::fs::metadata(cache_path)
        .await
        .and_then(|metadata| metadata.modified())
        .map_err(|source| CacheError::Read {
            path: cache_path.to_path_buf(),
            source,
        })?;
    let modified = DateTime::<Utc>::from(modified);

    let cached = CachedPayload {
        payload: Bytes::from(payload),
        modified,
        trusted_comment: decoded.trusted_comment().to_string(),
    };

    if modified > sub_duration(now, ttl) {
        debug!(
            "Cache {} is fresh (modified {})",
            cache_path.display(),
            modified
        );
        Ok(CacheStatus::Fresh(cached))
    } else {
        debug!(
            "Cache {} expired (modified {}, ttl {:?})",
            cache_path.display(),
            modified,
            ttl
        );
        Ok(CacheStatus::Expired(cached))
    }
}

async fn read_cache_file(path: &Path) -> CacheResult<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            CacheError::Open {
                path: path.to_path_buf(),
            }
        } else {
            CacheError::Read {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}
