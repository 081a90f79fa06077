//! Ordered multi-mirror download
//!
//! Mirrors are tried strictly in list order. The first one that serves a
//! payload and a signature that verifies wins and no later mirror is
//! contacted. A payload fetch that fails for any reason never triggers the
//! signature fetch for that mirror.

use bytes::Bytes;
use tracing::{debug, info, warn};
use url::Url;

use crate::app::client::Transport;
use crate::app::signature::PublicKey;
use crate::constants::SIGNATURE_SUFFIX;
use crate::errors::{MirrorError, MirrorResult, RefreshError, TransportError};

/// A payload and signature pair that verified against the trusted key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorDownload {
    /// Mirror that served the pair
    pub mirror: Url,
    /// Verified payload
    pub payload: Bytes,
    /// Raw detached signature, as persisted next to the payload
    pub signature: Bytes,
    /// Trusted comment of the signature
    pub trusted_comment: String,
}

/// Try each mirror in order until one yields a verified pair
///
/// # Errors
///
/// `RefreshError::NoMirrors` for an empty list, otherwise
/// `RefreshError::MirrorsExhausted` carrying the last mirror's failure.
pub async fn fetch_from_mirrors<T>(
    mirrors: &[String],
    key: &PublicKey,
    transport: &T,
) -> Result<MirrorDownload, RefreshError>
where
    T: Transport + ?Sized,
{
    let mut last_error = None;

    for (index, mirror) in mirrors.iter().enumerate() {
        debug!("Trying mirror {}/{}: {}", index + 1, mirrors.len(), mirror);
        match fetch_one(mirror, key, transport).await {
            Ok(download) => {
                info!(
                    "Downloaded {} verified bytes from {}",
                    download.payload.len(),
                    download.mirror
                );
                return Ok(download);
            }
            Err(err) => {
                warn!("Mirror {} failed ({}): {}", mirror, err.kind(), err);
                last_error = Some(err);
            }
        }
    }

    match last_error {
        Some(last) => Err(RefreshError::MirrorsExhausted {
            attempts: mirrors.len(),
            last,
        }),
        None => Err(RefreshError::NoMirrors),
    }
}

/// Fetch and verify the pair from a single mirror
pub async fn fetch_one<T>(mirror: &str, key: &PublicKey, transport: &T) -> MirrorResult<MirrorDownload>
where
    T: Transport + ?Sized,
{
    let url = parse_mirror(mirror)?;

    let payload = transport
        .get(&url)
        .await
        .map_err(|err| payload_error(url.as_str(), err))?;

    let sig_url = signature_url(&url);
    let signature = transport
        .get(&sig_url)
        .await
        .map_err(|err| signature_error(sig_url.as_str(), err))?;

    let decoded = key
        .verify_detached(&payload, &signature)
        .map_err(|err| MirrorError::SignatureInvalid {
            url: sig_url.to_string(),
            reason: err.to_string(),
        })?;

    Ok(MirrorDownload {
        mirror: url,
        payload,
        signature,
        trusted_comment: decoded.trusted_comment().to_string(),
    })
}

/// Parse a mirror locator, rejecting anything a path cannot be appended to
pub fn parse_mirror(mirror: &str) -> MirrorResult<Url> {
    let url = Url::parse(mirror).map_err(|err| MirrorError::PathInvalid {
        url: mirror.to_string(),
        reason: err.to_string(),
    })?;

    if url.cannot_be_a_base() {
        return Err(MirrorError::PathInvalid {
            url: mirror.to_string(),
            reason: "URL has no path component".to_string(),
        });
    }

    Ok(url)
}

/// `<url>.minisig`, keeping any query string intact
pub fn signature_url(url: &Url) -> Url {
    let mut sig_url = url.clone();
    sig_url.set_path(&format!("{}{}", url.path(), SIGNATURE_SUFFIX));
    sig_url
}

fn payload_error(url: &str, err: TransportError) -> MirrorError {
    let url = url.to_string();
    match err {
        TransportError::Status { status } => MirrorError::NotFound { url, status },
        TransportError::IncompleteBody { detail, .. } => MirrorError::Truncated { url, detail },
        source @ (TransportError::Connect { .. }
        | TransportError::Timeout
        | TransportError::Request { .. }) => MirrorError::Unreachable { url, source },
    }
}

fn signature_error(url: &str, err: TransportError) -> MirrorError {
    let url = url.to_string();
    match err {
        TransportError::Status { status } => MirrorError::NotFound { url, status },
        TransportError::IncompleteBody { detail, .. } => MirrorError::SignatureInvalid {
            url,
            reason: format!("truncated signature: {detail}"),
        },
        source @ (TransportError::Connect { .. }
        | TransportError::Timeout
        | TransportError::Request { .. }) => MirrorError::Unreachable { url, source },
    }
}
