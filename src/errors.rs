//! Error types for Signed Fetcher
//!
//! Errors are classified by where they arise (construction gate, cache,
//! transport, mirror, refresh, configuration) so callers can match on the
//! kind of failure and only format for humans at the boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Construction-time parameter errors
///
/// These abort creation of a source entirely; nothing is read from disk or
/// the network before they are checked.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// Container format tag is not the supported version
    #[error("Unsupported source format: {found} (this client understands {expected})")]
    UnsupportedFormat { found: String, expected: &'static str },

    /// Encoded public key could not be decoded
    #[error("Invalid encoded public key: {reason}")]
    InvalidPublicKey { reason: String },

    /// A refresh or cache interval is zero
    #[error("Interval {field} must be greater than zero")]
    ZeroInterval { field: &'static str },
}

/// Detached signature decoding and verification errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// Signature file does not follow the expected line layout or encoding
    #[error("Malformed signature file: {reason}")]
    Malformed { reason: String },

    /// Signature algorithm tag is not one we verify
    #[error("Unsupported signature algorithm: {algorithm}")]
    UnsupportedAlgorithm { algorithm: String },

    /// Signature was produced by a different key
    #[error("Signature key id {found} does not match trusted key id {expected}")]
    KeyMismatch { expected: String, found: String },

    /// Payload signature does not verify
    #[error("Signature verification failed")]
    Invalid,

    /// Signature over the trusted comment does not verify
    #[error("Trusted comment signature verification failed")]
    GlobalInvalid,
}

/// Local cache errors
///
/// All of these are non-fatal: they send the refresh to the mirrors and the
/// rejected cache contents are never retained.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Payload or signature cache file does not exist
    #[error("Cannot open cache file {path}: not found")]
    Open { path: PathBuf },

    /// Cache file exists but could not be read
    #[error("Failed to read cache file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cache pair failed signature verification
    #[error("Cache signature invalid for {path}: {source}")]
    Signature {
        path: PathBuf,
        #[source]
        source: SignatureError,
    },

    /// Writing the cache pair failed
    #[error("Failed to write cache file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors reported by a [`Transport`](crate::app::client::Transport)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection could not be established
    #[error("Connection failed: {reason}")]
    Connect { reason: String },

    /// Request exceeded its timeout
    #[error("Request timed out")]
    Timeout,

    /// Server answered with a non-success status
    #[error("Server responded with HTTP {status}")]
    Status { status: u16 },

    /// Body ended before the declared length was received
    #[error("Unexpected EOF: {detail}")]
    IncompleteBody {
        expected: Option<u64>,
        detail: String,
    },

    /// Any other request failure
    #[error("HTTP request failed: {reason}")]
    Request { reason: String },
}

impl TransportError {
    /// Creates a transport error from a reqwest error
    pub fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::Connect {
                reason: error.to_string(),
            }
        } else if let Some(status) = error.status() {
            Self::Status {
                status: status.as_u16(),
            }
        } else {
            Self::Request {
                reason: error.to_string(),
            }
        }
    }
}

/// Per-mirror failures
///
/// Each one is non-fatal: the fetcher records it and moves to the next mirror.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MirrorError {
    /// Mirror locator could not be parsed; no request was made
    #[error("Invalid mirror URL {url}: {reason}")]
    PathInvalid { url: String, reason: String },

    /// Mirror could not be reached or timed out
    #[error("Mirror {url} unreachable: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: TransportError,
    },

    /// Mirror returned a non-success status for the payload or its signature
    #[error("Mirror {url} returned HTTP {status}")]
    NotFound { url: String, status: u16 },

    /// Payload transfer ended early
    #[error("Truncated transfer from {url}: {detail}")]
    Truncated { url: String, detail: String },

    /// Signature could not be fetched completely, decoded, or verified
    #[error("Invalid signature from {url}: {reason}")]
    SignatureInvalid { url: String, reason: String },
}

impl MirrorError {
    /// The mirror locator the failure belongs to
    pub fn url(&self) -> &str {
        match self {
            MirrorError::PathInvalid { url, .. }
            | MirrorError::Unreachable { url, .. }
            | MirrorError::NotFound { url, .. }
            | MirrorError::Truncated { url, .. }
            | MirrorError::SignatureInvalid { url, .. } => url,
        }
    }

    /// Short label for the failure class
    pub fn kind(&self) -> &'static str {
        match self {
            MirrorError::PathInvalid { .. } => "path",
            MirrorError::Unreachable { .. } => "unreachable",
            MirrorError::NotFound { .. } => "not_found",
            MirrorError::Truncated { .. } => "truncated",
            MirrorError::SignatureInvalid { .. } => "signature",
        }
    }
}

/// Failure of a whole refresh attempt
///
/// The source stays usable with whatever trusted payload it already had.
#[derive(Error, Debug)]
pub enum RefreshError {
    /// Cache-only source whose cache could not be used
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Every mirror failed; carries the last failure
    #[error("All {attempts} mirror(s) failed, last error: {last}")]
    MirrorsExhausted {
        attempts: usize,
        #[source]
        last: MirrorError,
    },

    /// Refresh was requested for a source without mirrors
    #[error("Source has no mirrors to refresh from")]
    NoMirrors,
}

impl RefreshError {
    /// Last per-mirror error, if the refresh reached the mirrors
    pub fn last_mirror_error(&self) -> Option<&MirrorError> {
        match self {
            RefreshError::MirrorsExhausted { last, .. } => Some(last),
            RefreshError::Cache(_) | RefreshError::NoMirrors => None,
        }
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Configuration file could not be read
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration format
    #[error("Invalid configuration format: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    /// Configuration validation failed
    #[error("Configuration validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<String> },
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Construction gate error
    #[error(transparent)]
    Gate(#[from] GateError),

    /// Signature error
    #[error(transparent)]
    Signature(#[from] SignatureError),

    /// Cache error
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Transport error
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Mirror error
    #[error(transparent)]
    Mirror(#[from] MirrorError),

    /// Refresh error
    #[error(transparent)]
    Refresh(#[from] RefreshError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable by retrying later
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Cache(_)
            | AppError::Transport(_)
            | AppError::Mirror(_)
            | AppError::Refresh(_) => true,

            AppError::Gate(_)
            | AppError::Signature(_)
            | AppError::Config(_)
            | AppError::Io(_)
            | AppError::Generic { .. } => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Gate(_) => "gate",
            AppError::Signature(_) => "signature",
            AppError::Cache(_) => "cache",
            AppError::Transport(_) => "transport",
            AppError::Mirror(_) => "mirror",
            AppError::Refresh(_) => "refresh",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Gate result type alias
pub type GateResult<T> = std::result::Result<T, GateError>;

/// Signature result type alias
pub type SignatureResult<T> = std::result::Result<T, SignatureError>;

/// Cache result type alias
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Transport result type alias
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// Mirror result type alias
pub type MirrorResult<T> = std::result::Result<T, MirrorError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
