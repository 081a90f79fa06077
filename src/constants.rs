//! Application constants for Signed Fetcher
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain for maintainability and clarity.

use std::time::Duration;

/// Source container and signature format constants
pub mod format {
    /// The only container format tag this client understands
    pub const SUPPORTED_FORMAT: &str = "v2";

    /// Suffix appended to a payload path or URL to locate its detached signature
    pub const SIGNATURE_SUFFIX: &str = ".minisig";

    /// Two-byte algorithm tag for legacy (non-prehashed) Ed25519 signatures and keys
    pub const ALG_ED25519: [u8; 2] = *b"Ed";

    /// Two-byte algorithm tag for BLAKE2b-512 prehashed Ed25519 signatures
    pub const ALG_ED25519_PREHASHED: [u8; 2] = *b"ED";

    /// Length of a minisign key identifier
    pub const KEY_ID_LENGTH: usize = 8;

    /// Prefix of the first line of key and signature files
    pub const UNTRUSTED_COMMENT_PREFIX: &str = "untrusted comment:";

    /// Prefix of the third line of a signature file
    pub const TRUSTED_COMMENT_PREFIX: &str = "trusted comment: ";
}

/// Refresh scheduling defaults
pub mod refresh {
    use super::Duration;

    /// Delay before the next refresh after a successful one
    pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

    /// Delay before the next refresh after a failed one, and the scheduler's global floor
    pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(10 * 60);

    /// Maximum age of a cached payload before a refresh is attempted
    pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(72 * 60 * 60);

    /// Number of sources refreshed concurrently by the scheduler
    pub const DEFAULT_MAX_CONCURRENCY: usize = 4;
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = concat!("signed-fetcher/", env!("CARGO_PKG_VERSION"));

    /// Default HTTP request timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum number of redirects to follow
    pub const MAX_REDIRECTS: usize = 10;

    /// Default rate limit for mirror requests (requests per second)
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 10;
}

/// File system constants
pub mod files {
    /// Prefix for temporary files created next to cache files
    pub const TEMP_FILE_PREFIX: &str = ".signed-fetcher";

    /// Temporary file suffix for atomic operations
    pub const TEMP_FILE_SUFFIX: &str = ".tmp";

    /// Project-local configuration file name
    pub const LOCAL_CONFIG_FILE: &str = "signed-fetcher.toml";

    /// Directory name used under the user's config and cache directories
    pub const APP_DIR_NAME: &str = "signed-fetcher";

    /// Configuration file name inside the user's config directory
    pub const USER_CONFIG_FILE: &str = "config.toml";
}

// Re-export commonly used constants at module level for convenience
pub use files::TEMP_FILE_SUFFIX;
pub use format::{SIGNATURE_SUFFIX, SUPPORTED_FORMAT};
pub use http::{DEFAULT_RATE_LIMIT_RPS, USER_AGENT};
pub use refresh::{DEFAULT_CACHE_TTL, DEFAULT_REFRESH_INTERVAL, MIN_REFRESH_INTERVAL};
