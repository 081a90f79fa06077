//! Signed Fetcher Library
//!
//! Keeps resources that are published on several mirrors with a detached
//! minisign signature downloaded, verified and cached. A verified local copy
//! is served until a mirror offers a newer one that also verifies; nothing
//! that fails verification is ever used or written to the cache.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
