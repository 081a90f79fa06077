//! On-disk cache of the last verified payload
//!
//! Each source owns two sibling files: the raw payload at its cache path and
//! the detached signature at the same path plus `.minisig`. Freshness comes
//! from the payload file's modification time; nothing else is stored.

pub mod loader;
pub mod store;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::constants::SIGNATURE_SUFFIX;

pub use loader::{load_cache, CacheStatus, CachedPayload};
pub use store::store_cache;

/// Path of the detached signature that accompanies `cache_path`
pub fn signature_path(cache_path: &Path) -> PathBuf {
    let mut path = OsString::from(cache_path.as_os_str());
    path.push(SIGNATURE_SUFFIX);
    PathBuf::from(path)
}

#[cfg(test)]
mod tests;
