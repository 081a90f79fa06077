//! Atomic persistence of a verified payload and its signature
//!
//! Both files are written to temporaries in the cache directory, synced,
//! then renamed into place signature first. A reader can therefore see an
//! old payload with a new signature (which fails verification and is
//! discarded) but never a new payload standing next to a stale signature.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile};
use tracing::debug;

use crate::app::cache::signature_path;
use crate::constants::files;
use crate::errors::{CacheError, CacheResult};

/// Write the pair for `cache_path`
///
/// # Errors
///
/// Returns `CacheError::Write` naming the file that could not be written.
pub async fn store_cache(cache_path: &Path, payload: &[u8], signature: &[u8]) -> CacheResult<()> {
    let cache_path = cache_path.to_path_buf();
    let payload = payload.to_vec();
    let signature = signature.to_vec();

    // Blocking filesystem work runs off the async workers
    let target = cache_path.clone();
    tokio::task::spawn_blocking(move || write_pair(&target, &payload, &signature))
        .await
        .map_err(|err| CacheError::Write {
            path: cache_path.clone(),
            source: std::io::Error::other(format!("task join error: {err}")),
        })??;

    debug!("Stored cache pair at {}", cache_path.display());
    Ok(())
}

fn write_pair(cache_path: &Path, payload: &[u8], signature: &[u8]) -> CacheResult<()> {
    let sig_path = signature_path(cache_path);
    let parent = cache_dir(cache_path);

    std::fs::create_dir_all(&parent).map_err(|source| CacheError::Write {
        path: parent.clone(),
        source,
    })?;

    let sig_temp = write_temp(&parent, &sig_path, signature)?;
    let payload_temp = write_temp(&parent, cache_path, payload)?;

    persist(sig_temp, &sig_path)?;
    persist(payload_temp, cache_path)
}

fn cache_dir(cache_path: &Path) -> PathBuf {
    match cache_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn write_temp(dir: &Path, final_path: &Path, bytes: &[u8]) -> CacheResult<NamedTempFile> {
    let write_error = |source| CacheError::Write {
        path: final_path.to_path_buf(),
        source,
    };

    let mut temp = Builder::new()
        .prefix(files::TEMP_FILE_PREFIX)
        .suffix(files::TEMP_FILE_SUFFIX)
        .tempfile_in(dir)
        .map_err(write_error)?;
    temp.write_all(bytes).map_err(write_error)?;
    temp.flush().map_err(write_error)?;
    temp.as_file().sync_all().map_err(write_error)?;
    Ok(temp)
}

fn persist(temp: NamedTempFile, final_path: &Path) -> CacheResult<()> {
    temp.persist(final_path)
        .map(|_| ())
        .map_err(|err| CacheError::Write {
            path: final_path.to_path_buf(),
            source: err.error,
        })
}
