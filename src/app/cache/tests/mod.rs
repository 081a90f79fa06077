//! Tests for cache validation and persistence
//!
//! These cover every way a cache pair can be unusable, plus the round trip
//! from a successful store back to a fresh load.

use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use tempfile::TempDir;

use crate::app::cache::{load_cache, signature_path, store_cache, CacheStatus};
use crate::app::clock::add_duration;
use crate::app::signature::testing::TestSigner;
use crate::errors::{CacheError, SignatureError};

const TTL: Duration = Duration::from_secs(3 * 24 * 60 * 60);
const PAYLOAD: &[u8] = b"## quad9\nsdns://AQMAAAAAAAAAETkuOS45Ljk6ODQ0Mw\n";

async fn write_pair(path: &Path, payload: &[u8], signature: &[u8]) {
    tokio::fs::write(path, payload).await.unwrap();
    tokio::fs::write(signature_path(path), signature).await.unwrap();
}

#[test]
fn test_signature_path_appends_suffix() {
    assert_eq!(
        signature_path(Path::new("/var/cache/relays.md")),
        Path::new("/var/cache/relays.md.minisig")
    );
}

#[tokio::test]
async fn test_store_then_load_is_fresh() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("resolvers.md");
    let signer = TestSigner::new(1);

    store_cache(&path, PAYLOAD, &signer.sign(PAYLOAD))
        .await
        .unwrap();

    let status = load_cache(&path, &signer.public_key(), TTL, Utc::now())
        .await
        .unwrap();
    assert!(status.is_fresh());
    let cached = status.into_cached();
    assert_eq!(&cached.payload[..], PAYLOAD);
    assert!(cached.trusted_comment.contains("timestamp"));
}

#[tokio::test]
async fn test_old_cache_is_expired_but_kept() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("resolvers.md");
    let signer = TestSigner::new(1);
    write_pair(&path, PAYLOAD, &signer.sign(PAYLOAD)).await;

    // Four days later, with a three day TTL
    let later = add_duration(Utc::now(), Duration::from_secs(4 * 24 * 60 * 60));
    let status = load_cache(&path, &signer.public_key(), TTL, later)
        .await
        .unwrap();

    match status {
        CacheStatus::Expired(cached) => assert_eq!(&cached.payload[..], PAYLOAD),
        CacheStatus::Fresh(_) => panic!("cache should be expired"),
    }
}

#[tokio::test]
async fn test_missing_files_fail_with_open() {
    let temp_dir = TempDir::new().unwrap();
    let signer = TestSigner::new(1);
    let key = signer.public_key();

    let missing = temp_dir.path().join("missing.md");
    let err = load_cache(&missing, &key, TTL, Utc::now()).await.unwrap_err();
    assert!(matches!(err, CacheError::Open { .. }));

    let missing_sig = temp_dir.path().join("missing-sig.md");
    tokio::fs::write(&missing_sig, PAYLOAD).await.unwrap();
    let err = load_cache(&missing_sig, &key, TTL, Utc::now())
        .await
        .unwrap_err();
    match err {
        CacheError::Open { path } => assert_eq!(path, signature_path(&missing_sig)),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_partial_files_fail_verification() {
    let temp_dir = TempDir::new().unwrap();
    let signer = TestSigner::new(1);
    let key = signer.public_key();
    let signature = signer.sign(PAYLOAD);

    let partial = temp_dir.path().join("partial.md");
    write_pair(&partial, &PAYLOAD[..1], &signature).await;
    let err = load_cache(&partial, &key, TTL, Utc::now()).await.unwrap_err();
    assert!(matches!(
        err,
        CacheError::Signature {
            source: SignatureError::Invalid,
            ..
        }
    ));

    let partial_sig = temp_dir.path().join("partial-sig.md");
    write_pair(&partial_sig, PAYLOAD, &signature[..1]).await;
    let err = load_cache(&partial_sig, &key, TTL, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CacheError::Signature {
            source: SignatureError::Malformed { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn test_unreadable_file_fails_with_read() {
    let temp_dir = TempDir::new().unwrap();
    let signer = TestSigner::new(1);
    let path = temp_dir.path().join("unreadable.md");
    tokio::fs::write(&path, PAYLOAD).await.unwrap();
    // A directory where the signature should be cannot be read as a file
    tokio::fs::create_dir(signature_path(&path)).await.unwrap();

    let err = load_cache(&path, &signer.public_key(), TTL, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, CacheError::Read { .. }), "unexpected: {err:?}");
}

#[tokio::test]
async fn test_cache_signed_by_other_key_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("resolvers.md");
    let signer = TestSigner::new(1);
    let impostor = TestSigner::new(2);
    write_pair(&path, PAYLOAD, &impostor.sign(PAYLOAD)).await;

    let err = load_cache(&path, &signer.public_key(), TTL, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, CacheError::Signature { .. }));
}

#[tokio::test]
async fn test_store_replaces_pair_and_cleans_up() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("relays.md");
    let signer = TestSigner::new(1);

    store_cache(&path, b"first", &signer.sign(b"first"))
        .await
        .unwrap();
    store_cache(&path, PAYLOAD, &signer.sign(PAYLOAD))
        .await
        .unwrap();

    assert_eq!(tokio::fs::read(&path).await.unwrap(), PAYLOAD);
    assert_eq!(
        tokio::fs::read(signature_path(&path)).await.unwrap(),
        signer.sign(PAYLOAD)
    );

    let mut entries = tokio::fs::read_dir(path.parent().unwrap()).await.unwrap();
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.unwrap() {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    assert_eq!(names, vec!["relays.md", "relays.md.minisig"]);
}
