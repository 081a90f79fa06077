//! End-to-end refresh through real HTTP mirrors

mod common;

use std::time::Duration;

use chrono::Utc;
use httpmock::prelude::*;
use tempfile::TempDir;

use signed_fetcher::app::cache::signature_path;
use signed_fetcher::app::clock::add_duration;
use signed_fetcher::app::{RefreshOutcome, Source, SourceDefinition};
use signed_fetcher::errors::{MirrorError, RefreshError};

use common::{closed_port_url, short_body_server, transport, Signer};

const LIST: &[u8] = b"# public-resolvers\n\n## cloudflare\nsdns://AgcAAAAAAAAABzEuMC4wLjE\n";
const OLD_LIST: &[u8] = b"# public-resolvers\n\n## quad9\nsdns://AQMAAAAAAAAAETkuOS45Ljk6ODQ0Mw\n";

fn definition(dir: &TempDir, signer: &Signer, mirrors: Vec<String>) -> SourceDefinition {
    SourceDefinition::new(
        "public-resolvers",
        dir.path().join("public-resolvers.md"),
        signer.public_key(),
    )
    .with_mirrors(mirrors)
}

#[tokio::test]
async fn test_second_mirror_serves_after_404_and_cache_is_reused() {
    let temp_dir = TempDir::new().unwrap();
    let signer = Signer::new(21);
    let broken = MockServer::start_async().await;
    let healthy = MockServer::start_async().await;

    let broken_list = broken
        .mock_async(|when, then| {
            when.method(GET).path("/v3/public-resolvers.md");
            then.status(404);
        })
        .await;
    let broken_sig = broken
        .mock_async(|when, then| {
            when.method(GET).path("/v3/public-resolvers.md.minisig");
            then.status(200).body(signer.sign(LIST));
        })
        .await;
    let healthy_list = healthy
        .mock_async(|when, then| {
            when.method(GET).path("/v3/public-resolvers.md");
            then.status(200).body(LIST);
        })
        .await;
    let healthy_sig = healthy
        .mock_async(|when, then| {
            when.method(GET).path("/v3/public-resolvers.md.minisig");
            then.status(200).body(signer.sign(LIST));
        })
        .await;

    let mirrors = vec![
        broken.url("/v3/public-resolvers.md"),
        healthy.url("/v3/public-resolvers.md"),
    ];
    let transport = transport();
    let now = Utc::now();

    let (source, outcome) =
        Source::open(definition(&temp_dir, &signer, mirrors.clone()), &transport, now)
            .await
            .unwrap();

    match outcome {
        RefreshOutcome::Downloaded { mirror } => assert_eq!(mirror.as_str(), mirrors[1]),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(source.payload().as_deref(), Some(LIST));
    assert_eq!(
        source.next_refresh(),
        Some(add_duration(now, Duration::from_secs(24 * 60 * 60)))
    );
    assert_eq!(broken_list.hits_async().await, 1);
    assert_eq!(broken_sig.hits_async().await, 0);
    assert_eq!(healthy_list.hits_async().await, 1);
    assert_eq!(healthy_sig.hits_async().await, 1);

    // The cached pair is what the mirror served
    let cache_path = temp_dir.path().join("public-resolvers.md");
    assert_eq!(tokio::fs::read(&cache_path).await.unwrap(), LIST);
    assert!(signature_path(&cache_path).exists());

    // A second process start finds a fresh cache and stays offline
    let (restarted, outcome) =
        Source::open(definition(&temp_dir, &signer, mirrors), &transport, Utc::now())
            .await
            .unwrap();
    assert!(matches!(outcome, RefreshOutcome::Fresh));
    assert_eq!(restarted.payload().as_deref(), Some(LIST));
    assert_eq!(healthy_list.hits_async().await, 1);
    assert_eq!(broken_list.hits_async().await, 1);
}

#[tokio::test]
async fn test_unreachable_mirror_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let signer = Signer::new(22);
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/relays.md");
            then.status(200).body(LIST);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/relays.md.minisig");
            then.status(200).body(signer.sign(LIST));
        })
        .await;

    let mirrors = vec![closed_port_url("/relays.md").await, server.url("/relays.md")];
    let (source, outcome) =
        Source::open(definition(&temp_dir, &signer, mirrors), &transport(), Utc::now())
            .await
            .unwrap();

    assert!(outcome.is_success(), "{outcome:?}");
    assert_eq!(source.payload().as_deref(), Some(LIST));
}

#[tokio::test]
async fn test_short_body_never_triggers_signature_fetch() {
    let temp_dir = TempDir::new().unwrap();
    let signer = Signer::new(23);
    let (base, seen) = short_body_server(4096, b"# public-resolvers\n").await;

    let (source, outcome) = Source::open(
        definition(&temp_dir, &signer, vec![format!("{base}/public-resolvers.md")]),
        &transport(),
        Utc::now(),
    )
    .await
    .unwrap();

    match outcome.error().and_then(RefreshError::last_mirror_error) {
        Some(MirrorError::Truncated { .. }) => {}
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(source.payload(), None);
    assert_eq!(
        seen.lock().unwrap().clone(),
        vec!["GET /public-resolvers.md HTTP/1.1".to_string()]
    );
}

#[tokio::test]
async fn test_expired_cache_survives_bad_mirror_signature() {
    let temp_dir = TempDir::new().unwrap();
    let signer = Signer::new(24);
    let cache_path = temp_dir.path().join("public-resolvers.md");
    tokio::fs::write(&cache_path, OLD_LIST).await.unwrap();
    tokio::fs::write(signature_path(&cache_path), signer.sign(OLD_LIST))
        .await
        .unwrap();

    // Mirror content signed by a different key
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/public-resolvers.md");
            then.status(200).body(LIST);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/public-resolvers.md.minisig");
            then.status(200).body(Signer::new(99).sign(LIST));
        })
        .await;

    let now = add_duration(Utc::now(), Duration::from_secs(4 * 24 * 60 * 60));
    let (source, outcome) = Source::open(
        definition(&temp_dir, &signer, vec![server.url("/public-resolvers.md")]),
        &transport(),
        now,
    )
    .await
    .unwrap();

    match outcome.error().and_then(RefreshError::last_mirror_error) {
        Some(MirrorError::SignatureInvalid { .. }) => {}
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(source.payload().as_deref(), Some(OLD_LIST));
    assert_eq!(
        source.next_refresh(),
        Some(add_duration(now, Duration::from_secs(600)))
    );
    // Nothing unverified reached the cache
    assert_eq!(tokio::fs::read(&cache_path).await.unwrap(), OLD_LIST);
}
