//! Command handlers for Signed Fetcher CLI
//!
//! This module implements the command handlers that connect CLI arguments
//! and configuration to the core application functionality.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::app::cache::signature_path;
use crate::app::client::Transport;
use crate::app::clock::Clock;
use crate::app::scheduler::{create_shutdown_channel, SignalHandler};
use crate::app::{HttpTransport, PublicKey, RefreshOutcome, Scheduler, Source, SystemClock};
use crate::cli::{CheckArgs, VerifyArgs};
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

/// Status of one source after it was opened
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub name: String,
    /// `fresh`, `downloaded`, `static`, `failed` or `rejected`
    pub outcome: String,
    pub error: Option<String>,
    pub payload_bytes: Option<usize>,
    pub trusted_comment: Option<String>,
    pub next_refresh: Option<DateTime<Utc>>,
    pub cache_file: PathBuf,
    pub mirrors: usize,
}

impl SourceReport {
    fn opened(source: &Source, outcome: &RefreshOutcome) -> Self {
        Self {
            name: source.name().to_string(),
            outcome: outcome.label().to_string(),
            error: outcome.error().map(ToString::to_string),
            payload_bytes: source.payload().map(|payload| payload.len()),
            trusted_comment: source.trusted_comment().map(str::to_string),
            next_refresh: source.next_refresh(),
            cache_file: source.cache_path().to_path_buf(),
            mirrors: source.mirrors().len(),
        }
    }

    /// Whether a trusted payload is available
    pub fn has_payload(&self) -> bool {
        self.payload_bytes.is_some()
    }
}

/// Open every configured source once
///
/// Sources rejected at construction appear in the reports but not in the
/// returned source list.
pub async fn open_sources<T, C>(
    config: &AppConfig,
    transport: &T,
    clock: &C,
) -> (Vec<Source>, Vec<SourceReport>)
where
    T: Transport + ?Sized,
    C: Clock + ?Sized,
{
    let mut sources = Vec::new();
    let mut reports = Vec::new();

    for definition in config.source_definitions() {
        let name = definition.name.clone();
        let cache_file = definition.cache_path.clone();
        let mirrors = definition.mirrors.len();

        match Source::open(definition, transport, clock.now()).await {
            Ok((source, outcome)) => {
                if let Some(err) = outcome.error() {
                    warn!("[{}] opened in degraded state: {}", name, err);
                }
                reports.push(SourceReport::opened(&source, &outcome));
                sources.push(source);
            }
            Err(err) => {
                error!("[{}] rejected: {}", name, err);
                reports.push(SourceReport {
                    name,
                    outcome: "rejected".to_string(),
                    error: Some(err.to_string()),
                    payload_bytes: None,
                    trusted_comment: None,
                    next_refresh: None,
                    cache_file,
                    mirrors,
                });
            }
        }
    }

    (sources, reports)
}

/// Handle the check command
///
/// Fails when any source ends up without a trusted payload.
pub async fn handle_check(args: CheckArgs, config: &AppConfig) -> Result<()> {
    if config.sources.is_empty() {
        return Err(AppError::generic("No sources configured"));
    }

    let transport = HttpTransport::new(&config.client)?;
    let (_, reports) = open_sources(config, &transport, &SystemClock).await;

    if args.json {
        let json = serde_json::to_string_pretty(&reports)
            .map_err(|e| AppError::generic(format!("Failed to encode report: {e}")))?;
        println!("{json}");
    } else {
        print_reports(&reports);
    }

    let missing = reports.iter().filter(|report| !report.has_payload()).count();
    if missing > 0 {
        return Err(AppError::generic(format!(
            "{missing} of {} source(s) have no trusted payload",
            reports.len()
        )));
    }

    Ok(())
}

fn print_reports(reports: &[SourceReport]) {
    println!("🔐 Source Status");
    println!("================");

    for report in reports {
        let marker = match (report.has_payload(), report.error.is_some()) {
            (true, false) => "✅",
            (true, true) => "⚠️ ",
            (false, _) => "❌",
        };

        println!();
        println!("{marker} {} ({})", report.name, report.outcome);
        println!("   Cache file:   {}", report.cache_file.display());
        println!("   Mirrors:      {}", report.mirrors);
        match report.payload_bytes {
            Some(bytes) => println!("   Payload:      {bytes} bytes"),
            None => println!("   Payload:      none"),
        }
        if let Some(comment) = &report.trusted_comment {
            println!("   Signed:       {comment}");
        }
        match report.next_refresh {
            Some(at) => println!("   Next refresh: {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
            None => println!("   Next refresh: never (cache only)"),
        }
        if let Some(err) = &report.error {
            println!("   Error:        {err}");
        }
    }
}

/// Handle the run command
pub async fn handle_run(config: &AppConfig) -> Result<()> {
    if config.sources.is_empty() {
        return Err(AppError::generic("No sources configured"));
    }

    let transport = HttpTransport::new(&config.client)?;
    let (mut sources, reports) = open_sources(config, &transport, &SystemClock).await;

    for report in &reports {
        info!(
            "[{}] {} ({} bytes)",
            report.name,
            report.outcome,
            report.payload_bytes.unwrap_or(0)
        );
    }

    if sources.is_empty() {
        return Err(AppError::generic("Every configured source was rejected"));
    }

    let (shutdown_tx, shutdown_rx) = create_shutdown_channel();
    let signals = SignalHandler::new(shutdown_tx).setup();

    let scheduler = Scheduler::new(transport, SystemClock, config.scheduler.clone());
    let rounds = scheduler.run(&mut sources, shutdown_rx).await;
    signals.abort();

    info!("Stopped after {} refresh round(s)", rounds);
    Ok(())
}

/// Handle the verify command
pub async fn handle_verify(args: VerifyArgs) -> Result<()> {
    let key = PublicKey::from_base64(&args.key)?;
    let sig_path = args
        .signature
        .unwrap_or_else(|| signature_path(&args.file));

    let payload = tokio::fs::read(&args.file).await?;
    let signature = tokio::fs::read(&sig_path).await?;

    let decoded = key.verify_detached(&payload, &signature)?;

    println!(
        "✅ {} verified with key {}",
        args.file.display(),
        key.key_id_hex()
    );
    println!("   Trusted comment: {}", decoded.trusted_comment());
    Ok(())
}
