//! Signed Fetcher CLI application
//!
//! Command-line interface for keeping minisign-signed resources downloaded,
//! verified and cached.

use std::process;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use signed_fetcher::cli::{handle_check, handle_run, handle_verify, Cli, Commands, GlobalArgs};
use signed_fetcher::config::AppConfig;
use signed_fetcher::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let cli_level = cli.log_level().map(|level| level.to_string().to_lowercase());

    match cli.command {
        Commands::Check(args) => {
            let config = configure(&cli.global, cli_level).await?;
            info!("Executing check command");
            handle_check(args, &config).await
        }
        Commands::Run => {
            let config = configure(&cli.global, cli_level).await?;
            info!("Executing run command");
            handle_run(&config).await
        }
        Commands::Verify(args) => {
            // Offline verification needs no configuration
            init_logging(cli_level.as_deref().unwrap_or("warn"), cli.global.very_verbose);
            handle_verify(args).await
        }
    }
}

/// Load configuration, apply global overrides and start logging
async fn configure(global: &GlobalArgs, cli_level: Option<String>) -> Result<AppConfig> {
    let mut config = AppConfig::load(global.config.clone()).await?;
    if let Some(dir) = &global.cache_dir {
        config.cache_dir = Some(dir.clone());
    }

    let level = cli_level.unwrap_or_else(|| config.logging.level.clone());
    init_logging(&level, global.very_verbose);

    info!("Signed Fetcher v{} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "{} source(s) configured, cache directory {}",
        config.sources.len(),
        config.resolved_cache_dir().display()
    );
    Ok(config)
}

/// Initialize logging for this crate at `level`; `RUST_LOG` takes precedence
fn init_logging(level: &str, show_levels: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("signed_fetcher={}", level)));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(show_levels)
        .init();
}
