//! Command-line argument parsing for Signed Fetcher
//!
//! This module defines the CLI structure using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Signed Fetcher - keep signed resource lists fresh
#[derive(Parser, Debug)]
#[command(
    name = "signed_fetcher",
    version,
    about = "Download and cache minisign-signed resources from mirrors",
    long_about = "Fetches resource lists from an ordered set of mirrors, verifies their minisign
signatures against a trusted key and keeps a local cache that survives mirror outages."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory for relative cache files
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load every configured source once and report its state
    Check(CheckArgs),

    /// Keep every configured source refreshed until interrupted
    Run,

    /// Verify a local file against its detached signature
    Verify(VerifyArgs),
}

/// Arguments for the check command
#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the verify command
#[derive(Args, Debug, Clone)]
pub struct VerifyArgs {
    /// Base64 minisign public key
    #[arg(short, long)]
    pub key: String,

    /// Signature file (defaults to FILE.minisig)
    #[arg(short, long, value_name = "SIG")]
    pub signature: Option<PathBuf>,

    /// File to verify
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Logging level requested on the command line, if any
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::DEBUG)
        } else if self.global.verbose {
            Some(tracing::Level::INFO)
        } else {
            None
        }
    }
}
