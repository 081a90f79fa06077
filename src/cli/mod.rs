//! Command-line interface components
//!
//! This module contains CLI-specific code for the Signed Fetcher
//! application: argument parsing and command handlers.

pub mod args;
pub mod commands;

pub use args::{CheckArgs, Cli, Commands, GlobalArgs, VerifyArgs};
pub use commands::{handle_check, handle_run, handle_verify, open_sources, SourceReport};
