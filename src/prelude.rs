//! Prelude module for Signed Fetcher Library
//!
//! Re-exports the items most integrations need, so a single
//! `use signed_fetcher::prelude::*;` is enough for typical usage.
//!
//! # Usage
//!
//! ```rust,no_run
//! use signed_fetcher::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = AppConfig::load(None).await?;
//!     let transport = HttpTransport::new(&config.client)?;
//!
//!     let mut sources = Vec::new();
//!     for definition in config.source_definitions() {
//!         let (source, _) = Source::open(definition, &transport, Utc::now()).await?;
//!         sources.push(source);
//!     }
//!
//!     let (_shutdown_tx, shutdown_rx) = create_shutdown_channel();
//!     Scheduler::new(transport, SystemClock, config.scheduler)
//!         .run(&mut sources, shutdown_rx)
//!         .await;
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, RefreshError, Result};

pub use crate::app::scheduler::create_shutdown_channel;
pub use crate::app::{
    ClientConfig, Clock, HttpTransport, PublicKey, RefreshOutcome, Scheduler, SchedulerConfig,
    Source, SourceDefinition, SystemClock, Transport,
};
pub use crate::config::AppConfig;

// Commonly used constants
pub use crate::constants::{
    DEFAULT_CACHE_TTL, DEFAULT_REFRESH_INTERVAL, MIN_REFRESH_INTERVAL, SUPPORTED_FORMAT,
};

pub use bytes::Bytes;
pub use chrono::{DateTime, Utc};
