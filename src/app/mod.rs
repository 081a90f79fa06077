//! Core logic for Signed Fetcher
//!
//! The pieces compose bottom-up: [`signature`] decodes keys and detached
//! signatures, [`cache`] loads and stores verified payloads on disk,
//! [`mirror`] downloads a verified pair from an ordered mirror list,
//! [`source`] drives one resource through cache and mirrors, and
//! [`scheduler`] keeps a set of sources refreshed.
//!
//! # Examples
//!
//! ```rust,no_run
//! use signed_fetcher::app::{ClientConfig, HttpTransport, Source, SourceDefinition};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::new(&ClientConfig::default())?;
//! let definition = SourceDefinition::new(
//!     "public-resolvers",
//!     "/var/cache/signed-fetcher/public-resolvers.md",
//!     "RWQf6LRCGA9i53mlYecO4IzT51TGPpvWucNSCh1CBM0QTaLn73Y7GFO3",
//! )
//! .with_mirrors(["https://download.dnscrypt.info/resolvers-list/v3/public-resolvers.md"]);
//!
//! let (source, outcome) = Source::open(definition, &transport, chrono::Utc::now()).await?;
//! if let Some(err) = outcome.error() {
//!     eprintln!("Serving stale or no data: {}", err);
//! }
//! println!("{} bytes trusted", source.payload().map_or(0, |p| p.len()));
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod clock;
pub mod mirror;
pub mod scheduler;
pub mod signature;
pub mod source;

// Re-export main public API
pub use cache::{load_cache, store_cache, CacheStatus, CachedPayload};
pub use client::{ClientConfig, HttpTransport, Transport};
pub use clock::{Clock, ManualClock, SystemClock};
pub use mirror::{fetch_from_mirrors, MirrorDownload};
pub use scheduler::{prefetch_sources, Scheduler, SchedulerConfig};
pub use signature::{check_parameters, PublicKey, SignatureFile, SourceFormat};
pub use source::{RefreshOutcome, Source, SourceDefinition};
