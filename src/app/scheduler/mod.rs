//! Periodic refresh of a set of sources
//!
//! [`prefetch_sources`] refreshes whichever sources are due and reports how
//! long the caller may sleep before the next one could be. [`Scheduler`]
//! wraps it in a loop driven by a [`Clock`] and stopped by a shutdown
//! broadcast.
//!
//! Due sources are refreshed concurrently up to `max_concurrency`. Each
//! refresh holds the only mutable borrow of its source, so two refreshes of
//! the same source (and its cache files) can never overlap.

pub mod config;
pub mod signals;

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::app::client::Transport;
use crate::app::clock::{until, Clock};
use crate::app::source::{RefreshOutcome, Source};

pub use config::SchedulerConfig;
pub use signals::{create_shutdown_channel, SignalHandler};

/// Refresh every due source and return the delay until the next check
///
/// The delay is the smallest time any scheduled source has left, which for a
/// source refreshed in this round is exactly the interval it was just given.
/// It is never shorter than `config.min_interval`, and is exactly that floor
/// when no source schedules itself.
pub async fn prefetch_sources<T>(
    sources: &mut [Source],
    transport: &T,
    now: DateTime<Utc>,
    config: &SchedulerConfig,
) -> Duration
where
    T: Transport + ?Sized,
{
    let due: Vec<&mut Source> = sources
        .iter_mut()
        .filter(|source| source.is_due(now))
        .collect();

    if !due.is_empty() {
        info!("Refreshing {} due source(s)", due.len());
    }

    let outcomes: Vec<(String, RefreshOutcome)> = stream::iter(due)
        .map(move |source| async move {
            let outcome = source.refresh(transport, now).await;
            (source.name().to_string(), outcome)
        })
        .buffer_unordered(config.max_concurrency.max(1))
        .collect()
        .await;

    for (name, outcome) in &outcomes {
        match outcome {
            RefreshOutcome::Failed(err) => warn!("[{}] refresh failed: {}", name, err),
            other => debug!("[{}] refresh {}", name, other.label()),
        }
    }

    next_interval(sources, now, config.min_interval)
}

/// Smallest remaining time across scheduled sources, floored at `floor`
pub fn next_interval(sources: &[Source], now: DateTime<Utc>, floor: Duration) -> Duration {
    sources
        .iter()
        .filter_map(Source::next_refresh)
        .map(|at| until(now, at))
        .min()
        .map_or(floor, |shortest| shortest.max(floor))
}

/// Refresh loop over a fixed set of sources
pub struct Scheduler<T, C> {
    transport: T,
    clock: C,
    config: SchedulerConfig,
}

impl<T, C> Scheduler<T, C>
where
    T: Transport,
    C: Clock,
{
    pub fn new(transport: T, clock: C, config: SchedulerConfig) -> Self {
        Self {
            transport,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// One refresh round at the clock's current time
    pub async fn prefetch(&self, sources: &mut [Source]) -> Duration {
        let now = self.clock.now();
        prefetch_sources(sources, &self.transport, now, &self.config).await
    }

    /// Refresh, sleep for the returned delay, repeat
    ///
    /// Returns once `shutdown` fires or its sender is dropped. A round that
    /// has started is allowed to finish. Returns the number of completed
    /// rounds.
    pub async fn run(&self, sources: &mut [Source], mut shutdown: broadcast::Receiver<()>) -> u64 {
        info!(
            "Scheduler started for {} source(s), floor {:?}",
            sources.len(),
            self.config.min_interval
        );

        let mut rounds = 0u64;
        loop {
            let delay = self.prefetch(sources).await;
            rounds += 1;
            debug!("Next refresh check in {:?}", delay);

            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Scheduler stopped after {} round(s)", rounds);
                    return rounds;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
