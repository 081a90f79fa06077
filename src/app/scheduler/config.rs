//! Configuration for the refresh scheduler

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::refresh;

/// Scheduler settings, the `[scheduler]` table of the configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Shortest delay the scheduler will ever ask to sleep
    #[serde(with = "humantime_serde")]
    pub min_interval: Duration,
    /// Maximum number of sources refreshed at the same time
    pub max_concurrency: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_interval: refresh::MIN_REFRESH_INTERVAL,
            max_concurrency: refresh::DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl SchedulerConfig {
    /// Set the global floor interval
    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    /// Set the refresh concurrency bound
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.min_interval.is_zero() {
            return Err("Scheduler minimum interval cannot be zero".to_string());
        }

        if self.max_concurrency == 0 {
            return Err("Scheduler concurrency must be at least 1".to_string());
        }

        Ok(())
    }
}
