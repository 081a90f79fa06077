//! Configuration management for Signed Fetcher
//!
//! Configuration is a single TOML file. Every table is optional and falls
//! back to defaults, except that a useful file names at least one
//! `[sources.<name>]` table.
//!
//! ```toml
//! cache_dir = "/var/cache/signed-fetcher"
//!
//! [client]
//! request_timeout = "30s"
//!
//! [scheduler]
//! min_interval = "10m"
//! max_concurrency = 4
//!
//! [sources.public-resolvers]
//! urls = ["https://download.dnscrypt.info/resolvers-list/v3/public-resolvers.md"]
//! minisign_key = "RWQf6LRCGA9i53mlYecO4IzT51TGPpvWucNSCh1CBM0QTaLn73Y7GFO3"
//! cache_file = "public-resolvers.md"
//! refresh_interval = "24h"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::{ClientConfig, SchedulerConfig, SourceDefinition};
use crate::constants::{files, refresh, SUPPORTED_FORMAT};
use crate::errors::{ConfigError, ConfigResult};

/// Unified application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base directory for relative `cache_file` paths
    pub cache_dir: Option<PathBuf>,
    /// HTTP client settings
    pub client: ClientConfig,
    /// Refresh scheduler settings
    pub scheduler: SchedulerConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Sources by name
    pub sources: BTreeMap<String, SourceConfig>,
}

/// One `[sources.<name>]` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Mirror URLs in priority order; empty for a cache-only source
    #[serde(default)]
    pub urls: Vec<String>,
    /// Base64 minisign public key
    pub minisign_key: String,
    /// Payload cache file, relative to `cache_dir` unless absolute
    pub cache_file: PathBuf,
    /// Container format tag
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_cache_ttl", with = "humantime_serde")]
    pub cache_ttl: Duration,
    #[serde(default = "default_refresh_interval", with = "humantime_serde")]
    pub refresh_interval: Duration,
    #[serde(default = "default_min_refresh_interval", with = "humantime_serde")]
    pub min_refresh_interval: Duration,
}

fn default_format() -> String {
    SUPPORTED_FORMAT.to_string()
}

fn default_cache_ttl() -> Duration {
    refresh::DEFAULT_CACHE_TTL
}

fn default_refresh_interval() -> Duration {
    refresh::DEFAULT_REFRESH_INTERVAL
}

fn default_min_refresh_interval() -> Duration {
    refresh::MIN_REFRESH_INTERVAL
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level, overridden by CLI verbosity flags
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration
    ///
    /// An explicit path must exist. Without one the standard locations are
    /// searched and, if nothing is found, defaults are used.
    pub async fn load(config_file_override: Option<PathBuf>) -> ConfigResult<Self> {
        let path = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path });
                }
                Some(path)
            }
            None => Self::find_config_file(),
        };

        match path {
            Some(path) => Self::load_from_file(&path).await,
            None => {
                debug!("No config file found in standard locations, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parse and validate configuration text
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let config = Self::from_toml_str(&content)?;
        info!(
            "Loaded configuration from {} ({} source(s))",
            path.display(),
            config.sources.len()
        );
        Ok(config)
    }

    /// Find a configuration file in the standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(".").join(files::LOCAL_CONFIG_FILE)];
        search_paths.extend(Self::default_config_path());

        for path in search_paths {
            if path.exists() {
                debug!("Found config file: {}", path.display());
                return Some(path);
            }
        }

        None
    }

    /// Per-user configuration file path
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(files::APP_DIR_NAME).join(files::USER_CONFIG_FILE))
    }

    /// Per-user cache directory, or `./cache` when it cannot be determined
    pub fn default_cache_dir() -> PathBuf {
        dirs::cache_dir()
            .map(|dir| dir.join(files::APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("./cache"))
    }

    /// Directory relative cache files are resolved against
    pub fn resolved_cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(Self::default_cache_dir)
    }

    /// Validate the configuration, reporting every problem at once
    pub fn validate(&self) -> ConfigResult<()> {
        let mut errors = Vec::new();

        if let Err(err) = self.scheduler.validate() {
            errors.push(err);
        }

        if self.logging.level.parse::<tracing::Level>().is_err() {
            errors.push(format!("logging.level '{}' is not a log level", self.logging.level));
        }

        if self.client.rate_limit_rps == 0 {
            errors.push("client.rate_limit_rps must be at least 1".to_string());
        }

        for (name, source) in &self.sources {
            errors.extend(source.validate(name));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::ValidationFailed { errors })
        }
    }

    /// Construction parameters for every configured source, in name order
    pub fn source_definitions(&self) -> Vec<SourceDefinition> {
        let cache_dir = self.resolved_cache_dir();
        self.sources
            .iter()
            .map(|(name, source)| source.to_definition(name, &cache_dir))
            .collect()
    }
}

impl SourceConfig {
    fn validate(&self, name: &str) -> Vec<String> {
        let mut errors = Vec::new();

        if self.minisign_key.trim().is_empty() {
            errors.push(format!("sources.{name}.minisign_key cannot be empty"));
        }

        if self.cache_file.as_os_str().is_empty() {
            errors.push(format!("sources.{name}.cache_file cannot be empty"));
        }

        for (field, value) in [
            ("cache_ttl", self.cache_ttl),
            ("refresh_interval", self.refresh_interval),
            ("min_refresh_interval", self.min_refresh_interval),
        ] {
            if value.is_zero() {
                errors.push(format!("sources.{name}.{field} cannot be zero"));
            }
        }

        errors
    }

    /// Construction parameters, resolving a relative cache file against `cache_dir`
    pub fn to_definition(&self, name: &str, cache_dir: &Path) -> SourceDefinition {
        let cache_path = if self.cache_file.is_absolute() {
            self.cache_file.clone()
        } else {
            cache_dir.join(&self.cache_file)
        };

        SourceDefinition::new(name, cache_path, self.minisign_key.clone())
            .with_mirrors(self.urls.iter().cloned())
            .with_format(self.format.clone())
            .with_cache_ttl(self.cache_ttl)
            .with_refresh_interval(self.refresh_interval)
            .with_min_refresh_interval(self.min_refresh_interval)
    }
}
