//! Configuration file loading
//!
//! The command line carries everything a run needs; the optional TOML file
//! only tunes logging, pacing and the HTTP client.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use vappdeploy_client::ClientConfig;
use vappdeploy_core::Timing;

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "VAPPDEPLOY_CONFIG";

/// Top-level configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` wins
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub client: ClientSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            timing: TimingConfig::default(),
            client: ClientSettings::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Run pacing in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub spawn_stagger_ms: u64,
    pub settle_grace_ms: u64,
    pub poll_interval_ms: u64,
    pub final_grace_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        let timing = Timing::default();
        Self {
            spawn_stagger_ms: millis(timing.spawn_stagger),
            settle_grace_ms: millis(timing.settle_grace),
            poll_interval_ms: millis(timing.poll_interval),
            final_grace_ms: millis(timing.final_grace),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl From<TimingConfig> for Timing {
    fn from(config: TimingConfig) -> Self {
        Self {
            spawn_stagger: Duration::from_millis(config.spawn_stagger_ms),
            settle_grace: Duration::from_millis(config.settle_grace_ms),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            final_grace: Duration::from_millis(config.final_grace_ms),
        }
    }
}

/// HTTP client settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Accept self-signed certificates
    pub accept_invalid_certs: bool,
    pub request_timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            accept_invalid_certs: true,
            request_timeout_secs: 60,
        }
    }
}

impl ClientSettings {
    /// Apply these settings on top of a client config built from the CLI
    #[must_use]
    pub fn apply(self, mut config: ClientConfig) -> ClientConfig {
        config.accept_invalid_certs = self.accept_invalid_certs;
        config.request_timeout = Duration::from_secs(self.request_timeout_secs);
        config
    }
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    /// Returns error if the text is not a valid configuration or the poll
    /// interval is zero
    pub fn parse(content: &str) -> eyre::Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.timing.poll_interval_ms == 0 {
            eyre::bail!("timing.poll_interval_ms must be at least 1");
        }
        Ok(config)
    }

    /// Find the config file to use, if any
    ///
    /// An explicit path is used as given; otherwise the environment variable
    /// and the usual locations are tried in order.
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }

        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }

        let mut paths = vec![
            PathBuf::from("vappdeploy.toml"),
            PathBuf::from("/etc/vappdeploy/vappdeploy.toml"),
        ];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("vappdeploy/vappdeploy.toml"));
        }

        paths.into_iter().find(|path| path.exists())
    }
}
