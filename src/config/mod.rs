//! # Migrator Configuration System
//!
//! YAML-based configuration with environment overrides. A base file
//! (`config/migrator.yaml`) is merged with an optional per-environment file
//! (`config/environments/<env>.yaml`) and with `MIGRATOR__SECTION__KEY`
//! environment variables, in that order.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use migrator_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let provider = &manager.config().cloud.provider;
//! let retries = manager.config().ssh.connect_retries;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use crate::constants::system;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

/// Root configuration structure mirroring migrator.yaml
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MigratorConfig {
    /// Cloud provider selection and credentials
    pub cloud: CloudConfig,

    /// Remote command transport
    pub ssh: SshConfig,

    /// Run-wide scheduling limits
    pub scheduler: SchedulerConfig,

    /// Where sources and runs are persisted
    pub store: StoreConfig,

    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CloudConfig {
    /// Provider identifier, e.g. `profitbricks`
    pub provider: String,
    pub endpoint: String,
    pub datacenter_id: String,
    pub username: String,
    pub password: String,
    pub request_timeout_seconds: u64,
    pub poll_interval_seconds: u64,
    pub poll_max_wait_seconds: u64,
    /// Size of the volume created from the template image
    pub bootstrap_volume_size_gib: u64,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            provider: String::new(),
            endpoint: "https://api.profitbricks.com/cloudapi/v4".to_string(),
            datacenter_id: String::new(),
            username: String::new(),
            password: String::new(),
            request_timeout_seconds: 60,
            poll_interval_seconds: system::DEFAULT_POLL_INTERVAL_SECONDS,
            poll_max_wait_seconds: system::DEFAULT_POLL_MAX_WAIT_SECONDS,
            bootstrap_volume_size_gib: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SshConfig {
    /// ssh client binary
    pub binary: String,
    /// Attempts per command when the connection itself fails
    pub connect_retries: u32,
    pub retry_backoff_seconds: u64,
    pub connect_timeout_seconds: u64,
    pub strict_host_key_checking: bool,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            binary: "ssh".to_string(),
            connect_retries: system::DEFAULT_SSH_CONNECT_RETRIES,
            retry_backoff_seconds: system::DEFAULT_SSH_RETRY_BACKOFF_SECONDS,
            connect_timeout_seconds: system::DEFAULT_SSH_CONNECT_TIMEOUT_SECONDS,
            strict_host_key_checking: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Upper bound applied to every run's `simultaneous_migrations`; accepts an
    /// integer or `{ max: N }`
    #[serde(deserialize_with = "deserialize_concurrency_limit")]
    pub max_simultaneous_migrations: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_simultaneous_migrations: 16,
        }
    }
}

impl SchedulerConfig {
    /// Admission limit for a run asking for `requested` concurrent migrations
    pub fn effective_limit(&self, requested: usize) -> usize {
        requested.clamp(1, self.max_simultaneous_migrations.max(1))
    }
}

/// Accepts both `max_simultaneous_migrations: 8` and `max_simultaneous_migrations: { max: 8 }`
fn deserialize_concurrency_limit<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    use serde_json::Value;

    let value: Value = Deserialize::deserialize(deserializer)?;

    let limit = match value {
        Value::Number(n) => n.as_u64(),
        // Environment overrides arrive as strings
        Value::String(s) => s.trim().parse().ok(),
        Value::Object(obj) => obj.get("max").and_then(Value::as_u64),
        _ => None,
    };

    limit
        .and_then(|limit| usize::try_from(limit).ok())
        .ok_or_else(|| {
            D::Error::custom("Concurrency limit must be a positive integer or an object with max")
        })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Root directory of the file store
    pub directory: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            directory: PathBuf::from("migrations"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive; defaults depend on the environment
    pub level: Option<String>,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl MigratorConfig {
    /// Reject settings that cannot work; provider settings are checked when the
    /// cloud adapter is built
    pub fn validate(&self) -> ConfigResult<()> {
        if self.cloud.poll_interval_seconds == 0 {
            return Err(ConfigurationError::invalid_value(
                "cloud.poll_interval_seconds",
                "0",
                "polling interval must be positive",
            ));
        }
        if self.cloud.poll_max_wait_seconds < self.cloud.poll_interval_seconds {
            return Err(ConfigurationError::invalid_value(
                "cloud.poll_max_wait_seconds",
                self.cloud.poll_max_wait_seconds.to_string(),
                "wait budget must cover at least one polling interval",
            ));
        }
        if self.ssh.connect_retries == 0 {
            return Err(ConfigurationError::invalid_value(
                "ssh.connect_retries",
                "0",
                "at least one connection attempt is required",
            ));
        }
        if self.ssh.binary.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field("binary", "ssh"));
        }
        if self.scheduler.max_simultaneous_migrations == 0 {
            return Err(ConfigurationError::invalid_value(
                "scheduler.max_simultaneous_migrations",
                "0",
                "at least one migration must be allowed to run",
            ));
        }
        if self.store.backend == StoreBackend::File && self.store.directory.as_os_str().is_empty() {
            return Err(ConfigurationError::missing_required_field("directory", "store"));
        }
        Ok(())
    }
}
