//! Configuration Loader
//!
//! Environment-aware loading: base YAML file, per-environment YAML override
//! and `MIGRATOR__*` environment variables, merged with the `config` crate.

use super::error::{ConfigResult, ConfigurationError};
use super::MigratorConfig;
use config::{Config, Environment, File, FileFormat};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Prefix of environment variable overrides (`MIGRATOR__CLOUD__PROVIDER`)
const ENV_PREFIX: &str = "MIGRATOR";
const ENV_SEPARATOR: &str = "__";
const BASE_FILE_NAMES: [&str; 2] = ["migrator.yaml", "migrator.yml"];

/// Loaded, validated configuration plus where it came from
#[derive(Debug)]
pub struct ConfigManager {
    config: MigratorConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment.
    /// Process environment variables still apply.
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        Self::load_with_overrides(config_dir, environment, None)
    }

    /// Load with an explicit set of override variables instead of the process environment
    pub fn load_with_overrides(
        config_dir: Option<PathBuf>,
        environment: &str,
        overrides: Option<HashMap<String, String>>,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(|| PathBuf::from("config"));

        debug!(
            "Loading configuration for environment '{}' from directory: {}",
            environment,
            config_directory.display()
        );

        let config = Self::load_and_merge_config(&config_directory, environment, overrides)?;
        config.validate()?;

        debug!(
            "Configuration loaded successfully: {}",
            serde_json::to_string_pretty(&Self::sanitize_config_for_logging(&config))
                .unwrap_or_else(|_| "[serialization error]".to_string())
        );
        info!(
            environment = environment,
            provider = %config.cloud.provider,
            store = ?config.store.backend,
            "🔧 CONFIG: Configuration loaded"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    /// Wrap an already-built configuration, validating it first
    pub fn from_config(config: MigratorConfig, environment: &str) -> ConfigResult<Arc<ConfigManager>> {
        config.validate()?;
        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory: PathBuf::from("config"),
        }))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &MigratorConfig {
        &self.config
    }

    /// Get the current environment
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Get the configuration directory
    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    /// Configuration as JSON with credentials masked, for debugging output
    pub fn debug_config(&self) -> serde_json::Value {
        Self::sanitize_config_for_logging(&self.config)
    }

    /// Detect current environment: MIGRATOR_ENV || APP_ENV || 'development'
    pub fn detect_environment() -> String {
        env::var("MIGRATOR_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
    }

    fn find_config_file(config_directory: &Path) -> ConfigResult<PathBuf> {
        let mut searched_paths = Vec::new();
        for name in BASE_FILE_NAMES {
            let config_path = config_directory.join(name);
            searched_paths.push(config_path.clone());
            if config_path.is_file() {
                debug!("Found configuration file: {}", config_path.display());
                return Ok(config_path);
            }
        }
        Err(ConfigurationError::config_file_not_found(searched_paths))
    }

    fn load_and_merge_config(
        config_directory: &Path,
        environment: &str,
        overrides: Option<HashMap<String, String>>,
    ) -> ConfigResult<MigratorConfig> {
        let base_file = Self::find_config_file(config_directory)?;
        let environment_file = config_directory
            .join("environments")
            .join(format!("{environment}.yaml"));

        if environment_file.is_file() {
            debug!(
                "Applying environment-specific overrides for: {}",
                environment
            );
        }

        let settings = Config::builder()
            .add_source(File::from(base_file).format(FileFormat::Yaml))
            .add_source(
                File::from(environment_file)
                    .format(FileFormat::Yaml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true)
                    .source(overrides),
            )
            .build()?;

        Ok(settings.try_deserialize::<MigratorConfig>()?)
    }

    /// Mask credentials so the configuration can be logged
    fn sanitize_config_for_logging(config: &MigratorConfig) -> serde_json::Value {
        let mut config_json = serde_json::json!(config);
        let sensitive_patterns = ["password", "secret", "key", "token", "credential"];
        Self::sanitize_json_recursive(&mut config_json, &sensitive_patterns);
        config_json
    }

    fn sanitize_json_recursive(value: &mut serde_json::Value, sensitive_patterns: &[&str]) {
        match value {
            serde_json::Value::Object(map) => {
                for (key, val) in map.iter_mut() {
                    let key_lower = key.to_lowercase();
                    let is_sensitive = sensitive_patterns
                        .iter()
                        .any(|pattern| key_lower.contains(pattern));

                    if !is_sensitive {
                        Self::sanitize_json_recursive(val, sensitive_patterns);
                        continue;
                    }

                    let masked = match &*val {
                        serde_json::Value::String(s) if s.is_empty() => {
                            serde_json::Value::String("[EMPTY]".to_string())
                        }
                        serde_json::Value::String(s) if s.chars().count() > 4 => {
                            let chars: Vec<char> = s.chars().collect();
                            let head: String = chars[..2].iter().collect();
                            let tail: String = chars[chars.len() - 2..].iter().collect();
                            serde_json::Value::String(format!("[MASKED: {head}***{tail}]"))
                        }
                        _ => serde_json::Value::String("[MASKED]".to_string()),
                    };
                    *val = masked;
                }
            }
            serde_json::Value::Array(arr) => {
                for item in arr.iter_mut() {
                    Self::sanitize_json_recursive(item, sensitive_patterns);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_masks_credentials() {
        let mut config = MigratorConfig::default();
        config.cloud.password = "hunter22".to_string();
        config.cloud.username = "ops".to_string();

        let sanitized = ConfigManager::sanitize_config_for_logging(&config);
        assert_eq!(sanitized["cloud"]["password"], "[MASKED: hu***22]");
        assert_eq!(sanitized["cloud"]["username"], "ops");
    }

    #[test]
    fn test_missing_base_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConfigManager::load_with_overrides(
            Some(dir.path().to_path_buf()),
            "test",
            Some(HashMap::new()),
        );
        assert!(matches!(
            result,
            Err(ConfigurationError::ConfigFileNotFound { searched_paths }) if searched_paths.len() == 2
        ));
    }
}
