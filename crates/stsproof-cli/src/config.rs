//! Configuration loading from file and environment variables.

use serde::Deserialize;
use stsproof_aws::StsConfig;
use thiserror::Error;

/// Default configuration file name.
pub const DEFAULT_CONFIG_PATH: &str = "stsproof.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Identity-provider settings.
    #[serde(default)]
    pub sts: StsConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "stsproof_core=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `STSPROOF_ENDPOINT` overrides `sts.endpoint`
/// - `STSPROOF_REGION` overrides `sts.region`
/// - `STSPROOF_TIMEOUT_SECS` overrides `sts.timeout_secs`
/// - `STSPROOF_LOG_LEVEL` overrides `logging.level`
/// - `STSPROOF_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let config = read_config_file(path)?;
    Ok(apply_overrides(config, |name| std::env::var(name).ok()))
}

fn read_config_file(path: Option<&str>) -> Result<Config, ConfigError> {
    match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => Ok(toml::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = p, "config file not found, using defaults");
                Ok(Config::default())
            }
            Err(e) => Err(ConfigError::FileRead(e)),
        },
        None => Ok(Config::default()),
    }
}

/// Applies `STSPROOF_*` overrides read through `lookup`.
///
/// Unparseable numeric values are ignored.
pub fn apply_overrides<F>(mut config: Config, lookup: F) -> Config
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(endpoint) = lookup("STSPROOF_ENDPOINT") {
        config.sts.endpoint = endpoint;
    }
    if let Some(region) = lookup("STSPROOF_REGION") {
        config.sts.region = region;
    }
    if let Some(timeout) = lookup("STSPROOF_TIMEOUT_SECS") {
        if let Ok(parsed) = timeout.parse() {
            config.sts.timeout_secs = parsed;
        }
    }
    if let Some(level) = lookup("STSPROOF_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("STSPROOF_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    config
}
