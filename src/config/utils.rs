//! Configuration loading and validation
//!
//! Configuration is read once at startup from a TOML file. A missing file
//! is not an error: every section falls back to its defaults.

use super::schemas::{Config, CovalentConfig, DexScreenerConfig, ReportConfig, RetrievalConfig};
use crate::errors::ScanError;
use crate::transactions::TimeWindow;
use chrono::Utc;
use crate::logger::{self, LogTag};
use std::path::Path;

/// Default configuration file path
pub const CONFIG_FILE_PATH: &str = "data/config.toml";

/// Environment variable consulted when `covalent.api_key` is empty
pub const API_KEY_ENV: &str = "COVALENT_API_KEY";

/// Load configuration from the default path
pub fn load_config() -> Result<Config, ScanError> {
    load_config_from_path(CONFIG_FILE_PATH)
}

/// Load configuration from a specific TOML file
///
/// # Returns
/// - `Ok(Config)` - parsed file, or defaults when the file does not exist
/// - `Err(ScanError::Config)` - unreadable file, bad TOML or invalid values
pub fn load_config_from_path(path: impl AsRef<Path>) -> Result<Config, ScanError> {
    let path = path.as_ref();

    let config = if path.exists() {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ScanError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let parse_error = |e: toml::de::Error| {
            ScanError::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        };
        let value: toml::Value = toml::from_str(&contents).map_err(parse_error)?;

        for key in unknown_keys(&value) {
            logger::warning(
                LogTag::Config,
                &format!("Unknown key '{}' in {} (ignored)", key, path.display()),
            );
        }

        value.try_into::<Config>().map_err(parse_error)?
    } else {
        logger::debug(
            LogTag::Config,
            &format!("Config file '{}' not found, using defaults", path.display()),
        );
        Config::default()
    };

    validate(&config)?;
    Ok(config)
}

/// Dotted paths of keys no config section declares
pub fn unknown_keys(value: &toml::Value) -> Vec<String> {
    let mut unknown = Vec::new();
    let Some(root) = value.as_table() else {
        return unknown;
    };

    for (section, body) in root {
        let fields = match section.as_str() {
            "covalent" => CovalentConfig::FIELDS,
            "dexscreener" => DexScreenerConfig::FIELDS,
            "retrieval" => RetrievalConfig::FIELDS,
            "report" => ReportConfig::FIELDS,
            _ => {
                unknown.push(section.clone());
                continue;
            }
        };

        if let Some(table) = body.as_table() {
            unknown.extend(
                table
                    .keys()
                    .filter(|key| !fields.contains(&key.as_str()))
                    .map(|key| format!("{}.{}", section, key)),
            );
        }
    }

    unknown
}

/// Fill values that may come from the environment
pub fn apply_env_overrides(config: &mut Config) {
    if config.covalent.api_key.trim().is_empty() {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            config.covalent.api_key = key;
        }
    }
}

/// Reject values the pipeline cannot work with
pub fn validate(config: &Config) -> Result<(), ScanError> {
    if config.retrieval.window_days <= 0 {
        return Err(ScanError::Config(format!(
            "retrieval.window_days must be positive, got {}",
            config.retrieval.window_days
        )));
    }
    TimeWindow::trailing(Utc::now(), config.retrieval.window_days)?;

    if config.retrieval.channel_capacity == 0 {
        return Err(ScanError::Config(
            "retrieval.channel_capacity must be greater than zero".to_string(),
        ));
    }

    if config.dexscreener.timeout_secs == 0 {
        return Err(ScanError::Config(
            "dexscreener.timeout_secs must be greater than zero".to_string(),
        ));
    }

    for (field, url) in [
        ("covalent.base_url", &config.covalent.base_url),
        ("dexscreener.base_url", &config.dexscreener.base_url),
    ] {
        url::Url::parse(url)
            .map_err(|e| ScanError::Config(format!("Invalid {} '{}': {}", field, url, e)))?;
    }

    Ok(())
}
