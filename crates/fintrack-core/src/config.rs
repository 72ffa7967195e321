//! Application configuration
//!
//! Config is loaded with a two-layer resolution:
//! 1. Explicit path, or the override in the data dir
//!    (~/.local/share/fintrack/config.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Every key is optional; anything missing keeps its `Default` value.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/fintrack.toml");

/// Environment variable for database encryption key
pub const DB_KEY_ENV: &str = "FINTRACK_DB_KEY";

/// CSV import settings
#[derive(Debug, Clone, PartialEq)]
pub struct ImportConfig {
    pub batch_size: usize,
    pub max_row_errors: usize,
    pub max_upload_bytes: usize,
    pub default_category_id: i64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            max_row_errors: 100,
            max_upload_bytes: 5 * 1024 * 1024,
            default_category_id: 1,
        }
    }
}

/// Exchange-rate settings
#[derive(Debug, Clone, PartialEq)]
pub struct RatesConfig {
    pub api_url: String,
    pub cache_ttl: Duration,
    pub timeout: Duration,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.exchangerate-api.com/v4/latest".to_string(),
            cache_ttl: Duration::from_secs(12 * 60 * 60),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Login throttling settings
#[derive(Debug, Clone, PartialEq)]
pub struct AuthConfig {
    pub max_login_attempts: u32,
    pub lockout: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            max_login_attempts: 5,
            lockout: Duration::from_secs(15 * 60),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub import: ImportConfig,
    pub rates: RatesConfig,
    pub auth: AuthConfig,
}

impl Config {
    /// Load from an explicit path, the data-dir override, or the embedded defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let override_path = path.map(Path::to_path_buf).or_else(default_config_path);

        let content = match override_path {
            Some(p) if p.exists() => {
                debug!("Loading config from {}", p.display());
                fs::read_to_string(&p).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", p.display(), e))
                })?
            }
            Some(p) if path.is_some() => {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            _ => DEFAULT_CONFIG.to_string(),
        };

        parse_config(&content)
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("fintrack").join("config.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    import: Option<RawImport>,
    rates: Option<RawRates>,
    auth: Option<RawAuth>,
}

#[derive(Debug, Deserialize)]
struct RawImport {
    batch_size: Option<usize>,
    max_row_errors: Option<usize>,
    max_upload_bytes: Option<usize>,
    default_category_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawRates {
    api_url: Option<String>,
    cache_hours: Option<u64>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawAuth {
    max_login_attempts: Option<u32>,
    lockout_minutes: Option<u64>,
}

/// Parse config from TOML content
pub fn parse_config(content: &str) -> Result<Config> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = Config::default();

    if let Some(import) = raw.import {
        if let Some(size) = import.batch_size {
            if size == 0 {
                return Err(Error::Config("import.batch_size must be at least 1".into()));
            }
            config.import.batch_size = size;
        }
        if let Some(max) = import.max_row_errors {
            config.import.max_row_errors = max;
        }
        if let Some(max) = import.max_upload_bytes {
            config.import.max_upload_bytes = max;
        }
        if let Some(id) = import.default_category_id {
            config.import.default_category_id = id;
        }
    }

    if let Some(rates) = raw.rates {
        if let Some(url) = rates.api_url {
            config.rates.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(hours) = rates.cache_hours {
            config.rates.cache_ttl = Duration::from_secs(hours * 60 * 60);
        }
        if let Some(secs) = rates.timeout_secs {
            config.rates.timeout = Duration::from_secs(secs);
        }
    }

    if let Some(auth) = raw.auth {
        if let Some(max) = auth.max_login_attempts {
            config.auth.max_login_attempts = max;
        }
        if let Some(minutes) = auth.lockout_minutes {
            config.auth.lockout = Duration::from_secs(minutes * 60);
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_config_matches_defaults() {
        let config = parse_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = parse_config(
            r#"
            [import]
            batch_size = 25

            [rates]
            cache_hours = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.import.batch_size, 25);
        assert_eq!(config.import.max_row_errors, 100);
        assert_eq!(config.rates.cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.auth, AuthConfig::default());
    }

    #[test]
    fn test_empty_config() {
        assert_eq!(parse_config("").unwrap(), Config::default());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let err = parse_config("[import]\nbatch_size = 0\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(parse_config("[import\nbatch_size = ").is_err());
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        fs::write(&path, "[auth]\nmax_login_attempts = 3\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.auth.max_login_attempts, 3);
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
