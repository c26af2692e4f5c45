//! Configuration resolution for bookdash-api
//!
//! Priority per setting: CLI flag (env-backed via clap) → TOML config file →
//! compiled default. The TOML file is optional; a missing file is only an
//! error when it was named explicitly.

use bookdash_common::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default database file, relative to the working directory
const DEFAULT_DATABASE: &str = "bookdash.db";

/// Default HTTP bind address
const DEFAULT_BIND: &str = "127.0.0.1:5780";

/// Config file consulted when no --config flag is given
const DEFAULT_CONFIG_FILE: &str = "bookdash.toml";

/// Optional settings from the TOML config file
#[derive(Debug, Default, Deserialize)]
pub struct TomlConfig {
    pub database: Option<PathBuf>,
    pub bind: Option<String>,
    pub api_key: Option<String>,
    pub google_books_url: Option<String>,
}

/// CLI/env values that take priority over the TOML file
#[derive(Debug, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub bind: Option<String>,
    pub api_key: Option<String>,
    pub google_books_url: Option<String>,
}

/// Resolved runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database: PathBuf,
    pub bind: String,
    /// When set, protected endpoints require a matching X-API-Key header;
    /// unset disables auth (development mode)
    pub api_key: Option<String>,
    /// Alternate Google Books endpoint (tests, proxies)
    pub google_books_url: Option<String>,
}

impl Config {
    /// Resolve configuration from overrides, the TOML file, and defaults
    pub fn resolve(overrides: ConfigOverrides) -> Result<Config> {
        let toml_config = match &overrides.config_file {
            Some(path) => load_toml_config(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    load_toml_config(default)?
                } else {
                    TomlConfig::default()
                }
            }
        };

        let config = Config {
            database: overrides
                .database
                .or(toml_config.database)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE)),
            bind: overrides
                .bind
                .or(toml_config.bind)
                .unwrap_or_else(|| DEFAULT_BIND.to_string()),
            api_key: overrides.api_key.or(toml_config.api_key),
            google_books_url: overrides.google_books_url.or(toml_config.google_books_url),
        };

        info!("Database: {}", config.database.display());
        if config.api_key.is_none() {
            info!("API authentication disabled (no API key configured)");
        }

        Ok(config)
    }
}

/// Load and parse a TOML config file
fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("cannot parse {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_apply_without_file() {
        let config = Config::resolve(ConfigOverrides::default()).unwrap();
        assert_eq!(config.database, PathBuf::from(DEFAULT_DATABASE));
        assert_eq!(config.bind, DEFAULT_BIND);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_overrides_beat_toml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "database = \"from-toml.db\"\nbind = \"0.0.0.0:9999\"\napi_key = \"toml-key\""
        )
        .unwrap();
        file.flush().unwrap();

        let overrides = ConfigOverrides {
            config_file: Some(file.path().to_path_buf()),
            database: Some(PathBuf::from("from-cli.db")),
            ..Default::default()
        };
        let config = Config::resolve(overrides).unwrap();
        assert_eq!(config.database, PathBuf::from("from-cli.db"));
        assert_eq!(config.bind, "0.0.0.0:9999");
        assert_eq!(config.api_key.as_deref(), Some("toml-key"));
    }

    #[test]
    fn test_named_missing_config_file_errors() {
        let overrides = ConfigOverrides {
            config_file: Some(PathBuf::from("/nonexistent/bookdash.toml")),
            ..Default::default()
        };
        assert!(Config::resolve(overrides).is_err());
    }
}
