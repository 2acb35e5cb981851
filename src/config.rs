//! Loading application configuration from TOML.
//!
//! Lookup order: an explicit path, then `LEARNSPHERE_CONFIG`, then built-in
//! defaults. Every field is optional.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::ConfigError;

pub const CONFIG_ENV: &str = "LEARNSPHERE_CONFIG";

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub database_path: PathBuf,
    pub study: StudyLimits,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("learnsphere.sqlite3"),
            study: StudyLimits::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Caps on how many cards a due query hands out.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct StudyLimits {
    pub new_cards_per_day: u32,
    pub reviews_per_day: u32,
}

impl Default for StudyLimits {
    fn default() -> Self {
        Self {
            new_cards_per_day: 20,
            reviews_per_day: 100,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, e.g. "info" or "warn,learnsphere_review=debug".
    pub level: String,
    /// "pretty" or "json".
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "loaded config (TOML)");
        Ok(config)
    }

    /// Resolves the configuration for this run.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.database_path, PathBuf::from("learnsphere.sqlite3"));
        assert_eq!(config.study.new_cards_per_day, 20);
        assert_eq!(config.study.reviews_per_day, 100);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("learnsphere.toml");
        std::fs::write(
            &path,
            r#"
database_path = "/tmp/cards.sqlite3"

[study]
reviews_per_day = 50
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/cards.sqlite3"));
        assert_eq!(config.study.reviews_per_day, 50);
        assert_eq!(config.study.new_cards_per_day, 20);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[study]\nreviews_per_day = \"lots\"\n").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
