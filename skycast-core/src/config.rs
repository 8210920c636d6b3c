use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{error::WeatherError, provider::ApiTier};

/// Overall bound on one acquisition when the config does not set one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// A saved coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// api_tier = "onecall3.0"
/// language = "pt-BR"
/// timeout_secs = 15
///
/// [location]
/// latitude = 33.749
/// longitude = -84.388
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub api_key: Option<String>,

    /// Tier last probed for `api_key`. Cleared whenever the key changes.
    pub api_tier: Option<String>,

    /// Locale sent upstream as the provider language, e.g. "de" or "zh-TW".
    pub language: Option<String>,

    pub timeout_secs: Option<u64>,

    /// Provider base URL override, mainly for testing against a mock server.
    pub base_url: Option<String>,

    pub location: Option<Location>,
}

impl Config {
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.is_empty())
    }

    /// Store a credential. A different key invalidates the cached tier.
    pub fn set_api_key(&mut self, api_key: String) {
        if self.api_key.as_deref() != Some(api_key.as_str()) {
            self.api_tier = None;
        }
        self.api_key = Some(api_key);
    }

    /// The cached tier as a strongly-typed [`ApiTier`], if one was stored.
    pub fn api_tier(&self) -> Result<Option<ApiTier>, WeatherError> {
        self.api_tier
            .as_deref()
            .map(ApiTier::try_from)
            .transpose()
    }

    pub fn set_api_tier(&mut self, tier: ApiTier) {
        self.api_tier = Some(tier.as_str().to_string());
    }

    pub fn language(&self) -> &str {
        self.language.as_deref().unwrap_or_default()
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    pub fn is_configured(&self) -> bool {
        self.api_key().is_some()
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "skycast", "skycast")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn empty_config_is_not_configured() {
        let cfg = Config::default();
        assert!(!cfg.is_configured());
        assert_eq!(cfg.api_tier().unwrap(), None);
        assert_eq!(cfg.timeout_secs(), DEFAULT_TIMEOUT_SECS);
        assert_eq!(cfg.language(), "");
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let mut cfg = Config::default();
        cfg.set_api_key(String::new());
        assert!(!cfg.is_configured());
    }

    #[test]
    fn changing_key_clears_cached_tier() {
        let mut cfg = Config::default();

        cfg.set_api_key("OLD_KEY".into());
        cfg.set_api_tier(ApiTier::OneCall30);
        assert_eq!(cfg.api_tier().unwrap(), Some(ApiTier::OneCall30));

        cfg.set_api_key("NEW_KEY".into());
        assert_eq!(cfg.api_tier().unwrap(), None);
        assert_eq!(cfg.api_key(), Some("NEW_KEY"));
    }

    #[test]
    fn same_key_keeps_cached_tier() {
        let mut cfg = Config::default();

        cfg.set_api_key("KEY".into());
        cfg.set_api_tier(ApiTier::OneCall25);
        cfg.set_api_key("KEY".into());

        assert_eq!(cfg.api_tier().unwrap(), Some(ApiTier::OneCall25));
    }

    #[test]
    fn unknown_stored_tier_is_a_configuration_error() {
        let cfg = Config {
            api_tier: Some("onecall1.0".into()),
            ..Config::default()
        };

        let err = cfg.api_tier().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());
        cfg.set_api_tier(ApiTier::OneCall30);
        cfg.language = Some("pt-BR".into());
        cfg.location = Some(Location {
            latitude: 33.749,
            longitude: -84.388,
        });

        cfg.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();

        assert_eq!(loaded, cfg);
    }

    #[test]
    fn load_missing_file_returns_default() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn load_reports_parse_errors_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "api_key = [").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
