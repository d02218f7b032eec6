//! Configuration from the environment

use std::path::PathBuf;

use structura_registry::HydrationConfig;
use tracing::debug;

use crate::error::{InspectError, Result};

const DEFAULT_CONFIG_PATH: &str = "structura.json";

/// Where the hydration configuration comes from and what overrides it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectConfig {
    /// JSON file with the hydration configuration
    pub config_path: PathBuf,

    /// Replaces the configured default locale
    pub default_locale: Option<String>,

    /// Replaces the configured metadata cache directory
    pub cache_dir: Option<PathBuf>,
}

impl InspectConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let default_locale = var("STRUCTURA_DEFAULT_LOCALE");
        if default_locale.as_deref().is_some_and(|locale| locale.trim().is_empty()) {
            return Err(InspectError::config("Invalid STRUCTURA_DEFAULT_LOCALE value"));
        }

        Ok(Self {
            config_path: var("STRUCTURA_CONFIG")
                .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
                .into(),
            default_locale,
            cache_dir: var("STRUCTURA_CACHE_DIR")
                .filter(|dir| !dir.is_empty())
                .map(PathBuf::from),
        })
    }

    /// Apply command-line overrides
    pub fn with_overrides(
        mut self,
        config_path: Option<PathBuf>,
        default_locale: Option<String>,
        cache_dir: Option<PathBuf>,
    ) -> Self {
        if let Some(config_path) = config_path {
            self.config_path = config_path;
        }
        if default_locale.is_some() {
            self.default_locale = default_locale;
        }
        if cache_dir.is_some() {
            self.cache_dir = cache_dir;
        }
        self
    }

    /// Read the hydration configuration file and apply the overrides
    pub fn load(&self) -> Result<HydrationConfig> {
        debug!("Loading configuration from {}", self.config_path.display());

        let mut config = HydrationConfig::from_file(&self.config_path)?;
        if let Some(default_locale) = &self.default_locale {
            config.default_locale = default_locale.clone();
        }
        if let Some(cache_dir) = &self.cache_dir {
            config.structures.cache_dir = Some(cache_dir.clone());
        }
        config.validate()?;
        Ok(config)
    }
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            default_locale: None,
            cache_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = InspectConfig::from_vars(vars(&[])).unwrap();
        assert_eq!(config, InspectConfig::default());
    }

    #[test]
    fn test_from_vars() {
        let config = InspectConfig::from_vars(vars(&[
            ("STRUCTURA_CONFIG", "/etc/structura.json"),
            ("STRUCTURA_DEFAULT_LOCALE", "de"),
            ("STRUCTURA_CACHE_DIR", "/var/cache/structura"),
        ]))
        .unwrap();

        assert_eq!(config.config_path, PathBuf::from("/etc/structura.json"));
        assert_eq!(config.default_locale.as_deref(), Some("de"));
        assert_eq!(config.cache_dir, Some(PathBuf::from("/var/cache/structura")));
    }

    #[test]
    fn test_blank_locale_is_rejected() {
        let result = InspectConfig::from_vars(vars(&[("STRUCTURA_DEFAULT_LOCALE", " ")]));
        assert!(matches!(result, Err(InspectError::Config(_))));
    }

    #[test]
    fn test_overrides() {
        let config = InspectConfig::default().with_overrides(
            Some(PathBuf::from("site.json")),
            None,
            Some(PathBuf::from("cache")),
        );

        assert_eq!(config.config_path, PathBuf::from("site.json"));
        assert_eq!(config.default_locale, None);
        assert_eq!(config.cache_dir, Some(PathBuf::from("cache")));
    }

    #[test]
    fn test_load_applies_overrides() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("structura.json");
        std::fs::write(&path, r#"{"default_locale": "en"}"#).unwrap();

        let config = InspectConfig::default()
            .with_overrides(Some(path), Some("fr".to_string()), Some(temp_dir.path().join("cache")))
            .load()
            .unwrap();

        assert_eq!(config.default_locale, "fr");
        assert_eq!(config.structures.cache_dir, Some(temp_dir.path().join("cache")));
    }
}
