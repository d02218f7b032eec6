//! Hydration configuration

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use structura::StructureConfig;

use crate::document::Behaviors;
use crate::error::{RegistryError, Result};
use crate::locale::WebspaceLocalizationFinder;

/// Everything a hydration pipeline needs besides its collaborators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HydrationConfig {
    /// Locale used when a node has no content in any locale
    pub default_locale: String,

    /// Capabilities of every known document type, keyed by node type
    #[serde(default)]
    pub document_types: BTreeMap<String, Behaviors>,

    /// Fallback chains per webspace
    #[serde(default)]
    pub localizations: WebspaceLocalizationFinder,

    /// Where structure definitions are found
    #[serde(default)]
    pub structures: StructureConfig,
}

impl HydrationConfig {
    pub fn new(default_locale: impl Into<String>) -> Self {
        Self {
            default_locale: default_locale.into(),
            document_types: BTreeMap::new(),
            localizations: WebspaceLocalizationFinder::new(),
            structures: StructureConfig::new(),
        }
    }

    pub fn with_document_type(mut self, document_type: impl Into<String>, behaviors: Behaviors) -> Self {
        self.document_types.insert(document_type.into(), behaviors);
        self
    }

    pub fn with_localizations(mut self, localizations: WebspaceLocalizationFinder) -> Self {
        self.localizations = localizations;
        self
    }

    pub fn with_structures(mut self, structures: StructureConfig) -> Self {
        self.structures = structures;
        self
    }

    /// Read the configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: HydrationConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_locale.is_empty() {
            return Err(RegistryError::Config {
                reason: "default locale must not be empty".to_string(),
            });
        }

        for (document_type, behaviors) in &self.document_types {
            if behaviors.structure && self.structures.paths_for(document_type).is_none() {
                return Err(RegistryError::Config {
                    reason: format!(
                        "structure document type \"{}\" has no structure paths",
                        document_type
                    ),
                });
            }
        }

        self.structures.validate()?;
        Ok(())
    }

    pub fn behaviors_for(&self, document_type: &str) -> Option<Behaviors> {
        self.document_types.get(document_type).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use structura::StructurePath;

    #[test]
    fn test_config_from_json() {
        let config: HydrationConfig = serde_json::from_str(
            r#"{
                "default_locale": "en",
                "document_types": {
                    "page": {"structure": true, "localized": true, "webspace": true},
                    "route": {}
                },
                "localizations": {"sulu_io": {"de_at": ["de"]}},
                "structures": {
                    "paths": {"page": [{"type": "page", "path": "config/templates/pages"}]},
                    "default_types": {"page": "default"}
                }
            }"#,
        )
        .unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.behaviors_for("page"), Some(Behaviors::page()));
        assert_eq!(config.behaviors_for("route"), Some(Behaviors::default()));
        assert_eq!(config.behaviors_for("article"), None);
        assert_eq!(config.localizations.fallbacks("sulu_io", "de_at"), ["de".to_string()]);
    }

    #[test]
    fn test_structure_type_without_paths_is_rejected() {
        let config = HydrationConfig::new("en").with_document_type("page", Behaviors::page());
        assert!(matches!(config.validate(), Err(RegistryError::Config { .. })));

        let config = config.with_structures(
            StructureConfig::new().with_path("page", StructurePath::new("page", "templates/pages")),
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_default_locale_is_rejected() {
        assert!(HydrationConfig::new("").validate().is_err());
    }
}
