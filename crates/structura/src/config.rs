//! Structure type configuration
//!
//! Maps every document type to the directories its structure definitions
//! are searched in, and to the structure type used when none is requested.

use crate::error::{Result, StructureError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One search location for a document type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StructurePath {
    /// Alias handed to the loader together with files found here
    #[serde(rename = "type")]
    pub type_alias: String,

    /// Directory containing the structure definitions
    pub path: PathBuf,
}

impl StructurePath {
    pub fn new(type_alias: impl Into<String>, path: impl AsRef<Path>) -> Self {
        Self {
            type_alias: type_alias.into(),
            path: path.as_ref().to_path_buf(),
        }
    }
}

/// Static structure configuration, loaded once at startup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StructureConfig {
    /// Document type to ordered search paths
    #[serde(default)]
    pub paths: BTreeMap<String, Vec<StructurePath>>,

    /// Document type to default structure type
    #[serde(default)]
    pub default_types: BTreeMap<String, String>,

    /// File extension of structure definitions
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Directory of the on-disk metadata cache
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

fn default_extension() -> String {
    "xml".to_string()
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            paths: BTreeMap::new(),
            default_types: BTreeMap::new(),
            extension: default_extension(),
            cache_dir: None,
        }
    }
}

impl StructureConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a search path for a document type
    pub fn with_path(mut self, document_type: impl Into<String>, path: StructurePath) -> Self {
        self.paths.entry(document_type.into()).or_default().push(path);
        self
    }

    pub fn with_default_type(
        mut self,
        document_type: impl Into<String>,
        structure_type: impl Into<String>,
    ) -> Self {
        self.default_types
            .insert(document_type.into(), structure_type.into());
        self
    }

    pub fn with_cache_dir(mut self, cache_dir: impl AsRef<Path>) -> Self {
        self.cache_dir = Some(cache_dir.as_ref().to_path_buf());
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Read the configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: StructureConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that can never resolve a structure
    pub fn validate(&self) -> Result<()> {
        if self.extension.is_empty() || self.extension.starts_with('.') {
            return Err(StructureError::Config {
                reason: format!("invalid structure file extension \"{}\"", self.extension),
            });
        }

        for (document_type, paths) in &self.paths {
            if paths.is_empty() {
                return Err(StructureError::Config {
                    reason: format!("document type \"{}\" has no search paths", document_type),
                });
            }
        }

        Ok(())
    }

    /// Search paths configured for a document type, in search order
    pub fn paths_for(&self, document_type: &str) -> Option<&[StructurePath]> {
        self.paths
            .get(document_type)
            .map(Vec::as_slice)
            .filter(|paths| !paths.is_empty())
    }

    pub fn default_type_for(&self, document_type: &str) -> Option<&str> {
        self.default_types.get(document_type).map(String::as_str)
    }

    /// All mapped document types, sorted
    pub fn document_types(&self) -> Vec<String> {
        self.paths.keys().cloned().collect()
    }
}
