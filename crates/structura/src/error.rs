//! Error types for structure metadata resolution
//!
//! Every failure carries the context needed to diagnose it: the requested
//! key, the searched paths or the document types that are mapped.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for metadata resolution
#[derive(Error, Debug)]
pub enum StructureError {
    /// No search paths are configured for the document type
    #[error(
        "Structure path for document type \"{document_type}\" is not mapped. Mapped structure types: {}",
        quoted(.mapped_types)
    )]
    DocumentTypeNotFound {
        document_type: String,
        mapped_types: Vec<String>,
    },

    /// None of the search paths contains a definition for the structure type
    #[error(
        "Could not load structure type \"{structure_type}\" for document type \"{document_type}\", looked in {}",
        quoted_paths(.searched_paths)
    )]
    StructureTypeNotFound {
        document_type: String,
        structure_type: String,
        searched_paths: Vec<PathBuf>,
    },

    /// No structure type was requested and the document type has no default
    #[error("No structure type given and no default structure type configured for document type \"{document_type}\"")]
    NoDefaultStructureType { document_type: String },

    /// The metadata loader failed
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// The cache table could not be accessed
    #[error("Cache error: {reason}")]
    Cache { reason: String },

    /// Invalid structure configuration
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure reported by a [`MetadataLoader`](crate::loader::MetadataLoader)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to load structure from {}: {reason}", .path.display())]
pub struct LoadError {
    pub path: PathBuf,
    pub reason: String,
}

impl LoadError {
    pub fn new(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Self {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Shorthand result type for metadata operations
pub type Result<T> = std::result::Result<T, StructureError>;

fn quoted(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("\"{}\"", item))
        .collect::<Vec<_>>()
        .join(", ")
}

fn quoted_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|path| format!("\"{}\"", path.display()))
        .collect::<Vec<_>>()
        .join(", ")
}

impl StructureError {
    /// Whether the error was caused by a missing mapping or definition
    /// rather than a broken source or cache
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StructureError::DocumentTypeNotFound { .. }
                | StructureError::StructureTypeNotFound { .. }
                | StructureError::NoDefaultStructureType { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_type_not_found_lists_mapped_types() {
        let error = StructureError::DocumentTypeNotFound {
            document_type: "non_existing".to_string(),
            mapped_types: vec!["page".to_string(), "snoopet".to_string()],
        };

        assert_eq!(
            error.to_string(),
            "Structure path for document type \"non_existing\" is not mapped. Mapped structure types: \"page\", \"snoopet\""
        );
        assert!(error.is_not_found());
    }

    #[test]
    fn test_structure_type_not_found_lists_paths() {
        let error = StructureError::StructureTypeNotFound {
            document_type: "page".to_string(),
            structure_type: "overview".to_string(),
            searched_paths: vec![PathBuf::from("/data/page"), PathBuf::from("/data/other")],
        };

        assert!(error.to_string().starts_with(
            "Could not load structure type \"overview\" for document type \"page\", looked in \"/data/page\""
        ));
    }

    #[test]
    fn test_load_error_is_not_a_lookup_miss() {
        let error: StructureError = LoadError::new("/data/page/default.xml", "unexpected EOF").into();
        assert!(!error.is_not_found());
        assert!(error.to_string().contains("unexpected EOF"));
    }
}
