//! Error types for the document registry and hydration

use crate::document::DocumentId;
use structura::StructureError;
use thiserror::Error;
use uuid::Uuid;

/// Registry-specific errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("No document registered for node {uuid} in locale \"{locale}\"")]
    DocumentNotFound { uuid: Uuid, locale: String },

    #[error("Document {0} is not registered")]
    DocumentNotRegistered(DocumentId),

    #[error("A document is already registered for node {uuid} in locale \"{locale}\"")]
    AlreadyRegistered { uuid: Uuid, locale: String },

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Unknown document type: {0}")]
    UnknownDocumentType(String),

    #[error("Configuration error: {reason}")]
    Config { reason: String },

    #[error("Structure error: {0}")]
    Structure(#[from] StructureError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
