//! Error handling for the inspect tool

use structura::StructureError;
use structura_registry::RegistryError;
use thiserror::Error;

/// Result type for inspect commands
pub type Result<T> = std::result::Result<T, InspectError>;

#[derive(Debug, Error)]
pub enum InspectError {
    #[error("Structure error: {0}")]
    Structure(#[from] StructureError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl InspectError {
    pub fn config(msg: &str) -> Self {
        Self::Config(msg.to_string())
    }
}
