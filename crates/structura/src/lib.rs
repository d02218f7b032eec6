//! Structura resolves the structure metadata of content documents.
//!
//! A document type (e.g. "page") owns a set of structure types (content
//! templates such as "default" or "overview"). Their definitions live in
//! files under configured search paths and are loaded lazily, then cached
//! in memory and optionally on disk.

pub mod cache;
pub mod config;
pub mod error;
pub mod factory;
pub mod loader;
pub mod macros;
pub mod metadata;

// Re-export core types
pub use cache::{CacheKey, FileCache, MetadataCache, MetadataCacheBackend};
pub use config::{StructureConfig, StructurePath};
pub use error::{LoadError, Result, StructureError};
pub use factory::StructureMetadataFactory;
pub use loader::{MetadataLoader, XmlStructureLoader};
pub use metadata::{BlockType, PropertyDefinition, StructureBuilder, StructureMetadata, StructureType};

/// Get the library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
