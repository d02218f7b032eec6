//! # Structura Registry
//!
//! Maps repository nodes to typed, per-locale documents:
//! - Documents with optional structure and webspace capabilities
//! - A registry keeping exactly one document per node and locale
//! - Locale fallback for ghost content
//! - A staged hydration pipeline filling documents from nodes
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use structura::{StructureMetadataFactory, XmlStructureLoader};
//! use structura_registry::*;
//!
//! # fn example() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let config = HydrationConfig::from_file("structura.json")?;
//! let session = MemorySession::from_json(&std::fs::read_to_string("nodes.json")?)?;
//! let factory = StructureMetadataFactory::new(XmlStructureLoader::new(), config.structures.clone());
//!
//! let pipeline = HydrationPipeline::from_config(Arc::new(session), Arc::new(factory), &config);
//! let mut registry = DocumentRegistry::new(config.default_locale.clone());
//!
//! let document = pipeline.hydrate(
//!     &mut registry,
//!     "/cmf/sulu_io/contents/about",
//!     Some("de"),
//!     HydrateOptions::default(),
//! )?;
//! println!("{}", document.to_json()?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod document;
pub mod encoding;
pub mod error;
pub mod hydrate;
pub mod locale;
pub mod node;
pub mod registry;

pub use config::HydrationConfig;
pub use document::{Behaviors, Document, DocumentHandle, DocumentId, Structure, StructureProperty};
pub use error::{RegistryError, Result};
pub use hydrate::{HydrateEvent, HydrateOptions, HydrationPipeline, Stage};
pub use locale::{
    LocaleFallbackResolver, LocalizationFinder, NoLocalizationFinder, WebspaceLocalizationFinder,
};
pub use node::{MemorySession, Node, RepositorySession};
pub use registry::DocumentRegistry;
