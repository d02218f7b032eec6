//! Hydration pipeline
//!
//! Turns a repository node into a registered, populated document by passing
//! a [`HydrateEvent`] through a fixed sequence of [`Stage`]s.

use std::collections::BTreeMap;
use std::ops::ControlFlow;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use structura::{MetadataLoader, StructureMetadata, StructureMetadataFactory};
use tracing::debug;

use crate::config::HydrationConfig;
use crate::document::{Behaviors, Document, DocumentHandle};
use crate::encoding::{self, TEMPLATE_PROPERTY};
use crate::error::{RegistryError, Result};
use crate::locale::LocaleFallbackResolver;
use crate::node::{Node, RepositorySession};
use crate::registry::DocumentRegistry;

/// Root segment of content paths, followed by the webspace key
const CONTENT_ROOT: &str = "/cmf/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HydrateOptions {
    /// Fall back to another locale when the requested one has no content
    pub load_ghost_content: bool,

    /// Hydrate again documents that already went through the pipeline
    pub rehydrate: bool,
}

impl Default for HydrateOptions {
    fn default() -> Self {
        Self {
            load_ghost_content: true,
            rehydrate: true,
        }
    }
}

/// State handed from stage to stage
#[derive(Debug)]
pub struct HydrateEvent {
    node: Arc<Node>,
    document: Option<DocumentHandle>,
    requested_locale: Option<String>,
    locale: Option<String>,
    options: HydrateOptions,
    metadata: Option<Arc<StructureMetadata>>,
}

impl HydrateEvent {
    pub fn new(node: Arc<Node>, locale: Option<&str>, options: HydrateOptions) -> Self {
        Self {
            node,
            document: None,
            requested_locale: locale.map(str::to_string),
            locale: locale.map(str::to_string),
            options,
            metadata: None,
        }
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn document(&self) -> Option<&DocumentHandle> {
        self.document.as_ref()
    }

    /// Locale the content is loaded in
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    pub fn set_locale(&mut self, locale: Option<String>) {
        self.locale = locale;
    }

    /// Locale the caller asked for
    pub fn requested_locale(&self) -> Option<&str> {
        self.requested_locale.as_deref()
    }

    pub fn options(&self) -> &HydrateOptions {
        &self.options
    }

    pub fn metadata(&self) -> Option<&StructureMetadata> {
        self.metadata.as_deref()
    }

    pub fn into_document(self) -> Option<DocumentHandle> {
        self.document
    }
}

/// Pipeline stages, run in [`Stage::ORDER`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Find or create the document and register it
    Register,
    /// Pick the locale the content is loaded in
    LocaleFallback,
    /// Resolve the structure metadata of the document
    Structure,
    /// Copy node properties into the document structure
    Mapping,
}

impl Stage {
    pub const ORDER: [Stage; 4] = [
        Stage::Register,
        Stage::LocaleFallback,
        Stage::Structure,
        Stage::Mapping,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Register => "register",
            Stage::LocaleFallback => "locale_fallback",
            Stage::Structure => "structure",
            Stage::Mapping => "mapping",
        }
    }
}

/// Hydrates documents from repository nodes
pub struct HydrationPipeline<L: MetadataLoader> {
    session: Arc<dyn RepositorySession>,
    factory: Arc<StructureMetadataFactory<L>>,
    resolver: LocaleFallbackResolver,
    document_types: BTreeMap<String, Behaviors>,
}

impl<L: MetadataLoader> HydrationPipeline<L> {
    pub fn new(
        session: Arc<dyn RepositorySession>,
        factory: Arc<StructureMetadataFactory<L>>,
        resolver: LocaleFallbackResolver,
        document_types: BTreeMap<String, Behaviors>,
    ) -> Self {
        Self {
            session,
            factory,
            resolver,
            document_types,
        }
    }

    /// Build a pipeline with the document types and fallbacks of a configuration
    pub fn from_config(
        session: Arc<dyn RepositorySession>,
        factory: Arc<StructureMetadataFactory<L>>,
        config: &HydrationConfig,
    ) -> Self {
        Self::new(
            session,
            factory,
            LocaleFallbackResolver::new(config.localizations.clone()),
            config.document_types.clone(),
        )
    }

    pub fn factory(&self) -> &StructureMetadataFactory<L> {
        &self.factory
    }

    /// Find a node by UUID or path and hydrate it in the given locale
    ///
    /// Without a locale the default locale of the registry is requested.
    pub fn hydrate(
        &self,
        registry: &mut DocumentRegistry,
        identifier: &str,
        locale: Option<&str>,
        options: HydrateOptions,
    ) -> Result<DocumentHandle> {
        let node = self.session.find(identifier)?;
        self.hydrate_node(registry, node, locale, options)
    }

    /// Hydrate an already fetched node
    pub fn hydrate_node(
        &self,
        registry: &mut DocumentRegistry,
        node: Arc<Node>,
        locale: Option<&str>,
        options: HydrateOptions,
    ) -> Result<DocumentHandle> {
        let locale = match locale {
            Some(locale) if !locale.is_empty() => locale.to_string(),
            _ => registry.default_locale().to_string(),
        };
        let mut event = HydrateEvent::new(node, Some(&locale), options);

        for stage in Stage::ORDER {
            debug!(stage = stage.name(), node = %event.node.uuid, "running hydration stage");
            if self.run(stage, registry, &mut event)?.is_break() {
                break;
            }
        }

        let uuid = event.node.uuid;
        let document = event
            .into_document()
            .ok_or(RegistryError::DocumentNotFound { uuid, locale })?;
        registry.mark_hydrated(&document);
        Ok(document)
    }

    /// Run a single stage on an event
    pub fn run(
        &self,
        stage: Stage,
        registry: &mut DocumentRegistry,
        event: &mut HydrateEvent,
    ) -> Result<ControlFlow<()>> {
        match stage {
            Stage::Register => self.register(registry, event),
            Stage::LocaleFallback => self.fallback_locale(registry, event),
            Stage::Structure => self.resolve_structure(event),
            Stage::Mapping => self.map_properties(event),
        }
    }

    fn register(
        &self,
        registry: &mut DocumentRegistry,
        event: &mut HydrateEvent,
    ) -> Result<ControlFlow<()>> {
        let locale = event
            .requested_locale
            .clone()
            .unwrap_or_else(|| registry.default_locale().to_string());
        let node = event.node.clone();

        if registry.has_node(node.uuid, &locale) {
            let document = registry.get_document_for_node(node.uuid, &locale)?;
            let skip = registry.is_hydrated(&document) && !event.options.rehydrate;
            event.document = Some(document);
            if skip {
                debug!("Document for node {} in {} already hydrated", node.uuid, locale);
                return Ok(ControlFlow::Break(()));
            }
            return Ok(ControlFlow::Continue(()));
        }

        let behaviors = self
            .document_types
            .get(&node.node_type)
            .copied()
            .ok_or_else(|| RegistryError::UnknownDocumentType(node.node_type.clone()))?;

        let mut document = Document::new(node.node_type.clone(), behaviors);
        document.set_uuid(node.uuid);
        document.set_path(node.path.clone());
        document.set_locale(Some(locale.clone()));
        document.set_original_locale(Some(locale.clone()));
        if let Some(webspace) = webspace_from_path(&node.path) {
            document.set_webspace(webspace);
        }

        let document = DocumentHandle::new(document);
        registry.register_document(&document, &node, &locale)?;
        event.document = Some(document);
        Ok(ControlFlow::Continue(()))
    }

    fn fallback_locale(
        &self,
        registry: &mut DocumentRegistry,
        event: &mut HydrateEvent,
    ) -> Result<ControlFlow<()>> {
        let Some(document) = event.document.clone() else {
            return Ok(ControlFlow::Continue(()));
        };

        let resolved = {
            let document = document.lock();
            self.resolver.resolve_locale(
                &document,
                &event.node,
                event.requested_locale.as_deref(),
                &event.options,
                registry.default_locale(),
            )
        };

        event.locale = resolved.clone();
        {
            let mut document = document.lock();
            document.set_locale(resolved.clone());
            document.set_original_locale(event.requested_locale.clone());
        }

        if let Some(locale) = resolved.as_deref() {
            registry.update_locale(&document, locale, event.requested_locale.as_deref())?;
        }
        Ok(ControlFlow::Continue(()))
    }

    fn resolve_structure(&self, event: &mut HydrateEvent) -> Result<ControlFlow<()>> {
        let Some(handle) = event.document.clone() else {
            return Ok(ControlFlow::Continue(()));
        };
        let mut document = handle.lock();
        if document.structure().is_none() {
            return Ok(ControlFlow::Continue(()));
        }

        let template = match (document.behaviors().localized, event.locale.as_deref()) {
            (true, Some(locale)) => encoding::localized_system_name(TEMPLATE_PROPERTY, locale),
            _ => encoding::system_name(TEMPLATE_PROPERTY),
        };
        let structure_type = event
            .node
            .property(&template)
            .and_then(Value::as_str)
            .filter(|structure_type| !structure_type.is_empty());

        let metadata = self
            .factory
            .get_structure_metadata(document.document_type(), structure_type)?;

        if let Some(structure) = document.structure_mut() {
            structure.set_structure_type(metadata.name.as_ref());
        }
        event.metadata = Some(metadata);
        Ok(ControlFlow::Continue(()))
    }

    fn map_properties(&self, event: &mut HydrateEvent) -> Result<ControlFlow<()>> {
        let (Some(handle), Some(metadata)) = (event.document.clone(), event.metadata.clone()) else {
            return Ok(ControlFlow::Continue(()));
        };
        let mut document = handle.lock();
        let localized = document.behaviors().localized;
        let locale = event.locale.clone();

        let Some(structure) = document.structure_mut() else {
            return Ok(ControlFlow::Continue(()));
        };
        structure.clear();

        for property in metadata.content_properties() {
            let name = match locale.as_deref() {
                Some(locale) if localized && property.multilingual => {
                    encoding::localized_content_name(&property.name, locale)
                }
                _ => encoding::content_name(&property.name),
            };
            let value = event.node.property(&name).cloned().unwrap_or(Value::Null);
            structure.set(property.name.clone(), value);
        }
        Ok(ControlFlow::Continue(()))
    }

    /// Register a deserialized document again
    ///
    /// Documents of unknown type or without UUID are left alone, as are
    /// documents whose node no longer exists. A document registered for the
    /// same node and locale is replaced.
    pub fn reattach(
        &self,
        registry: &mut DocumentRegistry,
        document: Document,
    ) -> Result<Option<DocumentHandle>> {
        if !self.document_types.contains_key(document.document_type()) {
            return Ok(None);
        }
        let Some(uuid) = document.uuid() else {
            return Ok(None);
        };

        let node = match self.session.find(&uuid.to_string()) {
            Ok(node) => node,
            Err(RegistryError::NodeNotFound(_)) => {
                debug!("Node {} of deserialized document is gone", uuid);
                return Ok(None);
            }
            Err(error) => return Err(error),
        };

        let locale = document
            .original_locale()
            .or(document.locale())
            .unwrap_or(registry.default_locale())
            .to_string();
        let resolved = document.locale().map(str::to_string);

        if let Some(previous) = registry.deregister_node(node.uuid, &locale) {
            debug!("Replacing document {} for node {} in {}", previous.id(), node.uuid, locale);
        }

        let document = DocumentHandle::new(document);
        if !registry.has_document(&document) {
            registry.register_document(&document, &node, &locale)?;
            if let Some(resolved) = resolved.as_deref() {
                registry.update_locale(&document, resolved, Some(locale.as_str()))?;
            }
            registry.mark_hydrated(&document);
        }
        Ok(Some(document))
    }
}

/// Webspace key of a content path like `/cmf/<webspace>/contents/...`
pub fn webspace_from_path(path: &str) -> Option<&str> {
    path.strip_prefix(CONTENT_ROOT)?
        .split('/')
        .next()
        .filter(|webspace| !webspace.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = HydrateOptions::default();
        assert!(options.load_ghost_content);
        assert!(options.rehydrate);

        let options: HydrateOptions = serde_json::from_str(r#"{"rehydrate": false}"#).unwrap();
        assert!(options.load_ghost_content);
        assert!(!options.rehydrate);
    }

    #[test]
    fn test_stage_order() {
        let names: Vec<&str> = Stage::ORDER.iter().map(Stage::name).collect();
        assert_eq!(names, vec!["register", "locale_fallback", "structure", "mapping"]);
    }

    #[test]
    fn test_webspace_from_path() {
        assert_eq!(webspace_from_path("/cmf/sulu_io/contents/about"), Some("sulu_io"));
        assert_eq!(webspace_from_path("/cmf/blog"), Some("blog"));
        assert_eq!(webspace_from_path("/cmf/"), None);
        assert_eq!(webspace_from_path("/snippets/default"), None);
    }
}
