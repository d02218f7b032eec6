//! Document registry
//!
//! Maps (node UUID, locale) pairs to document instances and each instance
//! back to its node and locales. One registry belongs to one unit of work.

use std::collections::{HashMap, HashSet};

use tracing::debug;
use uuid::Uuid;

use crate::document::{DocumentHandle, DocumentId};
use crate::error::{RegistryError, Result};
use crate::node::Node;

#[derive(Debug, Clone)]
struct RegistryEntry {
    handle: DocumentHandle,
    node: Uuid,

    /// Locale the document was registered under
    registered_locale: String,

    /// Locale the document currently holds content for
    locale: String,

    /// Locale the document was requested in
    original_locale: String,
}

/// Bidirectional map between repository nodes and document instances
#[derive(Debug)]
pub struct DocumentRegistry {
    default_locale: String,
    documents: HashMap<DocumentId, RegistryEntry>,
    nodes: HashMap<(Uuid, String), DocumentId>,
    hydrated: HashSet<DocumentId>,
}

impl DocumentRegistry {
    pub fn new(default_locale: impl Into<String>) -> Self {
        Self {
            default_locale: default_locale.into(),
            documents: HashMap::new(),
            nodes: HashMap::new(),
            hydrated: HashSet::new(),
        }
    }

    /// Register a document for a node in the given locale
    ///
    /// Registering the same document for the same pair again is a no-op.
    pub fn register_document(
        &mut self,
        document: &DocumentHandle,
        node: &Node,
        locale: &str,
    ) -> Result<()> {
        let id = document.id();
        let key = (node.uuid, locale.to_string());

        if let Some(registered) = self.nodes.get(&key) {
            if *registered == id {
                return Ok(());
            }
            return Err(RegistryError::AlreadyRegistered {
                uuid: node.uuid,
                locale: locale.to_string(),
            });
        }

        if let Some(entry) = self.documents.get(&id) {
            return Err(RegistryError::AlreadyRegistered {
                uuid: entry.node,
                locale: entry.registered_locale.clone(),
            });
        }

        debug!("Registering document {} for node {} in locale {}", id, node.uuid, locale);

        self.nodes.insert(key, id);
        self.documents.insert(
            id,
            RegistryEntry {
                handle: document.clone(),
                node: node.uuid,
                registered_locale: locale.to_string(),
                locale: locale.to_string(),
                original_locale: locale.to_string(),
            },
        );
        Ok(())
    }

    /// Remove a document and its node mapping
    pub fn deregister_document(&mut self, document: &DocumentHandle) -> Result<()> {
        self.deregister(document.id())
    }

    fn deregister(&mut self, id: DocumentId) -> Result<()> {
        let entry = self
            .documents
            .remove(&id)
            .ok_or(RegistryError::DocumentNotRegistered(id))?;

        debug!("Deregistering document {} for node {}", id, entry.node);

        self.nodes.remove(&(entry.node, entry.registered_locale));
        self.hydrated.remove(&id);
        Ok(())
    }

    /// Remove whatever document is registered for the node in the locale
    pub fn deregister_node(&mut self, uuid: Uuid, locale: &str) -> Option<DocumentHandle> {
        let id = *self.nodes.get(&(uuid, locale.to_string()))?;
        let handle = self.documents.get(&id).map(|entry| entry.handle.clone());
        self.deregister(id).ok()?;
        handle
    }

    pub fn has_document(&self, document: &DocumentHandle) -> bool {
        self.documents.contains_key(&document.id())
    }

    pub fn has_node(&self, uuid: Uuid, locale: &str) -> bool {
        self.nodes.contains_key(&(uuid, locale.to_string()))
    }

    pub fn get_document_for_node(&self, uuid: Uuid, locale: &str) -> Result<DocumentHandle> {
        self.nodes
            .get(&(uuid, locale.to_string()))
            .and_then(|id| self.documents.get(id))
            .map(|entry| entry.handle.clone())
            .ok_or_else(|| RegistryError::DocumentNotFound {
                uuid,
                locale: locale.to_string(),
            })
    }

    pub fn get_node_for_document(&self, document: &DocumentHandle) -> Result<Uuid> {
        self.entry(document).map(|entry| entry.node)
    }

    pub fn get_locale_for_document(&self, document: &DocumentHandle) -> Result<&str> {
        self.entry(document).map(|entry| entry.locale.as_str())
    }

    pub fn get_original_locale_for_document(&self, document: &DocumentHandle) -> Result<&str> {
        self.entry(document).map(|entry| entry.original_locale.as_str())
    }

    /// Record the locale a document was resolved to
    ///
    /// The node mapping keeps the locale the document was registered under.
    pub fn update_locale(
        &mut self,
        document: &DocumentHandle,
        locale: &str,
        original_locale: Option<&str>,
    ) -> Result<()> {
        let id = document.id();
        let entry = self
            .documents
            .get_mut(&id)
            .ok_or(RegistryError::DocumentNotRegistered(id))?;

        entry.locale = locale.to_string();
        if let Some(original_locale) = original_locale {
            entry.original_locale = original_locale.to_string();
        }
        Ok(())
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    pub fn mark_hydrated(&mut self, document: &DocumentHandle) {
        if self.documents.contains_key(&document.id()) {
            self.hydrated.insert(document.id());
        }
    }

    pub fn is_hydrated(&self, document: &DocumentHandle) -> bool {
        self.hydrated.contains(&document.id())
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn clear(&mut self) {
        self.documents.clear();
        self.nodes.clear();
        self.hydrated.clear();
    }

    fn entry(&self, document: &DocumentHandle) -> Result<&RegistryEntry> {
        self.documents
            .get(&document.id())
            .ok_or(RegistryError::DocumentNotRegistered(document.id()))
    }
}
