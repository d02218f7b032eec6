//! Repository nodes and the session they are fetched through

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{RegistryError, Result};

/// Handle to a location in the content repository
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    pub uuid: Uuid,
    pub path: String,

    /// Alias of the document type stored at this node
    pub node_type: String,

    /// Raw property table, in repository order
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Node {
    pub fn new(uuid: Uuid, path: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            uuid,
            path: path.into(),
            node_type: node_type.into(),
            properties: Map::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_property(name, value);
        self
    }

    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(name.into(), value.into());
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// Node name, the last path segment
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }
}

/// Session on the content repository
pub trait RepositorySession: Send + Sync {
    /// Find a node by UUID or absolute path
    fn find(&self, identifier: &str) -> Result<Arc<Node>>;
}

/// In-memory repository session for testing and offline tooling
#[derive(Debug, Default)]
pub struct MemorySession {
    nodes: HashMap<Uuid, Arc<Node>>,
    paths: HashMap<String, Uuid>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a session from a JSON array of nodes
    pub fn from_json(json: &str) -> Result<Self> {
        let nodes: Vec<Node> = serde_json::from_str(json)?;
        let mut session = Self::new();
        for node in nodes {
            session.insert(node);
        }
        Ok(session)
    }

    /// Add or replace a node
    pub fn insert(&mut self, node: Node) -> Arc<Node> {
        if let Some(previous) = self.nodes.get(&node.uuid) {
            self.paths.remove(&previous.path);
        }
        let node = Arc::new(node);
        self.paths.insert(node.path.clone(), node.uuid);
        self.nodes.insert(node.uuid, node.clone());
        node
    }

    pub fn remove(&mut self, uuid: &Uuid) -> Option<Arc<Node>> {
        let node = self.nodes.remove(uuid)?;
        self.paths.remove(&node.path);
        Some(node)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl RepositorySession for MemorySession {
    fn find(&self, identifier: &str) -> Result<Arc<Node>> {
        let uuid = match Uuid::parse_str(identifier) {
            Ok(uuid) => Some(uuid),
            Err(_) => self.paths.get(identifier).copied(),
        };

        uuid.and_then(|uuid| self.nodes.get(&uuid))
            .cloned()
            .ok_or_else(|| RegistryError::NodeNotFound(identifier.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_by_uuid_and_path() {
        let uuid = Uuid::new_v4();
        let mut session = MemorySession::new();
        session.insert(Node::new(uuid, "/cmf/sulu_io/contents/about", "page"));

        assert_eq!(session.find(&uuid.to_string()).unwrap().uuid, uuid);
        assert_eq!(session.find("/cmf/sulu_io/contents/about").unwrap().name(), "about");
        assert!(matches!(
            session.find("/cmf/sulu_io/contents/missing"),
            Err(RegistryError::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_replacing_a_node_drops_old_path() {
        let uuid = Uuid::new_v4();
        let mut session = MemorySession::new();
        session.insert(Node::new(uuid, "/cmf/sulu_io/contents/old", "page"));
        session.insert(Node::new(uuid, "/cmf/sulu_io/contents/new", "page"));

        assert_eq!(session.len(), 1);
        assert!(session.find("/cmf/sulu_io/contents/old").is_err());
        assert!(session.find("/cmf/sulu_io/contents/new").is_ok());
    }

    #[test]
    fn test_from_json() {
        let session = MemorySession::from_json(
            r#"[{
                "uuid": "6a0c2b3e-8f34-4b6f-9e54-1d0c7b0e2a11",
                "path": "/cmf/sulu_io/contents",
                "node_type": "home",
                "properties": {"i18n:en-template": "default", "i18n:en-title": "Homepage"}
            }]"#,
        )
        .unwrap();

        let node = session.find("/cmf/sulu_io/contents").unwrap();
        assert_eq!(node.property("i18n:en-title"), Some(&Value::from("Homepage")));
    }

    #[test]
    fn test_from_json_keeps_property_order() {
        let session = MemorySession::from_json(
            r#"[{
                "uuid": "6a0c2b3e-8f34-4b6f-9e54-1d0c7b0e2a11",
                "path": "/cmf/sulu_io/contents/about",
                "node_type": "page",
                "properties": {"i18n:fr-template": "default", "i18n:de-template": "default", "i18n:de-title": "Über uns"}
            }]"#,
        )
        .unwrap();

        let node = session.find("/cmf/sulu_io/contents/about").unwrap();
        let names: Vec<&str> = node.properties.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["i18n:fr-template", "i18n:de-template", "i18n:de-title"]);
    }
}
