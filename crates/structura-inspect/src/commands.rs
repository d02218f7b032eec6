//! Command implementations
//!
//! Every command produces a JSON value that `main` prints.

use std::path::Path;
use std::sync::Arc;

use serde_json::{Value, json};
use structura::{StructureMetadata, StructureMetadataFactory, XmlStructureLoader};
use structura_registry::{
    DocumentRegistry, HydrateOptions, HydrationConfig, HydrationPipeline, MemorySession,
};
use tracing::info;

use crate::cli::Command;
use crate::error::Result;

pub struct Inspector {
    config: HydrationConfig,
    factory: Arc<StructureMetadataFactory<XmlStructureLoader>>,
}

impl Inspector {
    pub fn new(config: HydrationConfig) -> Self {
        let factory = StructureMetadataFactory::new(XmlStructureLoader::new(), config.structures.clone());
        Self {
            config,
            factory: Arc::new(factory),
        }
    }

    pub fn run(&self, command: &Command) -> Result<Value> {
        match command {
            Command::Types => Ok(self.types()),
            Command::Structures { document_type } => self.structures(document_type),
            Command::Structure {
                document_type,
                structure_type,
            } => self.structure(document_type, structure_type.as_deref()),
            Command::Hydrate {
                nodes,
                identifier,
                locale,
                no_ghost,
            } => {
                let options = HydrateOptions {
                    load_ghost_content: !no_ghost,
                    ..HydrateOptions::default()
                };
                self.hydrate(nodes, identifier, locale.as_deref(), options)
            }
            Command::ClearCache => self.clear_cache(),
        }
    }

    fn types(&self) -> Value {
        let types: Vec<Value> = self
            .config
            .document_types
            .iter()
            .map(|(name, behaviors)| {
                json!({
                    "name": name,
                    "behaviors": behaviors,
                    "default_structure": self.config.structures.default_type_for(name),
                })
            })
            .collect();
        Value::Array(types)
    }

    fn structures(&self, document_type: &str) -> Result<Value> {
        let structures = self.factory.get_structures(document_type)?;
        info!("Found {} structures for {}", structures.len(), document_type);

        Ok(Value::Array(
            structures.iter().map(|metadata| summary(metadata, &self.config.default_locale)).collect(),
        ))
    }

    fn structure(&self, document_type: &str, structure_type: Option<&str>) -> Result<Value> {
        let metadata = self.factory.get_structure_metadata(document_type, structure_type)?;
        Ok(serde_json::to_value(&*metadata)?)
    }

    fn hydrate(
        &self,
        nodes: &Path,
        identifier: &str,
        locale: Option<&str>,
        options: HydrateOptions,
    ) -> Result<Value> {
        let session = MemorySession::from_json(&std::fs::read_to_string(nodes)?)?;
        info!("Loaded {} nodes from {}", session.len(), nodes.display());

        let pipeline = HydrationPipeline::from_config(Arc::new(session), self.factory.clone(), &self.config);
        let mut registry = DocumentRegistry::new(self.config.default_locale.clone());
        let document = pipeline.hydrate(&mut registry, identifier, locale, options)?;

        let document = document.lock();
        Ok(json!({
            "uuid": document.uuid(),
            "document_type": document.document_type(),
            "locale": document.locale(),
            "original_locale": document.original_locale(),
            "ghost": document.is_ghost(),
            "webspace": document.webspace(),
            "structure_type": document.structure_type(),
            "content": document.structure().map(|structure| structure.to_json()),
        }))
    }

    fn clear_cache(&self) -> Result<Value> {
        self.factory.clear()?;
        Ok(json!({ "cleared": self.config.structures.cache_dir }))
    }
}

fn summary(metadata: &StructureMetadata, locale: &str) -> Value {
    json!({
        "name": metadata.name.as_ref(),
        "title": metadata.title(locale),
        "source": metadata.source,
        "view": metadata.view,
        "properties": metadata.content_properties().map(|p| p.name.as_str()).collect::<Vec<_>>(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use structura::{StructureConfig, StructurePath};
    use structura_registry::Behaviors;
    use tempfile::TempDir;

    const TEMPLATE: &str = r#"<template>
        <key>default</key>
        <view>pages/default</view>
        <meta><title lang="en">Default</title></meta>
        <properties>
            <property name="title" type="text_line"/>
        </properties>
    </template>"#;

    const NODES: &str = r#"[{
        "uuid": "6a0c2b3e-8f34-4b6f-9e54-1d0c7b0e2a11",
        "path": "/cmf/sulu_io/contents/about",
        "node_type": "page",
        "properties": {"i18n:de-template": "default", "i18n:de-title": "Über uns"}
    }]"#;

    fn inspector() -> (TempDir, Inspector) {
        let temp_dir = TempDir::new().unwrap();
        let pages = temp_dir.path().join("pages");
        std::fs::create_dir_all(&pages).unwrap();
        std::fs::write(pages.join("default.xml"), TEMPLATE).unwrap();
        std::fs::write(temp_dir.path().join("nodes.json"), NODES).unwrap();

        let config = HydrationConfig::new("en")
            .with_document_type("page", Behaviors::page())
            .with_structures(
                StructureConfig::new()
                    .with_path("page", StructurePath::new("page", &pages))
                    .with_default_type("page", "default"),
            );
        (temp_dir, Inspector::new(config))
    }

    #[test]
    fn test_types() {
        let (_temp_dir, inspector) = inspector();
        let types = inspector.run(&Command::Types).unwrap();

        assert_eq!(types[0]["name"], "page");
        assert_eq!(types[0]["default_structure"], "default");
        assert_eq!(types[0]["behaviors"]["webspace"], true);
    }

    #[test]
    fn test_structures() {
        let (_temp_dir, inspector) = inspector();
        let structures = inspector
            .run(&Command::Structures {
                document_type: "page".to_string(),
            })
            .unwrap();

        assert_eq!(structures[0]["name"], "default");
        assert_eq!(structures[0]["title"], "Default");
        assert_eq!(structures[0]["properties"], json!(["title"]));
    }

    #[test]
    fn test_default_structure() {
        let (_temp_dir, inspector) = inspector();
        let structure = inspector
            .run(&Command::Structure {
                document_type: "page".to_string(),
                structure_type: None,
            })
            .unwrap();

        assert_eq!(structure["view"], "pages/default");
    }

    #[test]
    fn test_unmapped_document_type() {
        let (_temp_dir, inspector) = inspector();
        let result = inspector.run(&Command::Structures {
            document_type: "snippet".to_string(),
        });

        assert!(result.is_err());
    }

    #[test]
    fn test_hydrate_with_fallback() {
        let (temp_dir, inspector) = inspector();
        let document = inspector
            .run(&Command::Hydrate {
                nodes: temp_dir.path().join("nodes.json"),
                identifier: "/cmf/sulu_io/contents/about".to_string(),
                locale: Some("en".to_string()),
                no_ghost: false,
            })
            .unwrap();

        assert_eq!(document["locale"], "de");
        assert_eq!(document["original_locale"], "en");
        assert_eq!(document["ghost"], true);
        assert_eq!(document["webspace"], "sulu_io");
        assert_eq!(document["content"]["title"], "Über uns");
    }

    #[test]
    fn test_hydrate_without_ghost_content() {
        let (temp_dir, inspector) = inspector();
        let document = inspector
            .run(&Command::Hydrate {
                nodes: temp_dir.path().join("nodes.json"),
                identifier: "6a0c2b3e-8f34-4b6f-9e54-1d0c7b0e2a11".to_string(),
                locale: Some("en".to_string()),
                no_ghost: true,
            })
            .unwrap();

        assert_eq!(document["locale"], "en");
        assert_eq!(document["content"]["title"], Value::Null);
    }
}
