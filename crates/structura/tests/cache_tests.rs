use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use structura::{
    LoadError, MetadataLoader, StructureConfig, StructureMetadata, StructureMetadataFactory,
    StructurePath, XmlStructureLoader,
};
use tempfile::tempdir;

const TEMPLATE: &str = r#"<?xml version="1.0" ?>
<template xmlns="http://schemas.sulu.io/template/template">
    <key>default</key>
    <view>pages/default</view>
    <properties>
        <property name="title" type="text_line" mandatory="true"/>
    </properties>
</template>"#;

/// Delegates to the XML loader and counts how often it was asked
#[derive(Default)]
struct TrackingLoader {
    inner: XmlStructureLoader,
    calls: Mutex<usize>,
}

impl TrackingLoader {
    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl MetadataLoader for TrackingLoader {
    fn load(&self, source: &Path, document_type: &str) -> Result<StructureMetadata, LoadError> {
        *self.calls.lock().unwrap() += 1;
        self.inner.load(source, document_type)
    }
}

fn config(templates: &Path, cache_dir: &Path) -> StructureConfig {
    StructureConfig::new()
        .with_path("page", StructurePath::new("page", templates))
        .with_default_type("page", "default")
        .with_cache_dir(cache_dir)
}

#[test]
fn test_persisted_structure_survives_new_factory() {
    let temp_dir = tempdir().unwrap();
    let templates = temp_dir.path().join("templates");
    let cache_dir = temp_dir.path().join("cache");
    std::fs::create_dir_all(&templates).unwrap();
    std::fs::write(templates.join("default.xml"), TEMPLATE).unwrap();

    let first = StructureMetadataFactory::new(TrackingLoader::default(), config(&templates, &cache_dir));
    let loaded = first.get_structure_metadata("page", None).unwrap();
    assert_eq!(first.loader().calls(), 1);
    assert!(first.cache().has_backend());

    // A fresh factory simulates a process restart
    let second = StructureMetadataFactory::new(TrackingLoader::default(), config(&templates, &cache_dir));
    let restored = second.get_structure_metadata("page", None).unwrap();

    assert_eq!(second.loader().calls(), 0);
    assert_eq!(restored, loaded);
    assert_eq!(restored.view.as_deref(), Some("pages/default"));
}

#[test]
fn test_modified_source_invalidates_persisted_structure() {
    let temp_dir = tempdir().unwrap();
    let templates = temp_dir.path().join("templates");
    let cache_dir = temp_dir.path().join("cache");
    std::fs::create_dir_all(&templates).unwrap();
    let source = templates.join("default.xml");
    std::fs::write(&source, TEMPLATE).unwrap();

    let first = StructureMetadataFactory::new(TrackingLoader::default(), config(&templates, &cache_dir));
    first.get_structure_metadata("page", None).unwrap();

    std::fs::write(&source, TEMPLATE.replace("pages/default", "pages/updated")).unwrap();
    let file = std::fs::File::options().write(true).open(&source).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(60)).unwrap();

    let second = StructureMetadataFactory::new(TrackingLoader::default(), config(&templates, &cache_dir));
    let reloaded = second.get_structure_metadata("page", None).unwrap();

    assert_eq!(second.loader().calls(), 1);
    assert_eq!(reloaded.view.as_deref(), Some("pages/updated"));
}

#[test]
fn test_unreadable_cache_falls_back_to_loader() {
    let temp_dir = tempdir().unwrap();
    let templates = temp_dir.path().join("templates");
    let cache_dir = temp_dir.path().join("cache");
    std::fs::create_dir_all(&templates).unwrap();
    std::fs::write(templates.join("default.xml"), TEMPLATE).unwrap();

    let first = StructureMetadataFactory::new(TrackingLoader::default(), config(&templates, &cache_dir));
    first.get_structure_metadata("page", None).unwrap();

    for entry in std::fs::read_dir(&cache_dir).unwrap() {
        std::fs::write(entry.unwrap().path(), "{ not json").unwrap();
    }

    let second = StructureMetadataFactory::new(TrackingLoader::default(), config(&templates, &cache_dir));
    let reloaded = second.get_structure_metadata("page", None).unwrap();

    assert_eq!(second.loader().calls(), 1);
    assert_eq!(reloaded.name.as_ref(), "default");
}

#[test]
fn test_clear_removes_persisted_entries() {
    let temp_dir = tempdir().unwrap();
    let templates = temp_dir.path().join("templates");
    let cache_dir = temp_dir.path().join("cache");
    std::fs::create_dir_all(&templates).unwrap();
    std::fs::write(templates.join("default.xml"), TEMPLATE).unwrap();

    std::fs::create_dir_all(&cache_dir).unwrap();
    std::fs::write(cache_dir.join("unrelated.txt"), "keep").unwrap();

    let factory = StructureMetadataFactory::new(TrackingLoader::default(), config(&templates, &cache_dir));
    factory.get_structure_metadata("page", None).unwrap();
    assert_eq!(std::fs::read_dir(&cache_dir).unwrap().count(), 2);

    factory.clear().unwrap();
    assert!(factory.cache().is_empty());
    assert!(cache_dir.join("unrelated.txt").exists());
    assert_eq!(std::fs::read_dir(&cache_dir).unwrap().count(), 1);

    let reloaded = StructureMetadataFactory::new(TrackingLoader::default(), config(&templates, &cache_dir));
    reloaded.get_structure_metadata("page", None).unwrap();
    assert_eq!(reloaded.loader().calls(), 1);
}
