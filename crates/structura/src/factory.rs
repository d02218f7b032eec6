//! Structure metadata factory
//!
//! Resolves structure definitions per (document type, structure type) from
//! the configured search paths and caches every successful load.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::cache::{CacheKey, FileCache, MetadataCache};
use crate::config::{StructureConfig, StructurePath};
use crate::error::{Result, StructureError};
use crate::loader::MetadataLoader;
use crate::metadata::StructureMetadata;

/// Resolves and caches structure metadata
#[derive(Debug)]
pub struct StructureMetadataFactory<L: MetadataLoader> {
    loader: L,
    config: StructureConfig,
    cache: MetadataCache,
}

impl<L: MetadataLoader> StructureMetadataFactory<L> {
    /// Create a factory; a configured `cache_dir` enables the on-disk cache
    pub fn new(loader: L, config: StructureConfig) -> Self {
        let cache = match &config.cache_dir {
            Some(cache_dir) => MetadataCache::with_backend(FileCache::new(cache_dir)),
            None => MetadataCache::new(),
        };
        Self::with_cache(loader, config, cache)
    }

    /// Create a factory with an explicit cache
    pub fn with_cache(loader: L, config: StructureConfig, cache: MetadataCache) -> Self {
        Self {
            loader,
            config,
            cache,
        }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn config(&self) -> &StructureConfig {
        &self.config
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    /// Mapped document types, sorted
    pub fn document_types(&self) -> Vec<String> {
        self.config.document_types()
    }

    /// Get the structure for a document type
    ///
    /// Without a structure type the configured default of the document type
    /// is used. When several search paths define the structure type, the
    /// last of them wins.
    pub fn get_structure_metadata(
        &self,
        document_type: &str,
        structure_type: Option<&str>,
    ) -> Result<Arc<StructureMetadata>> {
        let paths = self.paths(document_type)?;
        let structure_type = match structure_type {
            Some(structure_type) => structure_type,
            None => self.config.default_type_for(document_type).ok_or_else(|| {
                StructureError::NoDefaultStructureType {
                    document_type: document_type.to_string(),
                }
            })?,
        };

        let key = CacheKey::new(document_type, structure_type);
        if let Some(metadata) = self.cache.get(&key)? {
            return Ok(metadata);
        }

        let (source, path) = self.locate(document_type, structure_type, paths)?;

        if let Some(metadata) = self.cache.get_persisted(&key, &source)? {
            return Ok(metadata);
        }

        debug!(
            document_type,
            structure_type,
            source = %source.display(),
            "loading structure"
        );
        let metadata = self.loader.load(&source, &path.type_alias)?;
        self.cache.insert(key, metadata)
    }

    /// Get every structure available for a document type
    ///
    /// Each definition file found in any search path contributes one entry,
    /// in search path order and file name order within a path. Names are
    /// resolved like [`get_structure_metadata`](Self::get_structure_metadata),
    /// so a name defined in several paths yields the definition of the last
    /// such path at each of its positions.
    pub fn get_structures(&self, document_type: &str) -> Result<Vec<Arc<StructureMetadata>>> {
        let mut structures = Vec::new();
        for structure_type in self.structure_names(document_type)? {
            structures.push(self.get_structure_metadata(document_type, Some(&structure_type))?);
        }
        Ok(structures)
    }

    /// Whether a definition exists for the structure type
    pub fn has_structure(&self, document_type: &str, structure_type: &str) -> bool {
        match self.paths(document_type) {
            Ok(paths) => self.find_source(structure_type, paths).is_some(),
            Err(_) => false,
        }
    }

    /// Drop all cached structures, including the on-disk cache
    pub fn clear(&self) -> Result<()> {
        self.cache.clear()
    }

    fn paths(&self, document_type: &str) -> Result<&[StructurePath]> {
        self.config
            .paths_for(document_type)
            .ok_or_else(|| StructureError::DocumentTypeNotFound {
                document_type: document_type.to_string(),
                mapped_types: self.config.document_types(),
            })
    }

    fn source_file(&self, directory: &Path, structure_type: &str) -> PathBuf {
        directory.join(format!("{}.{}", structure_type, self.config.extension))
    }

    fn find_source<'p>(
        &self,
        structure_type: &str,
        paths: &'p [StructurePath],
    ) -> Option<(PathBuf, &'p StructurePath)> {
        // Later search paths override earlier ones
        paths.iter().rev().find_map(|path| {
            let source = self.source_file(&path.path, structure_type);
            source.is_file().then_some((source, path))
        })
    }

    fn locate<'p>(
        &self,
        document_type: &str,
        structure_type: &str,
        paths: &'p [StructurePath],
    ) -> Result<(PathBuf, &'p StructurePath)> {
        self.find_source(structure_type, paths)
            .ok_or_else(|| StructureError::StructureTypeNotFound {
                document_type: document_type.to_string(),
                structure_type: structure_type.to_string(),
                searched_paths: paths.iter().map(|p| p.path.clone()).collect(),
            })
    }

    /// Structure names of every definition file, in search order
    fn structure_names(&self, document_type: &str) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for path in self.paths(document_type)? {
            if !path.path.is_dir() {
                debug!(document_type, path = %path.path.display(), "skipping missing structure directory");
                continue;
            }

            let mut found = Vec::new();
            for entry in std::fs::read_dir(&path.path)? {
                let file = entry?.path();
                if !file.is_file() {
                    continue;
                }
                let matches_extension = file
                    .extension()
                    .is_some_and(|ext| ext == self.config.extension.as_str());
                if let (true, Some(stem)) = (matches_extension, file.file_stem()) {
                    found.push(stem.to_string_lossy().into_owned());
                }
            }
            found.sort();
            names.extend(found);
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use crate::loader::XmlStructureLoader;
    use tempfile::tempdir;

    #[test]
    fn test_has_structure() {
        let temp_dir = tempdir().unwrap();
        std::fs::write(temp_dir.path().join("default.xml"), "<template/>").unwrap();

        let config = StructureConfig::new().with_path("page", StructurePath::new("page", temp_dir.path()));
        let factory = StructureMetadataFactory::new(XmlStructureLoader::new(), config);

        assert!(factory.has_structure("page", "default"));
        assert!(!factory.has_structure("page", "overview"));
        assert!(!factory.has_structure("snippet", "default"));

        let empty = factory.get_structure_metadata("page", Some("default")).unwrap();
        assert!(empty.properties.is_empty());
    }

    #[test]
    fn test_loader_failure_is_not_cached() {
        let temp_dir = tempdir().unwrap();
        std::fs::write(temp_dir.path().join("broken.xml"), "<template><key>").unwrap();

        let config = StructureConfig::new().with_path("page", StructurePath::new("page", temp_dir.path()));
        let factory = StructureMetadataFactory::new(XmlStructureLoader::new(), config);

        let error = factory.get_structure_metadata("page", Some("broken")).unwrap_err();
        assert!(matches!(error, StructureError::Load(LoadError { .. })));
        assert!(factory.cache().is_empty());
    }
}
