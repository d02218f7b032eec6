//! Metadata caching
//!
//! Loaded structures live in an in-memory table keyed by
//! (document type, structure type). A [`MetadataCacheBackend`] may persist
//! them across process restarts; a persisted entry is only used while its
//! source file has not been modified since the entry was written.

use crate::error::{Result, StructureError};
use crate::metadata::StructureMetadata;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use time::OffsetDateTime;
use tracing::{debug, warn};

/// Composite cache key
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub document_type: String,
    pub structure_type: String,
}

impl CacheKey {
    pub fn new(document_type: impl Into<String>, structure_type: impl Into<String>) -> Self {
        Self {
            document_type: document_type.into(),
            structure_type: structure_type.into(),
        }
    }

    /// Stable SHA-256 digest of the key, usable as a file name
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.document_type.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.structure_type.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.document_type, self.structure_type)
    }
}

/// Persistent store for loaded metadata
pub trait MetadataCacheBackend: Send + Sync {
    /// Fetch a fresh entry for `key`; entries older than `source` are misses
    fn get(&self, key: &CacheKey, source: &Path) -> Result<Option<StructureMetadata>>;

    /// Store an entry
    fn put(&self, key: &CacheKey, metadata: &StructureMetadata) -> Result<()>;

    /// Drop all entries
    fn clear(&self) -> Result<()>;
}

/// Entry stored by [`FileCache`]
#[derive(Serialize, Deserialize)]
struct CacheEntry {
    key: CacheKey,
    #[serde(with = "time::serde::rfc3339")]
    cached_at: OffsetDateTime,
    metadata: StructureMetadata,
}

/// File-based cache backend writing one JSON file per key
#[derive(Debug, Clone)]
pub struct FileCache {
    base_path: PathBuf,
}

impl FileCache {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Get the path of the entry for a key
    fn entry_file(&self, key: &CacheKey) -> PathBuf {
        self.base_path.join(format!("{}.json", key.digest()))
    }

    /// Whether a file name has the shape of an entry written by this cache
    fn is_entry_file(path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            return false;
        };
        let digest = name
            .strip_suffix(".json.tmp")
            .or_else(|| name.strip_suffix(".json"));
        digest.is_some_and(|digest| digest.len() == 64 && digest.bytes().all(|b| b.is_ascii_hexdigit()))
    }

    fn modified(path: &Path) -> Result<OffsetDateTime> {
        let modified = std::fs::metadata(path)?.modified()?;
        Ok(OffsetDateTime::from(modified))
    }
}

impl MetadataCacheBackend for FileCache {
    fn get(&self, key: &CacheKey, source: &Path) -> Result<Option<StructureMetadata>> {
        let entry_file = self.entry_file(key);
        if !entry_file.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&entry_file)?;
        let entry: CacheEntry = serde_json::from_str(&content)?;

        if entry.key != *key || entry.metadata.source != source {
            debug!(key = %key, "cached structure belongs to another source");
            return Ok(None);
        }

        if Self::modified(source)? > entry.cached_at {
            debug!(key = %key, source = %source.display(), "cached structure is stale");
            return Ok(None);
        }

        Ok(Some(entry.metadata))
    }

    fn put(&self, key: &CacheKey, metadata: &StructureMetadata) -> Result<()> {
        std::fs::create_dir_all(&self.base_path)?;

        let entry = CacheEntry {
            key: key.clone(),
            cached_at: OffsetDateTime::now_utc(),
            metadata: metadata.clone(),
        };
        let json = serde_json::to_string_pretty(&entry)?;

        // Write through a temporary file so readers never see partial entries
        let entry_file = self.entry_file(key);
        let tmp_file = entry_file.with_extension("json.tmp");
        std::fs::write(&tmp_file, json)?;
        std::fs::rename(&tmp_file, &entry_file)?;

        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if !self.base_path.is_dir() {
            return Ok(());
        }

        // The directory may be shared, only entry files are removed
        for entry in std::fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.is_file() && Self::is_entry_file(&path) {
                std::fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

/// In-memory metadata table with an optional persistent backend
pub struct MetadataCache {
    entries: Mutex<HashMap<CacheKey, Arc<StructureMetadata>>>,
    backend: Option<Box<dyn MetadataCacheBackend>>,
}

impl MetadataCache {
    /// Create a memory-only cache
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            backend: None,
        }
    }

    /// Create a cache persisting entries to `backend`
    pub fn with_backend(backend: impl MetadataCacheBackend + 'static) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            backend: Some(Box::new(backend)),
        }
    }

    fn entries(&self) -> Result<MutexGuard<'_, HashMap<CacheKey, Arc<StructureMetadata>>>> {
        self.entries.lock().map_err(|_| StructureError::Cache {
            reason: "Failed to acquire cache lock".to_string(),
        })
    }

    /// Look up a key in memory
    pub fn get(&self, key: &CacheKey) -> Result<Option<Arc<StructureMetadata>>> {
        Ok(self.entries()?.get(key).cloned())
    }

    /// Look up a key in the persistent backend, promoting hits to memory
    pub fn get_persisted(&self, key: &CacheKey, source: &Path) -> Result<Option<Arc<StructureMetadata>>> {
        let Some(backend) = &self.backend else {
            return Ok(None);
        };

        match backend.get(key, source) {
            Ok(Some(metadata)) => {
                debug!(key = %key, "structure restored from persistent cache");
                let metadata = Arc::new(metadata);
                self.entries()?.insert(key.clone(), metadata.clone());
                Ok(Some(metadata))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                warn!(key = %key, error = %e, "failed to read persistent metadata cache");
                Ok(None)
            }
        }
    }

    /// Store a freshly loaded structure
    pub fn insert(&self, key: CacheKey, metadata: StructureMetadata) -> Result<Arc<StructureMetadata>> {
        if let Some(backend) = &self.backend {
            if let Err(e) = backend.put(&key, &metadata) {
                warn!(key = %key, error = %e, "failed to write persistent metadata cache");
            }
        }

        let metadata = Arc::new(metadata);
        self.entries()?.insert(key, metadata.clone());
        Ok(metadata)
    }

    /// Drop all entries, including persisted ones
    pub fn clear(&self) -> Result<()> {
        self.entries()?.clear();
        if let Some(backend) = &self.backend {
            backend.clear()?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }
}

impl Default for MetadataCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MetadataCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataCache")
            .field("len", &self.len())
            .field("has_backend", &self.has_backend())
            .finish()
    }
}
