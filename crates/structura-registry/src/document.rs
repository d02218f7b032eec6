//! Documents and their capabilities

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Identity of one in-memory document instance
///
/// Two instances hydrated from the same node are different documents. The
/// identity is never serialized: a deserialized document is a new instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn new() -> Self {
        DocumentId(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Capabilities of a document type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Behaviors {
    /// Carries a structure type and structured content
    #[serde(default)]
    pub structure: bool,

    /// Content is stored per locale
    #[serde(default)]
    pub localized: bool,

    /// Lives inside a webspace
    #[serde(default)]
    pub webspace: bool,
}

impl Behaviors {
    pub const fn page() -> Self {
        Self {
            structure: true,
            localized: true,
            webspace: true,
        }
    }

    pub const fn snippet() -> Self {
        Self {
            structure: true,
            localized: true,
            webspace: false,
        }
    }

    /// Whether locale fallback applies to documents of this type
    pub fn supports_localized_structure(&self) -> bool {
        self.structure && self.localized
    }
}

/// One named value of a structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureProperty {
    pub name: String,
    pub value: Value,
}

/// Structure type and content of a structure-bearing document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    #[serde(default)]
    structure_type: Option<String>,

    #[serde(default)]
    properties: Vec<StructureProperty>,
}

impl Structure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn structure_type(&self) -> Option<&str> {
        self.structure_type.as_deref()
    }

    pub fn set_structure_type(&mut self, structure_type: impl Into<String>) {
        self.structure_type = Some(structure_type.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.properties.iter().find(|p| p.name == name).map(|p| &p.value)
    }

    /// Set a value, keeping the position of an existing property
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.properties.iter_mut().find(|p| p.name == name) {
            Some(property) => property.value = value,
            None => self.properties.push(StructureProperty { name, value }),
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.properties.iter().any(|p| p.name == name)
    }

    /// Set several values at once
    pub fn bind<I, K, V>(&mut self, values: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (name, value) in values {
            self.set(name, value);
        }
    }

    pub fn properties(&self) -> &[StructureProperty] {
        &self.properties
    }

    pub fn clear(&mut self) {
        self.properties.clear();
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Content as a JSON object, in property order
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.properties
                .iter()
                .map(|p| (p.name.clone(), p.value.clone()))
                .collect(),
        )
    }
}

/// Typed representation of repository content in one locale
#[derive(Debug, Serialize, Deserialize)]
pub struct Document {
    #[serde(skip)]
    id: DocumentId,

    #[serde(default)]
    uuid: Option<Uuid>,

    document_type: String,

    #[serde(default)]
    behaviors: Behaviors,

    #[serde(default)]
    locale: Option<String>,

    #[serde(default)]
    original_locale: Option<String>,

    #[serde(default)]
    path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    structure: Option<Structure>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    webspace: Option<String>,
}

impl Document {
    /// Create an empty document with the capabilities of its type
    pub fn new(document_type: impl Into<String>, behaviors: Behaviors) -> Self {
        Self {
            id: DocumentId::new(),
            uuid: None,
            document_type: document_type.into(),
            behaviors,
            locale: None,
            original_locale: None,
            path: None,
            structure: behaviors.structure.then(Structure::new),
            webspace: None,
        }
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn uuid(&self) -> Option<Uuid> {
        self.uuid
    }

    pub fn set_uuid(&mut self, uuid: Uuid) {
        self.uuid = Some(uuid);
    }

    pub fn document_type(&self) -> &str {
        &self.document_type
    }

    pub fn behaviors(&self) -> Behaviors {
        self.behaviors
    }

    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    pub fn set_locale(&mut self, locale: Option<String>) {
        self.locale = locale;
    }

    /// Locale the document was requested in, before any fallback
    pub fn original_locale(&self) -> Option<&str> {
        self.original_locale.as_deref()
    }

    pub fn set_original_locale(&mut self, locale: Option<String>) {
        self.original_locale = locale;
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = Some(path.into());
    }

    /// Structure capability; `None` for documents without structure
    pub fn structure(&self) -> Option<&Structure> {
        self.structure.as_ref()
    }

    pub fn structure_mut(&mut self) -> Option<&mut Structure> {
        self.structure.as_mut()
    }

    pub fn structure_type(&self) -> Option<&str> {
        self.structure.as_ref().and_then(Structure::structure_type)
    }

    /// Webspace capability; `None` for documents outside webspaces
    pub fn webspace(&self) -> Option<&str> {
        if self.behaviors.webspace {
            self.webspace.as_deref()
        } else {
            None
        }
    }

    pub fn set_webspace(&mut self, webspace: impl Into<String>) {
        self.webspace = Some(webspace.into());
    }

    /// Whether locale fallback applies to this document
    pub fn supports_localized_structure(&self) -> bool {
        self.behaviors.supports_localized_structure() && self.structure.is_some()
    }

    /// Whether this is the ghost of another locale
    pub fn is_ghost(&self) -> bool {
        match (&self.locale, &self.original_locale) {
            (Some(locale), Some(original)) => locale != original,
            _ => false,
        }
    }
}

/// Shared handle to a registered document
///
/// Stages of the hydration pipeline and the registry refer to the same
/// instance through clones of its handle.
#[derive(Clone)]
pub struct DocumentHandle {
    id: DocumentId,
    inner: Arc<Mutex<Document>>,
}

impl DocumentHandle {
    pub fn new(document: Document) -> Self {
        Self {
            id: document.id(),
            inner: Arc::new(Mutex::new(document)),
        }
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    /// Lock the document for reading or writing
    pub fn lock(&self) -> MutexGuard<'_, Document> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether both handles refer to the same instance
    pub fn same_instance(&self, other: &DocumentHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Serialize the document to JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&*self.lock())
    }
}

impl From<Document> for DocumentHandle {
    fn from(document: Document) -> Self {
        Self::new(document)
    }
}

impl std::fmt::Debug for DocumentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentHandle").field("id", &self.id).finish()
    }
}
