//! Structure metadata: content templates and their property definitions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Key of a structure type within a document type (e.g. "overview")
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructureType(pub String);

impl From<String> for StructureType {
    fn from(s: String) -> Self {
        StructureType(s)
    }
}

impl From<&str> for StructureType {
    fn from(s: &str) -> Self {
        StructureType(s.to_string())
    }
}

impl AsRef<str> for StructureType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StructureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Content type of a section container
pub const SECTION_TYPE: &str = "section";

/// Content type of a block container
pub const BLOCK_TYPE: &str = "block";

/// One property of a structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyDefinition {
    pub name: String,

    /// Content type key, e.g. `text_line` or `text_editor`
    pub content_type: String,

    #[serde(default)]
    pub mandatory: bool,

    /// Whether the value is stored per locale
    #[serde(default = "default_multilingual")]
    pub multilingual: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_occurs: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_occurs: Option<u32>,

    /// Localized titles keyed by locale
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub titles: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Nested properties of a section
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PropertyDefinition>,

    /// Types of a block
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<BlockType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_type: Option<String>,
}

fn default_multilingual() -> bool {
    true
}

impl PropertyDefinition {
    /// Create an optional, multilingual property
    pub fn new(name: impl Into<String>, content_type: impl Into<String>) -> Self {
        PropertyDefinition {
            name: name.into(),
            content_type: content_type.into(),
            mandatory: false,
            multilingual: true,
            min_occurs: None,
            max_occurs: None,
            titles: BTreeMap::new(),
            tags: Vec::new(),
            children: Vec::new(),
            types: Vec::new(),
            default_type: None,
        }
    }

    /// Create a section holding the given properties
    pub fn section(name: impl Into<String>, children: Vec<PropertyDefinition>) -> Self {
        let mut section = Self::new(name, SECTION_TYPE);
        section.children = children;
        section
    }

    pub fn mandatory(mut self, mandatory: bool) -> Self {
        self.mandatory = mandatory;
        self
    }

    pub fn multilingual(mut self, multilingual: bool) -> Self {
        self.multilingual = multilingual;
        self
    }

    pub fn with_title(mut self, locale: impl Into<String>, title: impl Into<String>) -> Self {
        self.titles.insert(locale.into(), title.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn is_section(&self) -> bool {
        self.content_type == SECTION_TYPE
    }

    pub fn is_block(&self) -> bool {
        self.content_type == BLOCK_TYPE
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// A selectable type of a block property
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlockType {
    pub name: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub titles: BTreeMap<String, String>,

    #[serde(default)]
    pub properties: Vec<PropertyDefinition>,
}

/// A named content template for one document type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StructureMetadata {
    /// Structure type key
    pub name: StructureType,

    /// Document type alias the structure was loaded for
    pub document_type: String,

    /// File the structure was loaded from
    pub source: PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,

    /// Cache lifetime in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_lifetime: Option<u64>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub titles: BTreeMap<String, String>,

    /// Properties in declaration order
    pub properties: Vec<PropertyDefinition>,
}

impl StructureMetadata {
    /// Create a new structure without optional attributes
    pub fn new(
        name: impl Into<StructureType>,
        document_type: impl Into<String>,
        source: impl AsRef<Path>,
        properties: Vec<PropertyDefinition>,
    ) -> Self {
        StructureMetadata {
            name: name.into(),
            document_type: document_type.into(),
            source: source.as_ref().to_path_buf(),
            view: None,
            controller: None,
            cache_lifetime: None,
            titles: BTreeMap::new(),
            properties,
        }
    }

    /// Create a new structure builder
    pub fn builder(name: impl Into<StructureType>) -> StructureBuilder {
        StructureBuilder::new(name.into())
    }

    /// Look up a property by name, descending into sections
    pub fn property(&self, name: &str) -> Option<&PropertyDefinition> {
        self.content_properties().find(|p| p.name == name)
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.property(name).is_some()
    }

    /// Properties that carry content, with sections flattened away
    pub fn content_properties(&self) -> impl Iterator<Item = &PropertyDefinition> {
        let mut flat = Vec::new();
        flatten(&self.properties, &mut flat);
        flat.into_iter()
    }

    /// Properties carrying the given tag
    pub fn properties_by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a PropertyDefinition> {
        self.content_properties().filter(move |p| p.has_tag(tag))
    }

    /// Title in the given locale, if one is defined
    pub fn title(&self, locale: &str) -> Option<&str> {
        self.titles.get(locale).map(String::as_str)
    }
}

fn flatten<'a>(properties: &'a [PropertyDefinition], out: &mut Vec<&'a PropertyDefinition>) {
    for property in properties {
        if property.is_section() {
            flatten(&property.children, out);
        } else {
            out.push(property);
        }
    }
}

/// Builder for creating structures with a fluent API
#[derive(Debug)]
pub struct StructureBuilder {
    name: StructureType,
    document_type: Option<String>,
    source: Option<PathBuf>,
    view: Option<String>,
    controller: Option<String>,
    cache_lifetime: Option<u64>,
    titles: BTreeMap<String, String>,
    properties: Vec<PropertyDefinition>,
}

impl StructureBuilder {
    pub fn new(name: StructureType) -> Self {
        StructureBuilder {
            name,
            document_type: None,
            source: None,
            view: None,
            controller: None,
            cache_lifetime: None,
            titles: BTreeMap::new(),
            properties: Vec::new(),
        }
    }

    pub fn document_type(mut self, document_type: impl Into<String>) -> Self {
        self.document_type = Some(document_type.into());
        self
    }

    pub fn source(mut self, source: impl AsRef<Path>) -> Self {
        self.source = Some(source.as_ref().to_path_buf());
        self
    }

    pub fn view(mut self, view: impl Into<String>) -> Self {
        self.view = Some(view.into());
        self
    }

    pub fn controller(mut self, controller: impl Into<String>) -> Self {
        self.controller = Some(controller.into());
        self
    }

    pub fn cache_lifetime(mut self, seconds: u64) -> Self {
        self.cache_lifetime = Some(seconds);
        self
    }

    pub fn title(mut self, locale: impl Into<String>, title: impl Into<String>) -> Self {
        self.titles.insert(locale.into(), title.into());
        self
    }

    pub fn property(mut self, property: PropertyDefinition) -> Self {
        self.properties.push(property);
        self
    }

    pub fn properties(mut self, properties: impl IntoIterator<Item = PropertyDefinition>) -> Self {
        self.properties.extend(properties);
        self
    }

    /// Build the structure; the document type defaults to an empty alias
    pub fn build(self) -> StructureMetadata {
        StructureMetadata {
            name: self.name,
            document_type: self.document_type.unwrap_or_default(),
            source: self.source.unwrap_or_default(),
            view: self.view,
            controller: self.controller,
            cache_lifetime: self.cache_lifetime,
            titles: self.titles,
            properties: self.properties,
        }
    }
}
