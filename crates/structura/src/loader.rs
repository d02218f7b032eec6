//! Loading structure definitions from their source files

use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::LoadError;
use crate::metadata::{BLOCK_TYPE, BlockType, PropertyDefinition, StructureMetadata};

/// Source of structure metadata
///
/// The factory decides *which* file to load; the loader only turns one
/// file into a [`StructureMetadata`]. `document_type` is the alias of the
/// search path the file was found in.
pub trait MetadataLoader: Send + Sync {
    fn load(&self, source: &Path, document_type: &str) -> Result<StructureMetadata, LoadError>;
}

impl<L: MetadataLoader + ?Sized> MetadataLoader for std::sync::Arc<L> {
    fn load(&self, source: &Path, document_type: &str) -> Result<StructureMetadata, LoadError> {
        (**self).load(source, document_type)
    }
}

/// Loads XML template definitions
///
/// ```xml
/// <template>
///     <key>overview</key>
///     <view>pages/overview</view>
///     <meta><title lang="en">Overview</title></meta>
///     <properties>
///         <property name="title" type="text_line" mandatory="true">
///             <tag name="sulu.rlp.part"/>
///         </property>
///     </properties>
/// </template>
/// ```
#[derive(Debug, Default, Clone)]
pub struct XmlStructureLoader;

impl XmlStructureLoader {
    pub fn new() -> Self {
        Self
    }

    /// Parse a template from XML content
    pub fn parse(
        &self,
        content: &str,
        source: &Path,
        document_type: &str,
    ) -> Result<StructureMetadata, LoadError> {
        let mut parser = XmlParser::new(content, source);
        parser.template(document_type)
    }
}

impl MetadataLoader for XmlStructureLoader {
    fn load(&self, source: &Path, document_type: &str) -> Result<StructureMetadata, LoadError> {
        let content = std::fs::read_to_string(source).map_err(|e| LoadError::new(source, e))?;
        self.parse(&content, source, document_type)
    }
}

struct XmlParser<'a> {
    reader: Reader<&'a [u8]>,
    source: &'a Path,
}

impl<'a> XmlParser<'a> {
    fn new(content: &'a str, source: &'a Path) -> Self {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);
        Self { reader, source }
    }

    fn error(&self, reason: impl std::fmt::Display) -> LoadError {
        LoadError::new(self.source, reason)
    }

    fn next(&mut self) -> Result<Event<'a>, LoadError> {
        self.reader.read_event().map_err(|e| LoadError::new(self.source, e))
    }

    fn skip(&mut self, start: &BytesStart<'a>) -> Result<(), LoadError> {
        self.reader
            .read_to_end(start.name())
            .map(|_| ())
            .map_err(|e| LoadError::new(self.source, e))
    }

    fn attribute(&self, start: &BytesStart<'a>, name: &str) -> Result<Option<String>, LoadError> {
        match start.try_get_attribute(name).map_err(|e| self.error(e))? {
            Some(attribute) => {
                let value = attribute.unescape_value().map_err(|e| self.error(e))?;
                Ok(Some(value.into_owned()))
            }
            None => Ok(None),
        }
    }

    fn required_attribute(&self, start: &BytesStart<'a>, name: &str) -> Result<String, LoadError> {
        self.attribute(start, name)?.ok_or_else(|| {
            self.error(format!(
                "element <{}> is missing attribute \"{}\"",
                String::from_utf8_lossy(start.local_name().as_ref()),
                name
            ))
        })
    }

    fn bool_attribute(&self, start: &BytesStart<'a>, name: &str, default: bool) -> Result<bool, LoadError> {
        match self.attribute(start, name)?.as_deref() {
            None => Ok(default),
            Some("true") | Some("1") => Ok(true),
            Some("false") | Some("0") => Ok(false),
            Some(other) => Err(self.error(format!("invalid boolean \"{}\" for attribute \"{}\"", other, name))),
        }
    }

    fn occurs_attribute(&self, start: &BytesStart<'a>, name: &str) -> Result<Option<u32>, LoadError> {
        self.attribute(start, name)?
            .map(|value| {
                value
                    .parse()
                    .map_err(|_| self.error(format!("invalid number \"{}\" for attribute \"{}\"", value, name)))
            })
            .transpose()
    }

    /// Text content up to the closing tag of the current element
    fn text(&mut self) -> Result<String, LoadError> {
        let mut text = String::new();
        loop {
            match self.next()? {
                Event::Text(t) => text.push_str(&t.unescape().map_err(|e| self.error(e))?),
                Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c.into_inner())),
                Event::Start(e) => self.skip(&e)?,
                Event::End(_) => return Ok(text),
                Event::Eof => return Err(self.error("unexpected end of document")),
                _ => {}
            }
        }
    }

    fn template(&mut self, document_type: &str) -> Result<StructureMetadata, LoadError> {
        let stem = self
            .source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut structure = StructureMetadata::new(stem, document_type, self.source, Vec::new());
        let mut seen_root = false;

        loop {
            match self.next()? {
                Event::Start(e) if !seen_root => {
                    self.expect_root(&e)?;
                    seen_root = true;
                }
                Event::Empty(e) if !seen_root => {
                    self.expect_root(&e)?;
                    return Ok(structure);
                }
                Event::Start(e) => match e.local_name().as_ref() {
                    b"key" => structure.name = self.text()?.into(),
                    b"view" => structure.view = Some(self.text()?),
                    b"controller" => structure.controller = Some(self.text()?),
                    b"cacheLifetime" => {
                        let value = self.text()?;
                        let seconds = value
                            .parse()
                            .map_err(|_| self.error(format!("invalid cache lifetime \"{}\"", value)))?;
                        structure.cache_lifetime = Some(seconds);
                    }
                    b"meta" => structure.titles = self.meta()?,
                    b"properties" => structure.properties = self.properties()?,
                    _ => self.skip(&e)?,
                },
                Event::End(_) => return Ok(structure),
                Event::Eof if seen_root => return Err(self.error("unexpected end of document")),
                Event::Eof => return Err(self.error("document has no <template> element")),
                _ => {}
            }
        }
    }

    fn expect_root(&self, start: &BytesStart<'a>) -> Result<(), LoadError> {
        if start.local_name().as_ref() != b"template" {
            return Err(self.error(format!(
                "expected <template> root element, found <{}>",
                String::from_utf8_lossy(start.local_name().as_ref())
            )));
        }
        Ok(())
    }

    fn meta(&mut self) -> Result<std::collections::BTreeMap<String, String>, LoadError> {
        let mut titles = std::collections::BTreeMap::new();
        loop {
            match self.next()? {
                Event::Start(e) if e.local_name().as_ref() == b"title" => {
                    let lang = self.required_attribute(&e, "lang")?;
                    titles.insert(lang, self.text()?);
                }
                Event::Start(e) => self.skip(&e)?,
                Event::End(_) => return Ok(titles),
                Event::Eof => return Err(self.error("unexpected end of document in <meta>")),
                _ => {}
            }
        }
    }

    fn properties(&mut self) -> Result<Vec<PropertyDefinition>, LoadError> {
        let mut properties = Vec::new();
        loop {
            match self.next()? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"property" => {
                        let mut property = self.property_head(&e)?;
                        self.property_body(&mut property)?;
                        properties.push(property);
                    }
                    b"section" => properties.push(self.section(&e)?),
                    b"block" => properties.push(self.block(&e)?),
                    _ => self.skip(&e)?,
                },
                Event::Empty(e) if e.local_name().as_ref() == b"property" => {
                    properties.push(self.property_head(&e)?);
                }
                Event::End(_) => return Ok(properties),
                Event::Eof => return Err(self.error("unexpected end of document in <properties>")),
                _ => {}
            }
        }
    }

    fn property_head(&self, start: &BytesStart<'a>) -> Result<PropertyDefinition, LoadError> {
        let name = self.required_attribute(start, "name")?;
        let content_type = self.required_attribute(start, "type")?;
        let mut property = PropertyDefinition::new(name, content_type)
            .mandatory(self.bool_attribute(start, "mandatory", false)?)
            .multilingual(self.bool_attribute(start, "multilingual", true)?);
        property.min_occurs = self.occurs_attribute(start, "minOccurs")?;
        property.max_occurs = self.occurs_attribute(start, "maxOccurs")?;
        Ok(property)
    }

    fn property_body(&mut self, property: &mut PropertyDefinition) -> Result<(), LoadError> {
        loop {
            match self.next()? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"meta" => property.titles = self.meta()?,
                    b"tag" => {
                        property.tags.push(self.required_attribute(&e, "name")?);
                        self.skip(&e)?;
                    }
                    _ => self.skip(&e)?,
                },
                Event::Empty(e) if e.local_name().as_ref() == b"tag" => {
                    property.tags.push(self.required_attribute(&e, "name")?);
                }
                Event::End(_) => return Ok(()),
                Event::Eof => return Err(self.error("unexpected end of document in <property>")),
                _ => {}
            }
        }
    }

    fn section(&mut self, start: &BytesStart<'a>) -> Result<PropertyDefinition, LoadError> {
        let mut section = PropertyDefinition::section(self.required_attribute(start, "name")?, Vec::new());
        loop {
            match self.next()? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"meta" => section.titles = self.meta()?,
                    b"properties" => section.children = self.properties()?,
                    _ => self.skip(&e)?,
                },
                Event::End(_) => return Ok(section),
                Event::Eof => return Err(self.error("unexpected end of document in <section>")),
                _ => {}
            }
        }
    }

    fn block(&mut self, start: &BytesStart<'a>) -> Result<PropertyDefinition, LoadError> {
        let mut block = PropertyDefinition::new(self.required_attribute(start, "name")?, BLOCK_TYPE)
            .mandatory(self.bool_attribute(start, "mandatory", false)?)
            .multilingual(self.bool_attribute(start, "multilingual", true)?);
        block.default_type = self.attribute(start, "default-type")?;
        block.min_occurs = self.occurs_attribute(start, "minOccurs")?;
        block.max_occurs = self.occurs_attribute(start, "maxOccurs")?;

        loop {
            match self.next()? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"meta" => block.titles = self.meta()?,
                    b"types" => block.types = self.block_types()?,
                    _ => self.skip(&e)?,
                },
                Event::End(_) => break,
                Event::Eof => return Err(self.error("unexpected end of document in <block>")),
                _ => {}
            }
        }

        if let Some(default_type) = &block.default_type {
            if !block.types.iter().any(|t| &t.name == default_type) {
                return Err(self.error(format!(
                    "block \"{}\" has unknown default type \"{}\"",
                    block.name, default_type
                )));
            }
        }

        Ok(block)
    }

    fn block_types(&mut self) -> Result<Vec<BlockType>, LoadError> {
        let mut types = Vec::new();
        loop {
            match self.next()? {
                Event::Start(e) if e.local_name().as_ref() == b"type" => {
                    let mut block_type = BlockType {
                        name: self.required_attribute(&e, "name")?,
                        titles: Default::default(),
                        properties: Vec::new(),
                    };
                    loop {
                        match self.next()? {
                            Event::Start(inner) => match inner.local_name().as_ref() {
                                b"meta" => block_type.titles = self.meta()?,
                                b"properties" => block_type.properties = self.properties()?,
                                _ => self.skip(&inner)?,
                            },
                            Event::End(_) => break,
                            Event::Eof => return Err(self.error("unexpected end of document in <type>")),
                            _ => {}
                        }
                    }
                    types.push(block_type);
                }
                Event::Start(e) => self.skip(&e)?,
                Event::End(_) => return Ok(types),
                Event::Eof => return Err(self.error("unexpected end of document in <types>")),
                _ => {}
            }
        }
    }
}
