use std::collections::BTreeMap;

use serde::Serialize;

use super::{Render, RenderError};
use crate::ast::{Block, ElementNode, Node};

/// Metadata collected from `#metadata{...}` blocks, keyed by entry name.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A metadata entry: plain text or a nested `#dict{...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Text(String),
    Dict(Metadata),
}

/// Output of [`Document::render_document`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedDocument {
    pub text: String,
    pub metadata: Metadata,
}

/// Plain document output with a metadata header.
///
/// Top-level text is copied verbatim. `#metadata{ #key{value} ... }`
/// elements contribute entries to the metadata map, later entries
/// replacing earlier ones; any other top-level element is an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct Document;

impl Document {
    /// Split `block` into its text and its metadata.
    ///
    /// # Errors
    ///
    /// Returns `RenderError` for top-level elements other than `metadata`,
    /// for entries that do not take exactly one argument, and for nested
    /// elements other than `dict`.
    pub fn render_document(self, block: &Block) -> Result<RenderedDocument, RenderError> {
        let mut document = RenderedDocument::default();
        for node in block {
            match node {
                Node::Text(text) => document.text.push_str(&text.text),
                Node::Element(element) if element.name == "metadata" => {
                    let entries = dict_entries(single_argument(element)?)?;
                    document.metadata.extend(entries);
                }
                Node::Element(element) => {
                    return Err(RenderError::UnexpectedElement(element.name.clone()));
                }
            }
        }
        Ok(document)
    }
}

impl Render for Document {
    fn render(&self, block: &Block) -> Result<String, RenderError> {
        Ok(self.render_document(block)?.text)
    }
}

fn single_argument(element: &ElementNode) -> Result<&Block, RenderError> {
    match element.arguments.as_slice() {
        [argument] => Ok(argument),
        arguments => Err(RenderError::WrongArity {
            name: element.name.clone(),
            found: arguments.len(),
        }),
    }
}

fn dict_entries(block: &Block) -> Result<Metadata, RenderError> {
    let mut entries = Metadata::new();
    for entry in block.elements() {
        let value = dict_value(single_argument(entry)?)?;
        entries.insert(entry.name.clone(), value);
    }
    Ok(entries)
}

fn dict_value(block: &Block) -> Result<MetadataValue, RenderError> {
    match block.first_element() {
        None => Ok(MetadataValue::Text(block.text_content().trim().to_string())),
        Some(element) if element.name == "dict" => {
            Ok(MetadataValue::Dict(dict_entries(single_argument(element)?)?))
        }
        Some(element) => Err(RenderError::InvalidDictValue(element.name.clone())),
    }
}
