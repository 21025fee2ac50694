//! Renderers that turn a compiled [`Block`] into an output format.
//!
//! Renderers only read the tree. They are looked up by name through
//! [`renderer`], which is how the command-line `transpile` command picks
//! its output format.

mod document;
mod html;
mod json;
mod repr;

pub use document::{Document, Metadata, MetadataValue, RenderedDocument};
pub use html::Html;
pub use json::Json;
pub use repr::Repr;

use crate::ast::Block;

/// Error produced while rendering.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("invalid html element with name {0:?}")]
    UnknownElement(String),
    #[error("invalid number of arguments for element {name:?}: {found}")]
    WrongArity { name: String, found: usize },
    #[error("unexpected element {0:?} outside of metadata")]
    UnexpectedElement(String),
    #[error("invalid dict value with identifier {0:?}")]
    InvalidDictValue(String),
    #[error("cannot serialize to JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// An output format for compiled documents.
pub trait Render {
    /// Render `block` to a string.
    ///
    /// # Errors
    ///
    /// Returns `RenderError` when the tree cannot be expressed in the
    /// target format.
    fn render(&self, block: &Block) -> Result<String, RenderError>;
}

/// Names accepted by [`renderer`].
pub const RENDERERS: &[&str] = &["repr", "json", "json.inline", "html", "html.inline"];

/// Look up a renderer by name.
#[must_use]
pub fn renderer(name: &str) -> Option<Box<dyn Render>> {
    match name {
        "repr" => Some(Box::new(Repr)),
        "json" => Some(Box::new(Json { inline: false })),
        "json.inline" => Some(Box::new(Json { inline: true })),
        "html" => Some(Box::new(Html { inline: false })),
        "html.inline" => Some(Box::new(Html { inline: true })),
        _ => None,
    }
}
