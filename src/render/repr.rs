use super::{Render, RenderError};
use crate::ast::Block;

/// Debug dump of the tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct Repr;

impl Render for Repr {
    fn render(&self, block: &Block) -> Result<String, RenderError> {
        Ok(format!("{block:#?}\n"))
    }
}
