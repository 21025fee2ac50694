use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use super::{Render, RenderError};
use crate::ast::Block;

/// JSON encoding of the tree: pretty-printed with four-space indentation,
/// or on a single line when `inline` is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json {
    pub inline: bool,
}

impl Render for Json {
    fn render(&self, block: &Block) -> Result<String, RenderError> {
        if self.inline {
            return Ok(serde_json::to_string(block)?);
        }

        let mut out = Vec::new();
        let mut serializer =
            Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
        block.serialize(&mut serializer)?;
        // serde_json only ever writes valid UTF-8
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}
