use std::fmt::Write as _;

use super::{Render, RenderError};
use crate::ast::{Block, ElementNode, Node};

/// HTML output for documents written with `html.<tag>` elements.
///
/// Each element takes either `{body}` or `{attributes}{body}`; every
/// `#key{value}` element of the attributes block becomes an attribute.
#[derive(Debug, Clone, Copy, Default)]
pub struct Html {
    pub inline: bool,
}

const TAGS: &[&str] = &[
    "head", "title", "body", "main", "section", "p", "h1", "h2", "h3", "h4", "h5", "h6", "ul",
    "ol", "li", "strong", "em", "b", "i", "u", "code", "pre", "div", "span", "img", "figure",
];

fn tag_for(name: &str) -> Option<&'static str> {
    let tag = name.strip_prefix("html.")?;
    TAGS.iter().copied().find(|candidate| *candidate == tag)
}

/// Escape the five characters that are significant in HTML text and
/// attribute values.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '\'' => out.push_str("&#39;"),
            '"' => out.push_str("&#34;"),
            _ => out.push(c),
        }
    }
    out
}

impl Html {
    const fn newline(self) -> &'static str {
        if self.inline { "" } else { "\n" }
    }

    fn write_block(self, out: &mut String, block: &Block) -> Result<(), RenderError> {
        for node in block {
            match node {
                Node::Text(text) => {
                    let trimmed = text.text.trim();
                    if !trimmed.is_empty() {
                        out.push_str(&escape(trimmed));
                        out.push_str(self.newline());
                    }
                }
                Node::Element(element) => {
                    let tag = tag_for(&element.name)
                        .ok_or_else(|| RenderError::UnknownElement(element.name.clone()))?;
                    self.write_element(out, tag, element)?;
                }
            }
        }
        Ok(())
    }

    fn write_element(
        self,
        out: &mut String,
        tag: &str,
        element: &ElementNode,
    ) -> Result<(), RenderError> {
        let (attributes, body) = match element.arguments.as_slice() {
            [body] => (None, body),
            [attributes, body] => (Some(attributes), body),
            _ => {
                return Err(RenderError::WrongArity {
                    name: element.name.clone(),
                    found: element.arguments.len(),
                });
            }
        };

        let _ = write!(out, "<{tag}");
        for attribute in attributes.into_iter().flat_map(Block::elements) {
            let value = attribute
                .arguments
                .first()
                .map(Block::text_content)
                .unwrap_or_default();
            let _ = write!(out, " {}=\"{}\"", attribute.name, escape(&value));
        }
        out.push('>');
        out.push_str(self.newline());

        self.write_block(out, body)?;

        let _ = write!(out, "</{tag}>");
        out.push_str(self.newline());
        Ok(())
    }
}

impl Render for Html {
    fn render(&self, block: &Block) -> Result<String, RenderError> {
        let mut out = String::from("<!DOCTYPE html>");
        out.push_str(self.newline());
        out.push_str("<html>");
        out.push_str(self.newline());
        self.write_block(&mut out, block)?;
        out.push_str("</html>");
        out.push_str(self.newline());
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_str;

    fn render(input: &str, inline: bool) -> Result<String, RenderError> {
        let block = parse_str(input).expect("parse failed");
        Html { inline }.render(&block)
    }

    #[test]
    fn escapes_special_characters() {
        assert_eq!(escape(r#"<a href="x">&'"#), "&lt;a href=&#34;x&#34;&gt;&amp;&#39;");
    }

    #[test]
    fn paragraph() {
        let out = render("#html.p{ Hello <world> }", false).expect("render failed");
        assert_eq!(
            out,
            "<!DOCTYPE html>\n<html>\n<p>\nHello &lt;world&gt;\n</p>\n</html>\n"
        );
    }

    #[test]
    fn inline_has_no_newlines() {
        let out = render("#html.div{#html.em{hi} there}", true).expect("render failed");
        assert_eq!(
            out,
            "<!DOCTYPE html><html><div><em>hi</em>there</div></html>"
        );
    }

    #[test]
    fn attributes_keep_source_order() {
        let out = render("#html.img{#src{a.png}#alt{An \"image\"}}{}", true)
            .expect("render failed");
        assert_eq!(
            out,
            "<!DOCTYPE html><html><img src=\"a.png\" alt=\"An &#34;image&#34;\"></img></html>"
        );
    }

    #[test]
    fn blank_text_is_dropped() {
        let out = render("\n  #html.b{x}\n\n", true).expect("render failed");
        assert_eq!(out, "<!DOCTYPE html><html><b>x</b></html>");
    }

    #[test]
    fn unknown_element() {
        let err = render("#blink{x}", false).expect_err("should fail");
        assert!(matches!(err, RenderError::UnknownElement(ref name) if name == "blink"));
        let err = render("#html.marquee{x}", false).expect_err("should fail");
        assert!(matches!(err, RenderError::UnknownElement(_)));
    }

    #[test]
    fn too_many_arguments() {
        let err = render("#html.p{a}{b}{c}", false).expect_err("should fail");
        assert!(matches!(err, RenderError::WrongArity { found: 3, .. }));
    }
}
