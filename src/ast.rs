//! Position-free syntax tree shared by the template engine and the
//! renderers.
//!
//! Serializes to the node encoding `{"type":"text","text":...}` /
//! `{"type":"element","name":...,"args":[[...], ...]}`, with blocks as
//! plain arrays of nodes.

use serde::{Deserialize, Serialize};

use crate::parser::{ParseBlock, ParseNode};

/// Ordered sequence of nodes: a whole document or one element argument.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Block(pub Vec<Node>);

/// A text or element node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Text(TextNode),
    Element(ElementNode),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextNode {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementNode {
    pub name: String,
    #[serde(rename = "args")]
    pub arguments: Vec<Block>,
}

/// Compile a parse tree into a [`Block`], dropping token information.
#[must_use]
pub fn compile(block: &ParseBlock) -> Block {
    block
        .children
        .iter()
        .map(|child| match child {
            ParseNode::Text(text) => Node::text(text.text.clone()),
            ParseNode::Element(element) => Node::Element(ElementNode {
                name: element.name.clone(),
                arguments: element.arguments.iter().map(compile).collect(),
            }),
        })
        .collect()
}

impl Node {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(TextNode { text: text.into() })
    }

    #[must_use]
    pub fn element(name: impl Into<String>, arguments: Vec<Block>) -> Self {
        Self::Element(ElementNode {
            name: name.into(),
            arguments,
        })
    }
}

impl Block {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.0.iter()
    }

    /// Concatenated text of the direct text children; elements are
    /// skipped.
    #[must_use]
    pub fn text_content(&self) -> String {
        self.0
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.text.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Direct element children, in order.
    pub fn elements(&self) -> impl Iterator<Item = &ElementNode> {
        self.0.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// First element among the direct children.
    #[must_use]
    pub fn first_element(&self) -> Option<&ElementNode> {
        self.elements().next()
    }

    /// The single text child of this block, if that is all it holds.
    #[must_use]
    pub fn as_single_text(&self) -> Option<&str> {
        match self.0.as_slice() {
            [Node::Text(text)] => Some(&text.text),
            _ => None,
        }
    }

    /// Depth-first pre-order walk: each node is visited before the
    /// arguments of an element. Stops at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `visit`.
    pub fn walk<E>(&self, visit: &mut impl FnMut(&Node) -> Result<(), E>) -> Result<(), E> {
        for node in &self.0 {
            visit(node)?;
            if let Node::Element(element) = node {
                for argument in &element.arguments {
                    argument.walk(visit)?;
                }
            }
        }
        Ok(())
    }

    /// Rebuild this block with every text node passed through `map`,
    /// descending into element arguments.
    #[must_use]
    pub fn map_text(&self, map: &impl Fn(&str) -> String) -> Self {
        self.0
            .iter()
            .map(|node| match node {
                Node::Text(text) => Node::text(map(&text.text)),
                Node::Element(element) => Node::Element(ElementNode {
                    name: element.name.clone(),
                    arguments: element
                        .arguments
                        .iter()
                        .map(|argument| argument.map_text(map))
                        .collect(),
                }),
            })
            .collect()
    }
}

impl From<Vec<Node>> for Block {
    fn from(nodes: Vec<Node>) -> Self {
        Self(nodes)
    }
}

impl FromIterator<Node> for Block {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Block {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
