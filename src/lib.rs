//! Lexer, parser, template engine, and renderers for the textml markup
//! language.
//!
//! textml is a brace-delimited markup language: `#name{arg}{arg}...`
//! introduces an element with ordered block arguments, and everything else
//! is literal text. Opening an argument with a longer brace run (`{{`,
//! `{{{`, ...) lets shorter runs appear inside it as plain text.
//!
//! Documents are tokenized, parsed into a positioned tree, and compiled into
//! a position-free [`Block`]. The [`template`] engine evaluates a block as a
//! template program; the [`render`] module turns it into JSON, HTML, or a
//! debug dump.
//!
//! # Quick start
//!
//! ## Evaluate a template
//!
//! ```
//! use textml::evaluate_str;
//!
//! let output = evaluate_str("#define{name}{World}Hello, #{name}!").unwrap();
//! assert_eq!(output, "Hello, World!");
//! ```
//!
//! ## Seed variables and render to JSON
//!
//! ```
//! use textml::{parse_str, render, template::{Config, Engine}};
//!
//! let doc = parse_str("#foreach{n}{items}{[#{n}]}").unwrap();
//! let mut engine = Engine::new(Config::default())
//!     .with_variable("items", vec!["a", "b"]);
//! assert_eq!(engine.evaluate(&doc).unwrap(), "[a][b]");
//!
//! let json = render::renderer("json.inline").unwrap().render(&doc).unwrap();
//! assert!(json.starts_with(r#"[{"type":"element","name":"foreach""#));
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod render;
pub mod template;
pub mod token;
pub mod value;

pub use ast::{Block, ElementNode, Node, TextNode, compile};
pub use lexer::{LexError, LexErrorKind, Lexer, tokenize};
pub use parser::{ParseBlock, ParseError, ParseErrorKind, ParseNode, parse};
pub use render::{Render, RenderError};
pub use template::{Config, Engine, Environment, EvalError};
pub use token::{Span, Token, TokenKind};
pub use value::Value;

/// Unified error type covering lexing, parsing, and evaluation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A lexer error.
    #[error("{0}")]
    Lex(#[from] LexError),
    /// A parser error.
    #[error("{0}")]
    Parse(#[from] ParseError),
    /// A template evaluation error.
    #[error("{0}")]
    Eval(#[from] EvalError),
}

/// Tokenize, parse, and compile a source string in one step.
pub fn parse_str(input: &str) -> Result<Block, Error> {
    let tokens = tokenize(input)?;
    Ok(compile(&parse(&tokens)?))
}

/// Compile and evaluate a source string with a default [`Engine`].
pub fn evaluate_str(input: &str) -> Result<String, Error> {
    let block = parse_str(input)?;
    Ok(Engine::default().evaluate(&block)?)
}
