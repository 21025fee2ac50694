//! Template evaluation engine.
//!
//! Interprets a compiled [`Block`] as a small template program. Literal
//! text passes through; elements are built-in directives:
//!
//! | Directive | Arguments | Effect |
//! |---|---|---|
//! | `#import{module}` | 1 | Evaluates a module through the configured [`Loader`] for its bindings |
//! | `#template{name}{body}` | 2 | Binds `body` unevaluated as a template |
//! | `#define{name}{value}` | 2 | Evaluates `value` and binds it as a variable |
//! | `#extends{name}{overrides}` | 1-2 | Evaluates `overrides`, then the template `name` |
//! | `#if{cond}{then}{else}` | 2-3 | Conditional; `#unless` inverts the condition |
//! | `#foreach{item}{list}{body}` | 3 | Evaluates `body` once per item of `list` |
//! | `#intersperse{list}{separator}` | 2 | Joins the items of `list` |
//! | `#char{name}` | 1 | `space`, `tab` or `newline` |
//! | `#inline{body}` | 1 | Evaluates `body` with line breaks and indentation removed |
//! | `#{name}` | 1 | Value of the variable or template `name` |
//!
//! All bindings live in one [`Environment`] shared by every nested
//! evaluation, so later bindings replace earlier ones. This is what lets
//! the override block of `#extends` redefine what the parent template
//! refers to.
//!
//! # Example
//!
//! ```
//! use textml::{parse_str, template::Engine};
//!
//! let doc = parse_str("#template{base}{Document(#{body})}\
//!                      #extends{base}{#define{body}{Article}}").unwrap();
//! let output = Engine::default().evaluate(&doc).unwrap();
//! assert_eq!(output, "Document(Article)");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use crate::ast::{Block, ElementNode, Node};
use crate::value::{TypeError, Value};

/// Error produced during evaluation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("unknown directive #{name}")]
    UnknownDirective { name: String },
    #[error("#{name} expects {expected} argument(s), got {found}")]
    WrongArity {
        name: String,
        expected: String,
        found: usize,
    },
    #[error("no binding for {name:?}")]
    Unbound { name: String },
    #[error("no template named {name:?}")]
    UnboundTemplate { name: String },
    #[error("#{directive} expects a {expected} value, got {found}")]
    TypeMismatch {
        directive: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("unknown character name {name:?}")]
    UnknownChar { name: String },
    #[error("#import used but no module loader is configured")]
    NoLoader,
    #[error("cannot import {module:?}: {source}")]
    Import {
        module: String,
        #[source]
        source: ImportFailure,
    },
    /// Elements or template references nested past [`MAX_DEPTH`].
    #[error("evaluation of {name:?} nested more than {} levels deep", MAX_DEPTH)]
    RecursionLimit { name: String },
}

/// Deepest element nesting the engine evaluates, counting template and
/// module expansion.
pub const MAX_DEPTH: usize = 128;

/// The [`LoadError`] behind a failed `#import`, shared so that
/// [`EvalError`] stays cloneable.
///
/// Two failures are equal when their messages are.
#[derive(Debug, Clone, thiserror::Error)]
#[error(transparent)]
pub struct ImportFailure(Arc<LoadError>);

impl ImportFailure {
    #[must_use]
    pub fn load_error(&self) -> &LoadError {
        &self.0
    }
}

impl From<LoadError> for ImportFailure {
    fn from(err: LoadError) -> Self {
        Self(Arc::new(err))
    }
}

impl PartialEq for ImportFailure {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.to_string() == other.0.to_string()
    }
}

impl Eq for ImportFailure {}

/// Error reported by a [`Loader`].
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Document(#[from] crate::Error),
    #[error("module not found: {0}")]
    NotFound(String),
}

/// Resolves `#import` directives.
///
/// A loader obtains the document named by `module`, compiles it, and
/// evaluates it against `engine` so that its bindings become visible to
/// the importing document.
pub trait Loader {
    fn load(&self, engine: &mut Engine, module: &str) -> Result<(), LoadError>;
}

impl<F> Loader for F
where
    F: Fn(&mut Engine, &str) -> Result<(), LoadError>,
{
    fn load(&self, engine: &mut Engine, module: &str) -> Result<(), LoadError> {
        self(engine, module)
    }
}

/// Loads modules from files relative to a root directory.
#[derive(Debug, Clone, Default)]
pub struct FileLoader {
    root: PathBuf,
}

impl FileLoader {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Loader for FileLoader {
    fn load(&self, engine: &mut Engine, module: &str) -> Result<(), LoadError> {
        let path = self.root.join(module);
        log::debug!("loading module {}", path.display());

        let source = std::fs::read_to_string(&path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;
        let block = crate::parse_str(&source)?;
        engine
            .evaluate_block(&block)
            .map_err(crate::Error::from)?;
        Ok(())
    }
}

/// Loads modules from an in-memory table of sources.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    modules: HashMap<String, String>,
}

impl MemoryLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_module(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.modules.insert(name.into(), source.into());
        self
    }
}

impl Loader for MemoryLoader {
    fn load(&self, engine: &mut Engine, module: &str) -> Result<(), LoadError> {
        let source = self
            .modules
            .get(module)
            .ok_or_else(|| LoadError::NotFound(module.to_string()))?;
        let block = crate::parse_str(source)?;
        engine
            .evaluate_block(&block)
            .map_err(crate::Error::from)?;
        Ok(())
    }
}

/// Engine configuration.
#[derive(Clone, Default)]
pub struct Config {
    /// Trim spaces around every literal text node.
    pub trim_spaces: bool,
    /// Loader used by `#import`; without one `#import` fails.
    pub loader: Option<Rc<dyn Loader>>,
}

impl Config {
    #[must_use]
    pub fn with_trim_spaces(mut self, trim_spaces: bool) -> Self {
        self.trim_spaces = trim_spaces;
        self
    }

    #[must_use]
    pub fn with_loader(mut self, loader: impl Loader + 'static) -> Self {
        self.loader = Some(Rc::new(loader));
        self
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("trim_spaces", &self.trim_spaces)
            .field("loader", &self.loader.as_ref().map(|_| "<loader>"))
            .finish()
    }
}

/// Variable and template bindings of one evaluation session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    pub variables: HashMap<String, Value>,
    pub templates: HashMap<String, Block>,
}

impl Environment {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    #[must_use]
    pub fn template(&self, name: &str) -> Option<&Block> {
        self.templates.get(name)
    }
}

/// How bare text is resolved where a value is expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    /// Literal or bound variable; anything else is an error.
    Strict,
    /// Literal or bound variable; anything else is plain text.
    Lenient,
}

/// The template evaluator.
#[derive(Debug, Default)]
pub struct Engine {
    pub config: Config,
    pub env: Environment,
    depth: usize,
}

enum Part {
    Text(String),
    Value(Option<Value>),
}

impl Engine {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            env: Environment::default(),
            depth: 0,
        }
    }

    /// Seed a variable before evaluation.
    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.env.variables.insert(name.into(), value.into());
        self
    }

    /// Seed a template before evaluation.
    #[must_use]
    pub fn with_template(mut self, name: impl Into<String>, block: Block) -> Self {
        self.env.templates.insert(name.into(), block);
        self
    }

    /// Seed several variables before evaluation.
    #[must_use]
    pub fn with_context<K, V>(mut self, variables: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.env.variables.extend(
            variables
                .into_iter()
                .map(|(name, value)| (name.into(), value.into())),
        );
        self
    }

    /// Replace the whole environment.
    #[must_use]
    pub fn with_environment(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    /// Evaluate a document and format the result as text.
    ///
    /// # Errors
    ///
    /// Returns the first `EvalError`; no partial output is produced.
    pub fn evaluate(&mut self, block: &Block) -> Result<String, EvalError> {
        match self.evaluate_block(block)? {
            Some(value) => self.stringify(value),
            None => Ok(String::new()),
        }
    }

    /// Evaluate a block to a value.
    ///
    /// A block whose only non-blank child is an element yields that
    /// element's value unchanged, so booleans and lists survive being
    /// wrapped in an argument. Any other block is concatenated into
    /// `Value::Text`.
    ///
    /// # Errors
    ///
    /// Returns the first `EvalError` raised by a nested directive.
    pub fn evaluate_block(&mut self, block: &Block) -> Result<Option<Value>, EvalError> {
        let mut parts = Vec::with_capacity(block.len());
        let mut elements = 0;
        let mut non_blank = 0;

        for node in block {
            match node {
                Node::Element(element) => {
                    elements += 1;
                    parts.push(Part::Value(self.evaluate_element(element)?));
                }
                Node::Text(text) => {
                    if !text.text.trim().is_empty() {
                        non_blank += 1;
                    }
                    let text = if self.config.trim_spaces {
                        text.text.trim_matches(' ')
                    } else {
                        text.text.as_str()
                    };
                    parts.push(Part::Text(text.to_string()));
                }
            }
        }

        if elements == 1 && non_blank == 0 {
            return Ok(parts.into_iter().find_map(|part| match part {
                Part::Value(value) => value,
                Part::Text(_) => None,
            }));
        }

        let mut out = String::new();
        for part in parts {
            match part {
                Part::Text(text) => out.push_str(&text),
                Part::Value(Some(value)) => out.push_str(&self.stringify(value)?),
                Part::Value(None) => {}
            }
        }
        Ok(Some(Value::Text(out)))
    }

    fn evaluate_element(&mut self, element: &ElementNode) -> Result<Option<Value>, EvalError> {
        if self.depth >= MAX_DEPTH {
            let name = match (element.name.as_str(), element.arguments.first()) {
                ("", Some(name)) => binding_name(name),
                (name, _) => name.to_string(),
            };
            return Err(EvalError::RecursionLimit { name });
        }
        self.depth += 1;
        let result = self.run_directive(element);
        self.depth -= 1;
        result
    }

    fn run_directive(&mut self, element: &ElementNode) -> Result<Option<Value>, EvalError> {
        match element.name.as_str() {
            "import" => self.import(element),
            "template" => {
                let [name, body] = expect_args::<2>(element)?;
                let name = binding_name(name);
                log::debug!("binding template {name:?}");
                self.env.templates.insert(name, body.clone());
                Ok(None)
            }
            "define" => {
                let [name, body] = expect_args::<2>(element)?;
                let name = binding_name(name);
                let value = self
                    .resolve(body, Lookup::Lenient)?
                    .unwrap_or_else(|| Value::Text(String::new()));
                log::debug!("binding variable {name:?} to {}", value.kind());
                self.env.variables.insert(name, value);
                Ok(None)
            }
            "extends" => self.extends(element),
            "if" | "unless" => self.conditional(element),
            "foreach" => {
                let [item, items, body] = expect_args::<3>(element)?;
                let item = binding_name(item);
                let items = self.list_variable(element, items)?;

                let mut out = String::new();
                for value in items {
                    self.env.variables.insert(item.clone(), value);
                    if let Some(result) = self.evaluate_block(body)? {
                        out.push_str(&self.stringify(result)?);
                    }
                }
                Ok(Some(Value::Text(out)))
            }
            "intersperse" => {
                let [items, separator] = expect_args::<2>(element)?;
                let items = self.list_variable(element, items)?;
                let separator = separator.text_content();

                let mut parts = Vec::with_capacity(items.len());
                for item in items {
                    parts.push(self.stringify(item)?);
                }
                Ok(Some(Value::Text(parts.join(&separator))))
            }
            "char" => {
                let [name] = expect_args::<1>(element)?;
                let name = binding_name(name);
                let ch = match name.as_str() {
                    "space" => " ",
                    "tab" => "\t",
                    "newline" => "\n",
                    _ => return Err(EvalError::UnknownChar { name }),
                };
                Ok(Some(Value::Text(ch.to_string())))
            }
            "inline" => {
                let [body] = expect_args::<1>(element)?;
                let inlined = body.map_text(&strip_line_breaks);
                self.evaluate_block(&inlined)
            }
            "" => {
                let [name] = expect_args::<1>(element)?;
                let name = binding_name(name);
                if let Some(value) = self.env.variables.get(&name).cloned() {
                    return self.force(value);
                }
                if let Some(block) = self.env.templates.get(&name).cloned() {
                    return self.evaluate_block(&block);
                }
                Err(EvalError::Unbound { name })
            }
            _ => Err(EvalError::UnknownDirective {
                name: element.name.clone(),
            }),
        }
    }

    fn import(&mut self, element: &ElementNode) -> Result<Option<Value>, EvalError> {
        let [module] = expect_args::<1>(element)?;
        let module = binding_name(module);
        let Some(loader) = self.config.loader.clone() else {
            return Err(EvalError::NoLoader);
        };

        log::debug!("importing module {module:?}");
        loader
            .load(self, &module)
            .map_err(|err| EvalError::Import {
                module: module.clone(),
                source: err.into(),
            })?;
        Ok(None)
    }

    fn extends(&mut self, element: &ElementNode) -> Result<Option<Value>, EvalError> {
        let (name, overrides) = match element.arguments.as_slice() {
            [name] => (name, None),
            [name, overrides] => (name, Some(overrides)),
            _ => return Err(wrong_arity(element, "1 or 2")),
        };

        let name = binding_name(name);
        let Some(base) = self.env.templates.get(&name).cloned() else {
            return Err(EvalError::UnboundTemplate { name });
        };

        log::debug!("extending template {name:?}");
        if let Some(overrides) = overrides {
            self.evaluate_block(overrides)?;
        }
        self.evaluate_block(&base)
    }

    fn conditional(&mut self, element: &ElementNode) -> Result<Option<Value>, EvalError> {
        let (condition, then, otherwise) = match element.arguments.as_slice() {
            [condition, then] => (condition, then, None),
            [condition, then, otherwise] => (condition, then, Some(otherwise)),
            _ => return Err(wrong_arity(element, "2 or 3")),
        };

        let truth = self
            .resolve(condition, Lookup::Strict)?
            .ok_or(TypeError::nothing("boolean"))
            .and_then(|value| value.to_bool())
            .map_err(|err| type_mismatch(element, err))?;

        let truth = if element.name == "unless" { !truth } else { truth };
        match (truth, otherwise) {
            (true, _) => self.resolve(then, Lookup::Lenient),
            (false, Some(otherwise)) => self.resolve(otherwise, Lookup::Lenient),
            (false, None) => Ok(None),
        }
    }

    /// Resolve a block where a value is expected: a lone text node is a
    /// number, a boolean, or a variable name.
    fn resolve(&mut self, block: &Block, lookup: Lookup) -> Result<Option<Value>, EvalError> {
        let Some(text) = block.as_single_text() else {
            return self.evaluate_block(block);
        };

        let text = text.trim();
        if let Some(value) = Value::literal(text) {
            return Ok(Some(value));
        }

        match self.env.variables.get(text).cloned() {
            Some(value) => self.force(value),
            None if lookup == Lookup::Strict => Err(EvalError::Unbound {
                name: text.to_string(),
            }),
            None => self.evaluate_block(block),
        }
    }

    fn list_variable(
        &mut self,
        element: &ElementNode,
        block: &Block,
    ) -> Result<Vec<Value>, EvalError> {
        let name = binding_name(block);
        let value = self
            .env
            .variables
            .get(&name)
            .cloned()
            .ok_or(EvalError::Unbound { name })?;

        self.force(value)?
            .ok_or(TypeError::nothing("list"))
            .and_then(Value::into_list)
            .map_err(|err| type_mismatch(element, err))
    }

    /// Evaluate a deferred value; other values are returned as is.
    fn force(&mut self, value: Value) -> Result<Option<Value>, EvalError> {
        match value {
            Value::Deferred(block) => self.evaluate_block(&block),
            value => Ok(Some(value)),
        }
    }

    fn stringify(&mut self, value: Value) -> Result<String, EvalError> {
        match value {
            Value::Deferred(block) => match self.evaluate_block(&block)? {
                Some(value) => self.stringify(value),
                None => Ok(String::new()),
            },
            Value::List(items) => {
                let mut parts = Vec::with_capacity(items.len());
                for item in items {
                    parts.push(self.stringify(item)?);
                }
                Ok(format!("[{}]", parts.join(", ")))
            }
            value => Ok(value.to_string()),
        }
    }
}

fn expect_args<const N: usize>(element: &ElementNode) -> Result<&[Block; N], EvalError> {
    element
        .arguments
        .as_slice()
        .try_into()
        .map_err(|_| wrong_arity(element, &N.to_string()))
}

fn type_mismatch(element: &ElementNode, err: TypeError) -> EvalError {
    EvalError::TypeMismatch {
        directive: element.name.clone(),
        expected: err.expected,
        found: err.found,
    }
}

fn wrong_arity(element: &ElementNode, expected: &str) -> EvalError {
    EvalError::WrongArity {
        name: element.name.clone(),
        expected: expected.to_string(),
        found: element.arguments.len(),
    }
}

fn binding_name(block: &Block) -> String {
    block.text_content().trim().to_string()
}

/// Remove every line break together with the spaces before it and the
/// whitespace after it.
fn strip_line_breaks(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != ' ' && chars[i] != '\n' {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        let mut j = i;
        while j < chars.len() && chars[j] == ' ' {
            j += 1;
        }
        if j < chars.len() && chars[j] == '\n' {
            j += 1;
            while j < chars.len() && chars[j].is_ascii_whitespace() {
                j += 1;
            }
        } else {
            out.extend(&chars[i..j]);
        }
        i = j;
    }

    out
}
