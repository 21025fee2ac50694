use std::fmt;

use crate::ast::Block;

/// A value produced or consumed by the template engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Number(f64),
    Boolean(bool),
    List(Vec<Value>),
    /// A block evaluated only when the value is used.
    Deferred(Block),
}

impl Value {
    /// Name of this value's type, as used in type errors.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Number(_) => "number",
            Self::Boolean(_) => "boolean",
            Self::List(_) => "list",
            Self::Deferred(_) => "deferred block",
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The boolean inside this value.
    ///
    /// # Errors
    ///
    /// Returns `TypeError` for any other kind of value.
    pub const fn to_bool(&self) -> Result<bool, TypeError> {
        match self {
            Self::Boolean(b) => Ok(*b),
            other => Err(TypeError::new("boolean", other)),
        }
    }

    /// The items of a list value.
    ///
    /// # Errors
    ///
    /// Returns `TypeError` for any other kind of value.
    pub fn into_list(self) -> Result<Vec<Self>, TypeError> {
        match self {
            Self::List(items) => Ok(items),
            other => Err(TypeError::new("list", &other)),
        }
    }

    /// Interpret `text` as a number or boolean literal.
    ///
    /// Numbers must start with an ASCII digit, so names like `x1` and
    /// signs are never taken as numbers.
    #[must_use]
    pub fn literal(text: &str) -> Option<Self> {
        if text.starts_with(|c: char| c.is_ascii_digit()) {
            if let Ok(n) = text.parse::<f64>() {
                return Some(Self::Number(n));
            }
        }
        match text {
            "true" => Some(Self::Boolean(true)),
            "false" => Some(Self::Boolean(false)),
            _ => None,
        }
    }

    /// Build a list from anything convertible into values.
    pub fn list<T: Into<Self>>(items: impl IntoIterator<Item = T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

/// A value of the wrong kind where a specific kind was required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("expected a {expected} value, got {found}")]
pub struct TypeError {
    pub expected: &'static str,
    pub found: &'static str,
}

impl TypeError {
    const fn new(expected: &'static str, found: &Value) -> Self {
        Self {
            expected,
            found: found.kind(),
        }
    }

    /// Where a value was required but nothing was produced.
    #[must_use]
    pub const fn nothing(expected: &'static str) -> Self {
        Self {
            expected,
            found: "nothing",
        }
    }
}

/// Default textual formatting.
///
/// A `Deferred` value prints the text content of its block; the engine
/// evaluates deferred values before formatting them.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Deferred(block) => f.write_str(&block.text_content()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::list(items)
    }
}

impl From<Block> for Value {
    fn from(block: Block) -> Self {
        Self::Deferred(block)
    }
}

/// Error converting a JSON value into a [`Value`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot use JSON {0} as a template value")]
pub struct FromJsonError(&'static str);

impl TryFrom<serde_json::Value> for Value {
    type Error = FromJsonError;

    fn try_from(json: serde_json::Value) -> Result<Self, Self::Error> {
        match json {
            serde_json::Value::String(s) => Ok(Self::Text(s)),
            serde_json::Value::Bool(b) => Ok(Self::Boolean(b)),
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(Self::Number)
                .ok_or(FromJsonError("number")),
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(Self::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::List),
            serde_json::Value::Null => Err(FromJsonError("null")),
            serde_json::Value::Object(_) => Err(FromJsonError("object")),
        }
    }
}
