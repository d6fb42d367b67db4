use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EvalError, EvalResult};
use crate::expr::Operator;

/// A runtime value held in an evaluation scope.
///
/// Characteristics and attribute assignments are written as raw text in the
/// source; [`Value::from_raw`] decides how that text is typed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Integer value.
    Int(i64),
    /// Boolean value.
    Bool(bool),
    /// Any other text.
    Text(String),
}

impl Value {
    /// Type raw assignment text: integers first, then `true`/`false`
    /// (case-insensitive), otherwise text kept verbatim.
    pub fn from_raw(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Ok(n) = trimmed.parse::<i64>() {
            return Self::Int(n);
        }
        if trimmed.eq_ignore_ascii_case("true") {
            Self::Bool(true)
        } else if trimmed.eq_ignore_ascii_case("false") {
            Self::Bool(false)
        } else {
            Self::Text(raw.to_string())
        }
    }

    /// Human-readable name of this value's type.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "integer",
            Self::Bool(_) => "boolean",
            Self::Text(_) => "text",
        }
    }

    /// Numeric view of the value. Booleans count as 0/1.
    pub fn as_int(&self, operator: Operator) -> EvalResult<i64> {
        match self {
            Self::Int(n) => Ok(*n),
            Self::Bool(b) => Ok(i64::from(*b)),
            Self::Text(_) => Err(self.mismatch(operator)),
        }
    }

    /// Truth view of the value. Integers are true when non-zero.
    pub fn as_bool(&self, operator: Operator) -> EvalResult<bool> {
        match self {
            Self::Bool(b) => Ok(*b),
            Self::Int(n) => Ok(*n != 0),
            Self::Text(_) => Err(self.mismatch(operator)),
        }
    }

    /// The text payload, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    fn mismatch(&self, operator: Operator) -> EvalError {
        EvalError::TypeMismatch {
            operator,
            found: self.kind(),
            value: self.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
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
