//! Response body accumulated by a handler.
//!
//! A body is either text built up from `write`/`send` chunks or a
//! structured JSON value handed to `send` in one piece. The two never mix:
//! sending a structured value replaces whatever text was buffered.

use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Text(String),
    Json(Value),
}

impl Body {
    /// Append a text chunk.
    ///
    /// A structured body is first flattened to its JSON text so the chunk
    /// lands after it instead of being lost.
    pub(crate) fn append(&mut self, chunk: &str) {
        match self {
            Body::Text(text) => text.push_str(chunk),
            Body::Json(value) => {
                let mut text = value.to_string();
                text.push_str(chunk);
                *self = Body::Text(text);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Text(text) if text.is_empty())
    }

    pub fn is_json(&self) -> bool {
        matches!(self, Body::Json(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Text(text) => Some(text),
            Body::Json(_) => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Body::Json(value) => Some(value),
            Body::Text(_) => None,
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Body::Text(_) => "text",
            Body::Json(_) => "json",
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Body::Text(String::new())
    }
}

/// Text verbatim; structured values as compact JSON.
impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Text(text) => f.write_str(text),
            Body::Json(value) => write!(f, "{value}"),
        }
    }
}

impl Serialize for Body {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Body::Text(text) => serializer.serialize_str(text),
            Body::Json(value) => value.serialize(serializer),
        }
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Body::Text(s.to_owned())
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::Text(s)
    }
}

/// JSON strings stay text; everything else is structured.
impl From<Value> for Body {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Body::Text(text),
            other => Body::Json(other),
        }
    }
}
