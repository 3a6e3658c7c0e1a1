//! Generic schema documents and the decoders that produce them
//!
//! A [`Document`] is the closed set of value kinds a schema source can decode
//! into. The compiler matches on it exhaustively, so every shape it does not
//! understand surfaces as an explicit error instead of an unchecked cast.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::{Result, SchemaError};

/// Decoded schema document node
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Datetime(String),
    Null,
    Object(BTreeMap<String, Document>),
    List(Vec<Document>),
}

impl Document {
    /// Short name of the node kind, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Document::String(_) => "string",
            Document::Integer(_) => "integer",
            Document::Float(_) => "float",
            Document::Boolean(_) => "boolean",
            Document::Datetime(_) => "datetime",
            Document::Null => "null",
            Document::Object(_) => "object",
            Document::List(_) => "list",
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Document>> {
        match self {
            Document::Object(map) => Some(map),
            _ => None,
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Document::String(s) => write!(f, "{:?}", s),
            Document::Integer(i) => write!(f, "{}", i),
            Document::Float(x) => write!(f, "{}", x),
            Document::Boolean(b) => write!(f, "{}", b),
            Document::Datetime(d) => write!(f, "{}", d),
            Document::Null => write!(f, "null"),
            Document::Object(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} = {}", key, value)?;
                }
                write!(f, "}}")
            }
            Document::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<toml::Value> for Document {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => Document::String(s),
            toml::Value::Integer(i) => Document::Integer(i),
            toml::Value::Float(x) => Document::Float(x),
            toml::Value::Boolean(b) => Document::Boolean(b),
            toml::Value::Datetime(d) => Document::Datetime(d.to_string()),
            toml::Value::Array(items) => {
                Document::List(items.into_iter().map(Document::from).collect())
            }
            toml::Value::Table(table) => Document::from(table),
        }
    }
}

impl From<toml::Table> for Document {
    fn from(table: toml::Table) -> Self {
        Document::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, Document::from(value)))
                .collect(),
        )
    }
}

impl From<serde_json::Value> for Document {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Document::Null,
            serde_json::Value::Bool(b) => Document::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Document::Integer(i),
                None => Document::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Document::String(s),
            serde_json::Value::Array(items) => {
                Document::List(items.into_iter().map(Document::from).collect())
            }
            serde_json::Value::Object(map) => Document::Object(
                map.into_iter()
                    .map(|(key, value)| (key, Document::from(value)))
                    .collect(),
            ),
        }
    }
}

/// Turns schema source text into a [`Document`]
pub trait DocumentDecoder: Send + Sync {
    fn decode(&self, text: &str) -> Result<Document>;
}

/// Schema source formats understood out of the box
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Toml,
    Json,
}

impl DocumentFormat {
    /// Pick a format from a file extension (`toml` or `json`)
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "toml" => Some(DocumentFormat::Toml),
            "json" => Some(DocumentFormat::Json),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn decoder(self) -> &'static dyn DocumentDecoder {
        match self {
            DocumentFormat::Toml => &TomlDecoder,
            DocumentFormat::Json => &JsonDecoder,
        }
    }
}

/// TOML schema decoder
#[derive(Debug, Default, Clone, Copy)]
pub struct TomlDecoder;

impl DocumentDecoder for TomlDecoder {
    fn decode(&self, text: &str) -> Result<Document> {
        let table: toml::Table = text.parse()?;
        Ok(Document::from(table))
    }
}

/// JSON schema decoder
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonDecoder;

impl DocumentDecoder for JsonDecoder {
    fn decode(&self, text: &str) -> Result<Document> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| SchemaError::DocumentDecode {
                format: "JSON".to_string(),
                details: e.to_string(),
            })?;
        Ok(Document::from(value))
    }
}
