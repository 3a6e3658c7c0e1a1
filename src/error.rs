use std::path::PathBuf;

use thiserror::Error;

/// Main library error type covering schema compilation, lookup and loading
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Schema document could not be decoded as {format}: {details}")]
    DocumentDecode { format: String, details: String },

    #[error("Field {field} is missing a base type as first rule (expected string, number or boolean): '{rule}'")]
    SchemaType { field: String, rule: String },

    #[error("Could not parse schema field {field} with value {value}")]
    SchemaParse { field: String, value: String },

    #[error("Schema field {field} is a list whose element {index} differs in shape from the first element")]
    HeterogeneousList { field: String, index: usize },

    #[error("Schema not found: {name}")]
    SchemaNotFound { name: String },

    #[error("Schema already registered: {name}")]
    DuplicateSchema { name: String },

    #[error("Invalid data: {details}")]
    InvalidData { details: String },

    #[error("Unsupported schema file: {path}")]
    UnsupportedSchemaFile { path: PathBuf },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Concurrent operation error: {details}")]
    Concurrency { details: String },
}

impl SchemaError {
    /// Errors raised while turning schema text into a rule tree
    pub fn is_compile_error(&self) -> bool {
        matches!(
            self,
            SchemaError::DocumentDecode { .. }
                | SchemaError::SchemaType { .. }
                | SchemaError::SchemaParse { .. }
                | SchemaError::HeterogeneousList { .. }
        )
    }
}

impl From<toml::de::Error> for SchemaError {
    fn from(err: toml::de::Error) -> Self {
        SchemaError::DocumentDecode {
            format: "TOML".to_string(),
            details: err.to_string(),
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, SchemaError>;
