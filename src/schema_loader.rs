//! Loading schemas and data from disk
//!
//! Schema files are registered under their file stem (`character.toml`
//! becomes `character`); the extension picks the decoder.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::document::DocumentFormat;
use crate::error::{Result, SchemaError};
use crate::file_discovery::FileDiscovery;
use crate::validator::Validator;

/// Registers schema files with a [`Validator`]
#[derive(Debug, Clone)]
pub struct SchemaLoader {
    discovery: FileDiscovery,
}

impl SchemaLoader {
    /// Loader picking up `.toml` and `.json` schema files
    pub fn new() -> Self {
        Self {
            discovery: FileDiscovery::new()
                .with_extensions(vec!["toml".to_string(), "json".to_string()]),
        }
    }

    /// Loader using a custom discovery (extensions, patterns, depth)
    pub fn with_discovery(discovery: FileDiscovery) -> Self {
        Self { discovery }
    }

    /// Register every schema file under `path`, or `path` itself if it is a
    /// file, returning the registered names in path order
    ///
    /// Stops at the first schema that fails to decode or compile.
    pub async fn load_path(&self, validator: &Validator, path: &Path) -> Result<Vec<String>> {
        let metadata = tokio::fs::metadata(path).await?;
        let files = if metadata.is_file() {
            vec![path.to_path_buf()]
        } else {
            self.discovery.discover_files(path).await?
        };

        let mut names = Vec::with_capacity(files.len());
        for file in files {
            names.push(self.load_file(validator, &file).await?);
        }
        Ok(names)
    }

    /// Register a single schema file, returning the name it was stored under
    pub async fn load_file(&self, validator: &Validator, path: &Path) -> Result<String> {
        let format = DocumentFormat::from_path(path).ok_or_else(|| unsupported(path))?;
        let name = schema_name(path).ok_or_else(|| unsupported(path))?;

        let text = tokio::fs::read_to_string(path).await?;
        validator.register_schema_as(&name, &text, format)?;

        debug!(schema = %name, path = %path.display(), "loaded schema file");
        Ok(name)
    }
}

impl Default for SchemaLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Schema name for a file: its stem
pub fn schema_name(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
}

/// Read and decode a JSON data file
pub async fn load_data_file(path: &Path) -> Result<Value> {
    let text = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&text)?)
}

fn unsupported(path: &Path) -> SchemaError {
    SchemaError::UnsupportedSchemaFile {
        path: PathBuf::from(path),
    }
}
