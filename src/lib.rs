//! # validate-schema
//!
//! Compile TOML rule schemas into rule trees and validate nested JSON data
//! against them.
//!
//! ```no_run
//! use validate_schema::Validator;
//!
//! let validator = Validator::new();
//! validator.register_schema("character", r#"
//! name = "string,required,min=1,max=128"
//!
//! [[ships]]
//! id = "string,required,uuid"
//! "#)?;
//!
//! let data = serde_json::json!({"name": "Leia", "ships": [{"id": "not-a-uuid"}]});
//! let violations = validator.validate_value("character", &data)?;
//! assert!(violations.contains("ships[0].id"));
//! # Ok::<(), validate_schema::SchemaError>(())
//! ```

pub mod cli;
pub mod compiler;
pub mod config;
pub mod document;
pub mod error;
pub mod error_reporter;
pub mod evaluator;
pub mod file_discovery;
pub mod normalizer;
pub mod output;
pub mod registry;
pub mod rules;
pub mod schema_loader;
pub mod validator;

pub use cli::{Cli, OutputFormat, VerbosityLevel};
pub use compiler::{BaseType, Compiler, RuleNode, RuleTree, compile};
pub use config::{Config, ConfigError, ConfigManager};
pub use document::{Document, DocumentDecoder, DocumentFormat, JsonDecoder, TomlDecoder};
pub use error::{Result, SchemaError};
pub use error_reporter::ErrorReporter;
pub use evaluator::{BuiltinEvaluator, RuleEvaluator, Violations};
pub use file_discovery::FileDiscovery;
pub use normalizer::{Field, Record, normalize};
pub use output::Output;
pub use registry::{DuplicatePolicy, SchemaRegistry};
pub use rules::{Check, LeafRule};
pub use schema_loader::{SchemaLoader, load_data_file};
pub use validator::{
    FileValidationResult, ValidationConfig, ValidationResults, ValidationStatus, Validator,
};
