use crate::cli::VerbosityLevel;
use crate::config::ConfigError;
use crate::error::SchemaError;

/// Formats errors for stderr with optional hints
pub struct ErrorReporter {
    verbosity: VerbosityLevel,
}

impl ErrorReporter {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self { verbosity }
    }

    /// Print a schema or runtime error to stderr
    pub fn report_error(&self, error: &SchemaError) {
        eprintln!("{}", self.format_error(error));
    }

    /// Print a configuration error to stderr
    pub fn report_config_error(&self, error: &ConfigError) {
        eprintln!("{}", self.format_config_error(error));
    }

    pub fn format_error(&self, error: &SchemaError) -> String {
        match self.verbosity {
            VerbosityLevel::Quiet => self.format_error_brief(error),
            VerbosityLevel::Normal => match self.get_error_hint(error) {
                Some(hint) => format!("Error: {}\nHint: {}", error, hint),
                None => format!("Error: {}", error),
            },
            VerbosityLevel::Verbose => {
                let mut output = format!("Error: {}\nDebug: {:?}", error, error);
                if let Some(hint) = self.get_error_hint(error) {
                    output.push_str(&format!("\nHint: {}", hint));
                }
                output
            }
        }
    }

    pub fn format_config_error(&self, error: &ConfigError) -> String {
        match self.verbosity {
            VerbosityLevel::Quiet => format!("Config error: {}", error),
            VerbosityLevel::Normal => format!(
                "Configuration Error: {}\n{}",
                error,
                self.get_config_help(error)
            ),
            VerbosityLevel::Verbose => format!(
                "Configuration Error: {}\nDebug: {:?}\n{}",
                error,
                error,
                self.get_config_help(error)
            ),
        }
    }

    fn format_error_brief(&self, error: &SchemaError) -> String {
        match error {
            SchemaError::SchemaNotFound { name } => format!("SCHEMA NOT FOUND: {}", name),
            e if e.is_compile_error() => format!("SCHEMA ERROR: {}", e),
            _ => format!("ERROR: {}", error),
        }
    }

    fn get_error_hint(&self, error: &SchemaError) -> Option<&'static str> {
        match error {
            SchemaError::SchemaType { .. } => Some(
                "Every rule string must start with string, number or boolean, e.g. \"string,required\"",
            ),
            SchemaError::SchemaParse { .. } => Some(
                "Schema values must be rule strings, tables or arrays of tables",
            ),
            SchemaError::HeterogeneousList { .. } => Some(
                "Only the first element of an example list is used; make all elements share its shape or drop --strict-lists",
            ),
            SchemaError::DocumentDecode { .. } => {
                Some("Check the schema file for syntax errors")
            }
            SchemaError::SchemaNotFound { .. } => {
                Some("Use --name with the file stem of a loaded schema")
            }
            SchemaError::DuplicateSchema { .. } => Some(
                "Two schema files share a name; rename one or use --on-duplicate overwrite",
            ),
            SchemaError::UnsupportedSchemaFile { .. } => {
                Some("Schema files must have a .toml or .json extension")
            }
            SchemaError::InvalidData { .. } => Some("Data files must contain a JSON object"),
            _ => None,
        }
    }

    fn get_config_help(&self, error: &ConfigError) -> String {
        match error {
            ConfigError::Io(_) => {
                "Check that the configuration file exists and is readable".to_string()
            }
            ConfigError::TomlParsing(_) | ConfigError::JsonParsing(_) => {
                "Check the configuration file syntax".to_string()
            }
            ConfigError::Validation(_) => {
                "Check the configured values against validate-schema --help".to_string()
            }
            ConfigError::Environment(_) => {
                "Check the VALIDATE_SCHEMA_* environment variables".to_string()
            }
            ConfigError::UnsupportedFormat(_) => {
                "Configuration files must be .toml or .json".to_string()
            }
        }
    }
}
