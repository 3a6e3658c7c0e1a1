use crate::cli::{Cli, OutputFormat, VerbosityLevel};
use crate::error::SchemaError;
use crate::file_discovery::normalize_extension;
use crate::registry::DuplicatePolicy;
use crate::validator;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

const CONFIG_NAMES: [&str; 4] = [
    "validate-schema.toml",
    "validate-schema.json",
    ".validate-schema.toml",
    ".validate-schema.json",
];

/// Trait for abstracting environment variable access
pub trait EnvProvider {
    fn get(&self, key: &str) -> Option<String>;
}

/// System environment variable provider for production use
pub struct SystemEnvProvider;

impl EnvProvider for SystemEnvProvider {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("Environment variable error: {0}")]
    Environment(String),

    #[error("Unsupported configuration file format: {0}")]
    UnsupportedFormat(String),
}

impl From<ConfigError> for SchemaError {
    fn from(err: ConfigError) -> Self {
        SchemaError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub registry: RegistryConfig,
    pub validation: ValidationConfig,
    pub output: OutputConfig,
    pub files: FileConfig,
}

/// Schema registration settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct RegistryConfig {
    /// Policy when a schema name is registered twice
    pub on_duplicate: DuplicatePolicy,
    /// Fail compilation when an example list mixes element shapes
    pub strict_lists: bool,
}

/// Validation-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ValidationConfig {
    /// Number of concurrent validation threads
    pub threads: Option<usize>,
    /// Stop validation on first failing file
    pub fail_fast: bool,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormatConfig,
    pub verbose: bool,
    /// Quiet mode (failures only)
    pub quiet: bool,
}

/// File processing configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileConfig {
    /// Extensions of schema files loaded from a schema directory
    pub schema_extensions: Vec<String>,
    /// Extensions of data files discovered in data directories
    pub data_extensions: Vec<String>,
    /// Include patterns (glob syntax)
    pub include_patterns: Vec<String>,
    /// Exclude patterns (glob syntax)
    pub exclude_patterns: Vec<String>,
    /// Maximum directory depth for data discovery (None = unlimited)
    pub max_depth: Option<usize>,
}

/// Output format configuration (serializable version of CLI OutputFormat)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormatConfig {
    #[default]
    Human,
    Json,
    Summary,
}

impl FromStr for OutputFormatConfig {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(OutputFormatConfig::Human),
            "json" => Ok(OutputFormatConfig::Json),
            "summary" => Ok(OutputFormatConfig::Summary),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

impl From<OutputFormat> for OutputFormatConfig {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Human => OutputFormatConfig::Human,
            OutputFormat::Json => OutputFormatConfig::Json,
            OutputFormat::Summary => OutputFormatConfig::Summary,
        }
    }
}

impl From<OutputFormatConfig> for OutputFormat {
    fn from(format: OutputFormatConfig) -> Self {
        match format {
            OutputFormatConfig::Human => OutputFormat::Human,
            OutputFormatConfig::Json => OutputFormat::Json,
            OutputFormatConfig::Summary => OutputFormat::Summary,
        }
    }
}

impl OutputConfig {
    pub fn verbosity(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else if self.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            schema_extensions: vec!["toml".to_string(), "json".to_string()],
            data_extensions: vec!["json".to_string()],
            include_patterns: vec![],
            exclude_patterns: vec![],
            max_depth: None,
        }
    }
}

/// Configuration manager for loading and merging configurations
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration with precedence: defaults -> file -> environment -> CLI
    pub async fn load_config(cli: &Cli) -> Result<Config> {
        Self::load_config_with(&SystemEnvProvider, cli).await
    }

    pub async fn load_config_with(env: &impl EnvProvider, cli: &Cli) -> Result<Config> {
        let mut config = Config::default();

        if let Some(config_path) = &cli.config {
            let file_config = Self::load_from_file(config_path).await?;
            config = Self::merge_configs(config, file_config);
        } else if let Some(found_config) = Self::find_config_file().await? {
            config = Self::merge_configs(config, found_config);
        }

        config = Self::apply_environment_overrides_with(env, config)?;
        config = Self::merge_with_cli(config, cli);
        config = Self::normalize_extensions(config);

        Self::validate_config(&config)?;

        Ok(config)
    }

    /// Load configuration from a file (TOML or JSON)
    pub async fn load_from_file(path: &Path) -> Result<Config> {
        let content = tokio::fs::read_to_string(path).await?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(toml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => {
                // Try to parse as TOML first, then JSON
                if let Ok(config) = toml::from_str::<Config>(&content) {
                    Ok(config)
                } else {
                    Ok(serde_json::from_str(&content)?)
                }
            }
        }
    }

    /// Find configuration file in the current directory, then the user config
    /// directory
    pub async fn find_config_file() -> Result<Option<Config>> {
        let mut search_dirs = vec![PathBuf::from(".")];
        if let Some(config_dir) = dirs::config_dir() {
            search_dirs.push(config_dir.join("validate-schema"));
        }
        Self::find_config_file_in(&search_dirs).await
    }

    /// First configuration file found in `search_dirs`, in order
    pub async fn find_config_file_in(search_dirs: &[PathBuf]) -> Result<Option<Config>> {
        for dir in search_dirs {
            for name in &CONFIG_NAMES {
                let path = dir.join(name);
                if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                    return Ok(Some(Self::load_from_file(&path).await?));
                }
            }
        }

        Ok(None)
    }

    /// Apply environment variable overrides using the system environment
    pub fn apply_environment_overrides(config: Config) -> Result<Config> {
        Self::apply_environment_overrides_with(&SystemEnvProvider, config)
    }

    /// Apply environment variable overrides with a custom environment provider
    pub fn apply_environment_overrides_with(
        env: &impl EnvProvider,
        mut config: Config,
    ) -> Result<Config> {
        if let Some(threads) = parse_env(env, "VALIDATE_SCHEMA_THREADS")? {
            config.validation.threads = Some(threads);
        }
        if let Some(fail_fast) = parse_env(env, "VALIDATE_SCHEMA_FAIL_FAST")? {
            config.validation.fail_fast = fail_fast;
        }

        if let Some(policy) = env.get("VALIDATE_SCHEMA_ON_DUPLICATE") {
            config.registry.on_duplicate = match policy.to_lowercase().as_str() {
                "overwrite" => DuplicatePolicy::Overwrite,
                "reject" => DuplicatePolicy::Reject,
                _ => {
                    return Err(ConfigError::Environment(format!(
                        "Invalid VALIDATE_SCHEMA_ON_DUPLICATE value: {}",
                        policy
                    )));
                }
            };
        }
        if let Some(strict) = parse_env(env, "VALIDATE_SCHEMA_STRICT_LISTS")? {
            config.registry.strict_lists = strict;
        }

        if let Some(verbose) = parse_env(env, "VALIDATE_SCHEMA_VERBOSE")? {
            config.output.verbose = verbose;
        }
        if let Some(quiet) = parse_env(env, "VALIDATE_SCHEMA_QUIET")? {
            config.output.quiet = quiet;
        }
        if let Some(format) = parse_env(env, "VALIDATE_SCHEMA_FORMAT")? {
            config.output.format = format;
        }

        if let Some(extensions) = env.get("VALIDATE_SCHEMA_SCHEMA_EXTENSIONS") {
            config.files.schema_extensions = split_list(&extensions);
        }
        if let Some(extensions) = env.get("VALIDATE_SCHEMA_DATA_EXTENSIONS") {
            config.files.data_extensions = split_list(&extensions);
        }

        Ok(config)
    }

    /// Merge CLI arguments with configuration (CLI takes precedence)
    ///
    /// Flags override only when given; an absent flag keeps the configured
    /// value.
    pub fn merge_with_cli(mut config: Config, cli: &Cli) -> Config {
        if let Some(policy) = cli.on_duplicate {
            config.registry.on_duplicate = policy.into();
        }
        if cli.strict_lists {
            config.registry.strict_lists = true;
        }

        if cli.threads.is_some() {
            config.validation.threads = cli.threads;
        }
        if cli.fail_fast {
            config.validation.fail_fast = true;
        }

        if let Some(format) = cli.output_format {
            config.output.format = format.into();
        }
        if cli.verbose {
            config.output.verbose = true;
            config.output.quiet = false;
        }
        if cli.quiet {
            config.output.quiet = true;
            config.output.verbose = false;
        }

        if let Some(extensions) = cli.get_extensions() {
            config.files.data_extensions = extensions;
        }
        if !cli.include_patterns.is_empty() {
            config.files.include_patterns = cli.include_patterns.clone();
        }
        if !cli.exclude_patterns.is_empty() {
            config.files.exclude_patterns = cli.exclude_patterns.clone();
        }
        if cli.max_depth.is_some() {
            config.files.max_depth = cli.max_depth;
        }

        config
    }

    /// Merge two configurations (second takes precedence for non-None values)
    pub fn merge_configs(mut base: Config, override_config: Config) -> Config {
        base.registry = override_config.registry;

        if override_config.validation.threads.is_some() {
            base.validation.threads = override_config.validation.threads;
        }
        base.validation.fail_fast = override_config.validation.fail_fast;

        base.output = override_config.output;

        if !override_config.files.schema_extensions.is_empty() {
            base.files.schema_extensions = override_config.files.schema_extensions;
        }
        if !override_config.files.data_extensions.is_empty() {
            base.files.data_extensions = override_config.files.data_extensions;
        }
        if !override_config.files.include_patterns.is_empty() {
            base.files.include_patterns = override_config.files.include_patterns;
        }
        if !override_config.files.exclude_patterns.is_empty() {
            base.files.exclude_patterns = override_config.files.exclude_patterns;
        }
        if override_config.files.max_depth.is_some() {
            base.files.max_depth = override_config.files.max_depth;
        }

        base
    }

    /// Strip leading dots and lowercase every configured extension
    pub fn normalize_extensions(mut config: Config) -> Config {
        for extensions in [
            &mut config.files.schema_extensions,
            &mut config.files.data_extensions,
        ] {
            *extensions = extensions.iter().map(|ext| normalize_extension(ext)).collect();
        }
        config
    }

    /// Validate configuration values
    pub fn validate_config(config: &Config) -> Result<()> {
        if let Some(threads) = config.validation.threads {
            if threads == 0 {
                return Err(ConfigError::Validation(
                    "Number of threads must be greater than 0".to_string(),
                ));
            }
            if threads > 1000 {
                return Err(ConfigError::Validation(
                    "Number of threads cannot exceed 1000".to_string(),
                ));
            }
        }

        if config.output.verbose && config.output.quiet {
            return Err(ConfigError::Validation(
                "Cannot enable both verbose and quiet modes".to_string(),
            ));
        }

        for (kind, extensions) in [
            ("schema", &config.files.schema_extensions),
            ("data", &config.files.data_extensions),
        ] {
            if extensions.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "At least one {} file extension must be specified",
                    kind
                )));
            }
            for ext in extensions {
                if ext.is_empty() || ext.contains('/') || ext.contains('\\') || ext.contains('.') {
                    return Err(ConfigError::Validation(format!(
                        "Invalid file extension: {}",
                        ext
                    )));
                }
            }
        }

        Ok(())
    }

    /// Get the effective thread count
    pub fn get_thread_count(config: &Config) -> usize {
        config.validation.threads.unwrap_or_else(num_cpus::get)
    }

    /// Batch settings for [`validator::Validator::validate_files`]
    pub fn validation_settings(config: &Config) -> validator::ValidationConfig {
        validator::ValidationConfig {
            threads: Self::get_thread_count(config),
            fail_fast: config.validation.fail_fast,
        }
    }
}

fn parse_env<T: FromStr>(env: &impl EnvProvider, key: &str) -> Result<Option<T>> {
    match env.get(key) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Environment(format!("Invalid {} value: {}", key, value))),
        None => Ok(None),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
