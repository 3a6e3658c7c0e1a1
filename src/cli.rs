use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::registry::DuplicatePolicy;

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Only show failures
    Quiet,
    #[default]
    Normal,
    /// Show every violation message
    Verbose,
}

/// How results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Summary,
}

/// Command line form of [`DuplicatePolicy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DuplicateArg {
    Overwrite,
    Reject,
}

impl From<DuplicateArg> for DuplicatePolicy {
    fn from(arg: DuplicateArg) -> Self {
        match arg {
            DuplicateArg::Overwrite => DuplicatePolicy::Overwrite,
            DuplicateArg::Reject => DuplicatePolicy::Reject,
        }
    }
}

/// Validate JSON data files against TOML rule schemas
#[derive(Parser, Debug, Clone)]
#[command(name = "validate-schema")]
#[command(about = "Validate JSON data files against TOML rule schemas")]
#[command(version)]
pub struct Cli {
    /// Data files or directories to validate
    #[arg(required = true, help = "Data files or directories to validate")]
    pub data: Vec<PathBuf>,

    /// Schema file or directory of schema files
    #[arg(short = 's', long = "schemas")]
    pub schemas: PathBuf,

    /// Schema name to validate against (defaults to the only loaded schema)
    #[arg(short = 'n', long = "name")]
    pub name: Option<String>,

    /// Configuration file (TOML or JSON)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum)]
    pub output_format: Option<OutputFormat>,

    /// Data file extensions to process (comma-separated)
    #[arg(
        short = 'e',
        long = "extensions",
        help = "Data file extensions to process (e.g., 'json')"
    )]
    pub extensions: Option<String>,

    /// Number of concurrent validation threads
    #[arg(
        short = 't',
        long = "threads",
        help = "Number of concurrent validation threads"
    )]
    pub threads: Option<usize>,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", help = "Enable verbose output")]
    pub verbose: bool,

    /// Enable quiet mode (failures only)
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Quiet mode",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    /// What to do when two schema files share a name
    #[arg(long = "on-duplicate", value_enum)]
    pub on_duplicate: Option<DuplicateArg>,

    /// Reject schemas whose example lists mix element shapes
    #[arg(long = "strict-lists")]
    pub strict_lists: bool,

    /// Include file patterns (glob syntax)
    #[arg(long = "include", action = clap::ArgAction::Append)]
    pub include_patterns: Vec<String>,

    /// Exclude file patterns (glob syntax)
    #[arg(long = "exclude", action = clap::ArgAction::Append)]
    pub exclude_patterns: Vec<String>,

    /// Maximum directory depth when discovering data files
    #[arg(long = "max-depth")]
    pub max_depth: Option<usize>,

    /// Stop at the first file that is not valid
    #[arg(long = "fail-fast")]
    pub fail_fast: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Extensions given with `--extensions`, if any
    pub fn get_extensions(&self) -> Option<Vec<String>> {
        self.extensions.as_ref().map(|extensions| {
            extensions
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.schemas.exists() {
            return Err(format!("Path does not exist: {}", self.schemas.display()));
        }
        for path in &self.data {
            if !path.exists() {
                return Err(format!("Path does not exist: {}", path.display()));
            }
        }
        if let Some(threads) = self.threads
            && threads == 0
        {
            return Err("Number of threads must be greater than 0".to_string());
        }
        Ok(())
    }

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_cli_parsing() {
        let args = vec!["validate-schema", "--schemas", "schemas", "data.json"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.schemas, PathBuf::from("schemas"));
        assert_eq!(cli.data, vec![PathBuf::from("data.json")]);
        assert_eq!(cli.name, None);
        assert_eq!(cli.output_format, None);
        assert_eq!(cli.get_extensions(), None);
        assert_eq!(cli.verbosity(), VerbosityLevel::Normal);
    }

    #[test]
    fn test_full_cli_parsing() {
        let args = vec![
            "validate-schema",
            "-s",
            "schemas",
            "--name",
            "character",
            "--format",
            "json",
            "-e",
            "json, jsn",
            "-t",
            "4",
            "-q",
            "--on-duplicate",
            "reject",
            "--strict-lists",
            "--exclude",
            "**/tmp/**",
            "--fail-fast",
            "a.json",
            "b",
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        assert_eq!(cli.name.as_deref(), Some("character"));
        assert_eq!(cli.output_format, Some(OutputFormat::Json));
        assert_eq!(cli.get_extensions(), Some(vec!["json".to_string(), "jsn".to_string()]));
        assert_eq!(cli.threads, Some(4));
        assert_eq!(cli.verbosity(), VerbosityLevel::Quiet);
        assert_eq!(cli.on_duplicate.map(DuplicatePolicy::from), Some(DuplicatePolicy::Reject));
        assert!(cli.strict_lists);
        assert_eq!(cli.exclude_patterns, vec!["**/tmp/**"]);
        assert!(cli.fail_fast);
        assert_eq!(cli.data.len(), 2);
    }

    #[test]
    fn test_requires_schemas_and_data() {
        assert!(Cli::try_parse_from(vec!["validate-schema", "data.json"]).is_err());
        assert!(Cli::try_parse_from(vec!["validate-schema", "--schemas", "s"]).is_err());
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        let args = vec!["validate-schema", "-s", "s", "-v", "-q", "d.json"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_validate_missing_paths() {
        let cli = Cli::try_parse_from(vec![
            "validate-schema",
            "--schemas",
            "/nonexistent/schemas",
            "d.json",
        ])
        .unwrap();
        let err = cli.validate().unwrap_err();
        assert!(err.contains("Path does not exist"));
    }
}
