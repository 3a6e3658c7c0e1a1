use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::bail;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use validate_schema::config::{Config, ConfigManager};
use validate_schema::{
    Cli, ErrorReporter, FileDiscovery, Output, SchemaError, SchemaLoader, ValidationResults,
    Validator,
};

/// Every file valid
const EXIT_VALID: u8 = 0;
/// At least one file invalid or unreadable
const EXIT_INVALID: u8 = 1;
/// Bad arguments, configuration or schemas
const EXIT_USAGE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let reporter = ErrorReporter::new(cli.verbosity());

    if let Err(message) = cli.validate() {
        eprintln!("Error: {}", message);
        return ExitCode::from(EXIT_USAGE);
    }

    let config = match ConfigManager::load_config(&cli).await {
        Ok(config) => config,
        Err(e) => {
            reporter.report_config_error(&e);
            return ExitCode::from(EXIT_USAGE);
        }
    };
    debug!(?config, "resolved configuration");

    let results = match run(&cli, &config).await {
        Ok(results) => results,
        Err(e) => {
            match e.downcast_ref::<SchemaError>() {
                Some(error) => reporter.report_error(error),
                None => eprintln!("Error: {:#}", e),
            }
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let output = Output::new(config.output.format.into(), config.output.verbosity());
    match output.render(&results) {
        Ok(rendered) => println!("{}", rendered.trim_end()),
        Err(e) => {
            reporter.report_error(&e);
            return ExitCode::from(EXIT_USAGE);
        }
    }

    if results.has_errors() {
        ExitCode::from(EXIT_INVALID)
    } else {
        ExitCode::from(EXIT_VALID)
    }
}

async fn run(cli: &Cli, config: &Config) -> anyhow::Result<ValidationResults> {
    let validator = Validator::with_options(config.registry.on_duplicate, config.registry.strict_lists);

    let loader = SchemaLoader::with_discovery(
        FileDiscovery::new().with_extensions(config.files.schema_extensions.clone()),
    );
    let loaded = loader.load_path(&validator, &cli.schemas).await?;
    debug!(schemas = ?loaded, "loaded schemas");

    let name = match &cli.name {
        Some(name) => name.clone(),
        None => {
            let names = validator.names();
            match names.as_slice() {
                [only] => only.clone(),
                [] => bail!("No schema files found in {}", cli.schemas.display()),
                _ => bail!(
                    "Several schemas loaded ({}); choose one with --name",
                    names.join(", ")
                ),
            }
        }
    };
    // fail before touching data files
    validator.schema(&name)?;

    let files = discover_data_files(&cli.data, config).await?;
    if files.is_empty() {
        warn!("no data files matched");
    }

    let settings = ConfigManager::validation_settings(config);
    Ok(validator.validate_files(&name, files, &settings).await?)
}

/// Explicit files are always validated; directories are walked with the
/// configured extensions and patterns
async fn discover_data_files(paths: &[PathBuf], config: &Config) -> Result<Vec<PathBuf>, SchemaError> {
    let discovery = FileDiscovery::new()
        .with_extensions(config.files.data_extensions.clone())
        .with_include_patterns(config.files.include_patterns.clone())?
        .with_exclude_patterns(config.files.exclude_patterns.clone())?
        .with_max_depth(config.files.max_depth);

    let mut files = Vec::new();
    for path in paths {
        if tokio::fs::metadata(path).await?.is_file() {
            files.push(path.clone());
        } else {
            files.extend(discovery.discover_files(path).await?);
        }
    }
    Ok(files)
}
