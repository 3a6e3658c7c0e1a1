//! Validation entry point
//!
//! [`Validator`] owns a [`SchemaRegistry`] and a [`RuleEvaluator`]. Single
//! records go through [`Validator::validate`]; many records or files fan out
//! over a rayon pool once the schema has been looked up, so the registry lock
//! is only held for the lookup itself.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::compiler::{Compiler, RuleTree};
use crate::document::DocumentFormat;
use crate::error::{Result, SchemaError};
use crate::evaluator::{BuiltinEvaluator, RuleEvaluator, Violations};
use crate::normalizer::normalize;
use crate::registry::{DuplicatePolicy, SchemaRegistry};
use crate::rules::json_kind;
use crate::schema_loader::load_data_file;

/// Batch validation settings
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationConfig {
    /// Size of the evaluation thread pool and the file loading limit
    pub threads: usize,
    /// Stop after the first file that is not valid
    pub fail_fast: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            threads: num_cpus::get(),
            fail_fast: false,
        }
    }
}

/// Status of a single file validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationStatus {
    /// Every rule passed
    Valid,
    /// Data decoded but broke rules on `error_count` field paths
    Invalid { error_count: usize },
    /// The file could not be read or decoded
    Error { message: String },
    /// Not validated
    Skipped { reason: String },
}

impl ValidationStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationStatus::Valid)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, ValidationStatus::Invalid { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ValidationStatus::Error { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, ValidationStatus::Skipped { .. })
    }
}

/// Result of validating a single data file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileValidationResult {
    pub path: PathBuf,
    pub status: ValidationStatus,
    /// Schema name the file was checked against
    pub schema: Option<String>,
    pub duration: Duration,
    /// One `path: message` line per violation, or the error text
    pub error_details: Vec<String>,
}

impl FileValidationResult {
    pub fn valid(path: PathBuf, schema: String, duration: Duration) -> Self {
        Self {
            path,
            status: ValidationStatus::Valid,
            schema: Some(schema),
            duration,
            error_details: Vec::new(),
        }
    }

    pub fn invalid(
        path: PathBuf,
        schema: String,
        violations: &Violations,
        duration: Duration,
    ) -> Self {
        let error_details = violations
            .iter()
            .flat_map(|(field, messages)| {
                messages
                    .iter()
                    .map(move |message| format!("{}: {}", field, message))
            })
            .collect();

        Self {
            path,
            status: ValidationStatus::Invalid {
                error_count: violations.len(),
            },
            schema: Some(schema),
            duration,
            error_details,
        }
    }

    pub fn error(path: PathBuf, error: SchemaError, duration: Duration) -> Self {
        Self {
            path,
            status: ValidationStatus::Error {
                message: error.to_string(),
            },
            schema: None,
            duration,
            error_details: vec![error.to_string()],
        }
    }

    pub fn skipped(path: PathBuf, reason: String, duration: Duration) -> Self {
        Self {
            path,
            status: ValidationStatus::Skipped {
                reason: reason.clone(),
            },
            schema: None,
            duration,
            error_details: vec![reason],
        }
    }
}

/// Aggregated results of validating multiple files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResults {
    pub total_files: usize,
    pub valid_files: usize,
    pub invalid_files: usize,
    pub error_files: usize,
    pub skipped_files: usize,
    /// Sum of the per-file durations
    pub total_duration: Duration,
    pub average_duration: Duration,
    pub file_results: Vec<FileValidationResult>,
    /// Distinct schema names used, sorted
    pub schemas_used: Vec<String>,
}

impl ValidationResults {
    /// Aggregate individual file results into summary
    pub fn aggregate(file_results: Vec<FileValidationResult>) -> Self {
        let total_files = file_results.len();
        let mut valid_files = 0;
        let mut invalid_files = 0;
        let mut error_files = 0;
        let mut skipped_files = 0;
        let mut total_duration = Duration::ZERO;
        let mut schemas_used = std::collections::BTreeSet::new();

        for result in &file_results {
            match result.status {
                ValidationStatus::Valid => valid_files += 1,
                ValidationStatus::Invalid { .. } => invalid_files += 1,
                ValidationStatus::Error { .. } => error_files += 1,
                ValidationStatus::Skipped { .. } => skipped_files += 1,
            }

            total_duration += result.duration;

            if let Some(ref schema) = result.schema {
                schemas_used.insert(schema.clone());
            }
        }

        let average_duration = if total_files > 0 {
            total_duration / total_files as u32
        } else {
            Duration::ZERO
        };

        Self {
            total_files,
            valid_files,
            invalid_files,
            error_files,
            skipped_files,
            total_duration,
            average_duration,
            file_results,
            schemas_used: schemas_used.into_iter().collect(),
        }
    }

    /// Check if all files validated successfully
    pub fn all_valid(&self) -> bool {
        self.valid_files == self.total_files && self.total_files > 0
    }

    /// Check if any files had violations or errors
    pub fn has_errors(&self) -> bool {
        self.error_files > 0 || self.invalid_files > 0
    }

    /// Get success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.valid_files as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Registers schemas and validates JSON data against them
pub struct Validator {
    registry: SchemaRegistry,
    evaluator: Arc<dyn RuleEvaluator>,
}

impl Validator {
    /// Empty validator with the built-in evaluator and last-write-wins
    /// registration
    pub fn new() -> Self {
        Self::with_registry(SchemaRegistry::new())
    }

    pub fn with_registry(registry: SchemaRegistry) -> Self {
        Self {
            registry,
            evaluator: Arc::new(BuiltinEvaluator),
        }
    }

    /// Validator whose registry applies the given duplicate policy and list
    /// strictness
    pub fn with_options(policy: DuplicatePolicy, strict_lists: bool) -> Self {
        let compiler = Compiler::new().with_strict_lists(strict_lists);
        Self::with_registry(SchemaRegistry::with_options(compiler, policy))
    }

    /// Replace the rule evaluator
    pub fn with_evaluator(mut self, evaluator: impl RuleEvaluator + 'static) -> Self {
        self.evaluator = Arc::new(evaluator);
        self
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Compile TOML schema text and store it under `name`
    pub fn register_schema(&self, name: &str, schema_text: &str) -> Result<()> {
        self.registry.register(name, schema_text)
    }

    pub fn register_schema_as(
        &self,
        name: &str,
        schema_text: &str,
        format: DocumentFormat,
    ) -> Result<()> {
        self.registry
            .register_with(name, schema_text, format.decoder())
    }

    /// Validate one record against the schema registered as `name`
    pub fn validate(&self, name: &str, data: &Map<String, Value>) -> Result<Violations> {
        let rules = self.registry.get(name)?;
        Ok(self.evaluate(name, &rules, data.clone()))
    }

    /// Like [`validate`](Self::validate) but accepts any JSON value; anything
    /// other than an object is rejected
    pub fn validate_value(&self, name: &str, data: &Value) -> Result<Violations> {
        let rules = self.registry.get(name)?;
        let map = as_object(data)?;
        Ok(self.evaluate(name, &rules, map.clone()))
    }

    /// Validate many records against one schema in parallel
    ///
    /// An unknown schema fails the whole batch; a non-object record only fails
    /// its own slot.
    pub fn validate_batch(&self, name: &str, records: &[Value]) -> Result<Vec<Result<Violations>>> {
        let rules = self.registry.get(name)?;
        Ok(records
            .par_iter()
            .map(|record| {
                let map = as_object(record)?;
                Ok(self.evaluate(name, &rules, map.clone()))
            })
            .collect())
    }

    /// Load every data file and validate it against `name`
    ///
    /// Files are read concurrently, then evaluated on a blocking task that
    /// drives a rayon pool of `config.threads` workers, so the async runtime
    /// keeps running. Unreadable files become [`ValidationStatus::Error`]
    /// results rather than failing the run.
    pub async fn validate_files(
        &self,
        name: &str,
        files: Vec<PathBuf>,
        config: &ValidationConfig,
    ) -> Result<ValidationResults> {
        let batch = FileBatch {
            name: name.to_string(),
            rules: self.registry.get(name)?,
            evaluator: Arc::clone(&self.evaluator),
        };
        let loaded = load_all(files, config.threads.max(1)).await?;

        let config = config.clone();
        let file_results = tokio::task::spawn_blocking(move || batch.run(loaded, &config))
            .await
            .map_err(|e| SchemaError::Concurrency {
                details: format!("Validation task failed: {}", e),
            })??;

        Ok(ValidationResults::aggregate(file_results))
    }

    pub fn schema(&self, name: &str) -> Result<Arc<RuleTree>> {
        self.registry.get(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.registry.names()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    fn evaluate(&self, name: &str, rules: &RuleTree, data: Map<String, Value>) -> Violations {
        evaluate_record(self.evaluator.as_ref(), name, rules, data)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a blocking task needs to evaluate loaded files against one
/// schema
struct FileBatch {
    name: String,
    rules: Arc<RuleTree>,
    evaluator: Arc<dyn RuleEvaluator>,
}

impl FileBatch {
    fn run(&self, loaded: Vec<LoadedFile>, config: &ValidationConfig) -> Result<Vec<FileValidationResult>> {
        if config.fail_fast {
            return Ok(self.evaluate_until_failure(loaded));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads.max(1))
            .build()
            .map_err(|e| SchemaError::Concurrency {
                details: format!("Failed to build validation pool: {}", e),
            })?;
        Ok(pool.install(|| {
            loaded
                .into_par_iter()
                .map(|file| self.evaluate_file(file))
                .collect()
        }))
    }

    fn evaluate_file(&self, file: LoadedFile) -> FileValidationResult {
        let LoadedFile {
            path,
            data,
            load_time,
        } = file;
        let started = Instant::now();

        let map = match data.and_then(|value| match value {
            Value::Object(map) => Ok(map),
            other => Err(non_object(&other)),
        }) {
            Ok(map) => map,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not load data file");
                return FileValidationResult::error(path, e, load_time);
            }
        };

        let violations = evaluate_record(self.evaluator.as_ref(), &self.name, &self.rules, map);
        let duration = load_time + started.elapsed();
        if violations.is_empty() {
            FileValidationResult::valid(path, self.name.clone(), duration)
        } else {
            FileValidationResult::invalid(path, self.name.clone(), &violations, duration)
        }
    }

    fn evaluate_until_failure(&self, loaded: Vec<LoadedFile>) -> Vec<FileValidationResult> {
        let mut results = Vec::with_capacity(loaded.len());
        let mut failed = false;

        for file in loaded {
            if failed {
                results.push(FileValidationResult::skipped(
                    file.path,
                    "Skipped after an earlier failure (fail-fast)".to_string(),
                    Duration::ZERO,
                ));
                continue;
            }

            let result = self.evaluate_file(file);
            failed = !result.status.is_valid();
            results.push(result);
        }

        results
    }
}

fn evaluate_record(
    evaluator: &dyn RuleEvaluator,
    name: &str,
    rules: &RuleTree,
    data: Map<String, Value>,
) -> Violations {
    let record = normalize(data);
    let violations = evaluator.evaluate(&record, rules);
    debug!(
        schema = name,
        fields = record.len(),
        violations = violations.len(),
        "validated record"
    );
    violations
}

struct LoadedFile {
    path: PathBuf,
    data: Result<Value>,
    load_time: Duration,
}

/// Read data files with at most `limit` reads in flight, keeping input order
async fn load_all(files: Vec<PathBuf>, limit: usize) -> Result<Vec<LoadedFile>> {
    let semaphore = Arc::new(Semaphore::new(limit));
    let mut tasks = JoinSet::new();

    for (index, path) in files.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let started = Instant::now();
            let data = match semaphore.acquire_owned().await {
                Ok(_permit) => load_data_file(&path).await,
                Err(_) => Err(SchemaError::Concurrency {
                    details: "Failed to acquire file loading semaphore".to_string(),
                }),
            };
            (
                index,
                LoadedFile {
                    path,
                    data,
                    load_time: started.elapsed(),
                },
            )
        });
    }

    let mut loaded = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        loaded.push(joined.map_err(|e| SchemaError::Concurrency {
            details: format!("Task join error: {}", e),
        })?);
    }
    loaded.sort_by_key(|(index, _)| *index);

    Ok(loaded.into_iter().map(|(_, file)| file).collect())
}

fn as_object(data: &Value) -> Result<&Map<String, Value>> {
    data.as_object().ok_or_else(|| non_object(data))
}

fn non_object(data: &Value) -> SchemaError {
    SchemaError::InvalidData {
        details: format!("expected a JSON object at the root, got {}", json_kind(data)),
    }
}
