//! Result rendering
//!
//! Human output lists one line per file (colored on a terminal), JSON output
//! serializes the aggregated [`ValidationResults`], and the summary format
//! prints only the totals.

use std::time::Duration;

use crate::cli::{OutputFormat, VerbosityLevel};
use crate::error::Result;
use crate::validator::{FileValidationResult, ValidationResults, ValidationStatus};

pub struct Output {
    format: OutputFormat,
    verbosity: VerbosityLevel,
    show_colors: bool,
}

impl Output {
    pub fn new(format: OutputFormat, verbosity: VerbosityLevel) -> Self {
        Self {
            format,
            verbosity,
            show_colors: atty::is(atty::Stream::Stdout),
        }
    }

    pub fn with_colors(mut self, show_colors: bool) -> Self {
        self.show_colors = show_colors;
        self
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    /// Render results in the configured format
    pub fn render(&self, results: &ValidationResults) -> Result<String> {
        match self.format {
            OutputFormat::Human => Ok(self.format_results(results)),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(results)?),
            OutputFormat::Summary => Ok(self.format_summary(results)),
        }
    }

    pub fn format_results(&self, results: &ValidationResults) -> String {
        let mut output = String::new();

        for file_result in &results.file_results {
            let show = match self.verbosity {
                VerbosityLevel::Quiet => !file_result.status.is_valid(),
                VerbosityLevel::Normal | VerbosityLevel::Verbose => true,
            };
            if show {
                output.push_str(&self.format_file_result(file_result));
                output.push('\n');
            }
        }

        if self.verbosity != VerbosityLevel::Quiet {
            output.push('\n');
            output.push_str(&self.format_summary(results));
        }

        output
    }

    pub fn format_file_result(&self, result: &FileValidationResult) -> String {
        let path_display = result.path.display();
        let duration_str = format_duration(result.duration);

        match &result.status {
            ValidationStatus::Valid => {
                format!(
                    "{}  {} ({})",
                    self.colorize("✓ VALID", "32"),
                    path_display,
                    duration_str
                )
            }
            ValidationStatus::Invalid { error_count } => {
                let mut output = format!(
                    "{}  {} ({}) - {} field{} failed",
                    self.colorize("✗ INVALID", "31"),
                    path_display,
                    duration_str,
                    error_count,
                    if *error_count == 1 { "" } else { "s" }
                );

                // quiet and verbose both list violations; normal keeps one line per file
                if self.verbosity != VerbosityLevel::Normal {
                    for error_detail in &result.error_details {
                        output.push_str(&format!("\n    {}", error_detail));
                    }
                }
                output
            }
            ValidationStatus::Error { message } => {
                format!(
                    "{}  {} ({}) - {}",
                    self.colorize("⚠ ERROR", "33"),
                    path_display,
                    duration_str,
                    message
                )
            }
            ValidationStatus::Skipped { reason } => {
                format!(
                    "{}  {} - {}",
                    self.colorize("- SKIPPED", "36"),
                    path_display,
                    reason
                )
            }
        }
    }

    pub fn format_summary(&self, results: &ValidationResults) -> String {
        let mut output = String::new();
        output.push_str("Validation Summary:\n");
        output.push_str(&format!("  Total files: {}\n", results.total_files));
        output.push_str(&format!(
            "  {} {}\n",
            self.colorize("Valid:", "32"),
            results.valid_files
        ));

        if results.invalid_files > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Invalid:", "31"),
                results.invalid_files
            ));
        }
        if results.error_files > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Errors:", "33"),
                results.error_files
            ));
        }
        if results.skipped_files > 0 {
            output.push_str(&format!(
                "  {} {}\n",
                self.colorize("Skipped:", "36"),
                results.skipped_files
            ));
        }

        output.push_str(&format!("  Success rate: {:.1}%\n", results.success_rate()));
        output.push_str(&format!(
            "  Duration: {}\n",
            format_duration(results.total_duration)
        ));

        if self.verbosity == VerbosityLevel::Verbose && !results.schemas_used.is_empty() {
            output.push_str(&format!(
                "  Schemas: {}\n",
                results.schemas_used.join(", ")
            ));
        }

        output
    }
}

fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs_f64();
    if total_secs < 1.0 {
        format!("{}ms", duration.as_millis())
    } else if total_secs < 60.0 {
        format!("{:.2}s", total_secs)
    } else {
        let mins = (total_secs / 60.0) as u64;
        let secs = total_secs % 60.0;
        format!("{}m{:.1}s", mins, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaError;
    use crate::evaluator::Violations;
    use std::path::PathBuf;

    fn create_test_results() -> ValidationResults {
        let mut violations = Violations::new();
        violations.add("ships[0].id", "must be a valid UUID");

        ValidationResults::aggregate(vec![
            FileValidationResult::valid(
                PathBuf::from("leia.json"),
                "character".to_string(),
                Duration::from_millis(2),
            ),
            FileValidationResult::invalid(
                PathBuf::from("han.json"),
                "character".to_string(),
                &violations,
                Duration::from_millis(3),
            ),
            FileValidationResult::error(
                PathBuf::from("broken.json"),
                SchemaError::InvalidData {
                    details: "expected a JSON object at the root, got array".to_string(),
                },
                Duration::from_millis(1),
            ),
        ])
    }

    fn output(format: OutputFormat, verbosity: VerbosityLevel) -> Output {
        Output::new(format, verbosity).with_colors(false)
    }

    #[test]
    fn test_human_output() {
        let formatted = output(OutputFormat::Human, VerbosityLevel::Normal)
            .render(&create_test_results())
            .unwrap();

        assert!(formatted.contains("✓ VALID  leia.json (2ms)"));
        assert!(formatted.contains("✗ INVALID  han.json (3ms) - 1 field failed"));
        assert!(formatted.contains("⚠ ERROR  broken.json"));
        assert!(!formatted.contains("must be a valid UUID"));
        assert!(formatted.contains("Validation Summary:"));
        assert!(formatted.contains("Success rate: 33.3%"));
    }

    #[test]
    fn test_verbose_lists_violations() {
        let formatted = output(OutputFormat::Human, VerbosityLevel::Verbose)
            .render(&create_test_results())
            .unwrap();

        assert!(formatted.contains("\n    ships[0].id: must be a valid UUID"));
        assert!(formatted.contains("Schemas: character"));
    }

    #[test]
    fn test_quiet_shows_failures_only() {
        let formatted = output(OutputFormat::Human, VerbosityLevel::Quiet)
            .render(&create_test_results())
            .unwrap();

        assert!(!formatted.contains("leia.json"));
        assert!(formatted.contains("han.json"));
        assert!(formatted.contains("ships[0].id: must be a valid UUID"));
        assert!(!formatted.contains("Validation Summary:"));
    }

    #[test]
    fn test_json_output() {
        let formatted = output(OutputFormat::Json, VerbosityLevel::Normal)
            .render(&create_test_results())
            .unwrap();

        let value: serde_json::Value = serde_json::from_str(&formatted).unwrap();
        assert_eq!(value["total_files"], 3);
        assert_eq!(value["invalid_files"], 1);
        assert_eq!(
            value["file_results"][1]["error_details"][0],
            "ships[0].id: must be a valid UUID"
        );
    }

    #[test]
    fn test_summary_output() {
        let formatted = output(OutputFormat::Summary, VerbosityLevel::Normal)
            .render(&create_test_results())
            .unwrap();

        assert!(formatted.starts_with("Validation Summary:"));
        assert!(!formatted.contains("leia.json"));
        assert!(formatted.contains("Invalid: 1"));
        assert!(formatted.contains("Errors: 1"));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(15)), "15ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m30.0s");
    }
}
