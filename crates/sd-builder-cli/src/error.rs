//! Error types for the sd-builder CLI.
//!
//! `CliError` is what commands return. Domain errors (`ConfigError`,
//! `BuildError`) convert into it via `#[from]` and carry a hint line where the
//! user can act on the failure.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::build::StepId;

mod report;

pub use report::{build_error_to_miette, cli_error_to_miette};

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid environment or command-line configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// One or more build steps failed
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Development server errors
    #[error("Server error: {0}")]
    Server(String),

    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// Generic errors with custom messages
    #[error("{0}")]
    Custom(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid value for a configuration option
    #[error("Invalid value for '{field}': {value}\n\nHint: {hint}")]
    InvalidValue {
        field: String,
        value: String,
        hint: String,
    },

    /// The project root does not exist or is not a directory
    #[error("Project root not found: {}\n\nHint: Pass --root-dir or set ROOT_DIR to the project directory", .0.display())]
    RootNotFound(PathBuf),
}

/// A single step that did not finish successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    pub step: StepId,
    pub message: String,
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.step, self.message)
    }
}

/// Build orchestration errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// At least one step failed. Failures are ordered by step name.
    #[error("{}", format_failures(.failures))]
    StepsFailed { failures: Vec<StepFailure> },

    #[error("Unknown build step '{0}'\n\nHint: Valid steps are {names}", names = valid_step_names())]
    UnknownStep(String),

    #[error("Build step '{0}' is not registered")]
    NotRegistered(StepId),
}

impl BuildError {
    /// Steps that failed, empty for non-step errors.
    pub fn failures(&self) -> &[StepFailure] {
        match self {
            BuildError::StepsFailed { failures } => failures,
            _ => &[],
        }
    }
}

fn format_failures(failures: &[StepFailure]) -> String {
    match failures {
        [single] => format!("Step {} failed: {}", single.step, single.message),
        many => {
            let lines: Vec<String> = many.iter().map(|f| format!("  - {}", f)).collect();
            format!("{} steps failed:\n{}", many.len(), lines.join("\n"))
        }
    }
}

fn valid_step_names() -> String {
    StepId::ALL
        .iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_step_lists_valid_names() {
        let msg = BuildError::UnknownStep("all-styles".to_string()).to_string();
        assert!(msg.contains("Unknown build step 'all-styles'"));
        assert!(msg.contains("Hint:"));
        for id in StepId::ALL {
            assert!(msg.contains(id.as_str()));
        }
    }

    #[test]
    fn test_single_failure_message() {
        let err = BuildError::StepsFailed {
            failures: vec![StepFailure {
                step: StepId::MainHtml,
                message: "template missing".to_string(),
            }],
        };
        assert_eq!(err.to_string(), "Step main-html failed: template missing");
    }

    #[test]
    fn test_multiple_failures_are_listed() {
        let err = BuildError::StepsFailed {
            failures: vec![
                StepFailure {
                    step: StepId::AllScripts,
                    message: "parse error".to_string(),
                },
                StepFailure {
                    step: StepId::VendorStyles,
                    message: "missing file".to_string(),
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("2 steps failed:"));
        assert!(msg.contains("  - all-scripts: parse error"));
        assert!(msg.contains("  - vendor-styles: missing file"));
        assert_eq!(err.failures().len(), 2);
    }

    #[test]
    fn test_cli_error_from_build_error() {
        let cli_err: CliError = BuildError::NotRegistered(StepId::AppConfig).into();
        assert!(matches!(cli_err, CliError::Build(_)));
    }

    #[test]
    fn test_config_error_invalid_value() {
        let err = ConfigError::InvalidValue {
            field: "port".to_string(),
            value: "0".to_string(),
            hint: "Use a port between 1 and 65535".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Invalid value for 'port'"));
        assert!(msg.contains("Hint: Use a port"));
    }
}
