//! Conversion of CLI errors into miette reports for terminal output.

use miette::Report;

use crate::error::{BuildError, CliError};

/// Convert CliError to miette Report
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Build(e) => build_error_to_miette(e),
        CliError::Config(e) => miette::miette!("Configuration error: {}", e),
        _ => miette::miette!("{}", err),
    }
}

/// Convert BuildError to miette Report
pub fn build_error_to_miette(err: BuildError) -> Report {
    match err {
        BuildError::StepsFailed { failures } if failures.len() > 1 => {
            let lines: Vec<String> = failures.iter().map(|f| format!("  {}", f)).collect();
            miette::miette!(
                help = "Fix the failing steps and rerun, or build one with --only <step>",
                "{} build steps failed:\n{}",
                failures.len(),
                lines.join("\n")
            )
        }
        _ => miette::miette!("{}", err),
    }
}
