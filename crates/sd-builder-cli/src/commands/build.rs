//! `sd-builder build`: one-shot full build or a single named step.

use std::sync::Arc;

use sd_builder_config::BuildOptions;

use crate::build::{Orchestrator, StepRegistry};
use crate::cli::BuildArgs;
use crate::error::{BuildError, Result};
use crate::ui;

pub async fn execute(options: Arc<BuildOptions>, args: BuildArgs) -> Result<()> {
    ui::info(&format!(
        "Building {} for {} ({})",
        options.root_dir().display(),
        options.environment(),
        options.exec_env()
    ));

    let orchestrator = Orchestrator::new(Arc::new(StepRegistry::standard()), options);

    match args.only {
        Some(name) => {
            let report = orchestrator.build_named(&name).await.inspect_err(report_failures)?;
            match &report.outcome.skipped {
                Some(reason) => ui::warning(&format!("{} skipped: {}", report.id, reason)),
                None => ui::success(&format!(
                    "{} built in {}",
                    report.id,
                    ui::format_duration(report.duration)
                )),
            }
        }
        None => {
            let summary = orchestrator.build_all().await.inspect_err(report_failures)?;
            ui::print_build_summary(&summary);
            ui::success(&format!(
                "Build completed in {}",
                ui::format_duration(summary.duration)
            ));
        }
    }

    Ok(())
}

/// Print every failing step before the error is returned to `main`.
pub(crate) fn report_failures(err: &BuildError) {
    for failure in err.failures() {
        ui::error(&format!("{} failed: {}", failure.step, failure.message));
    }
}
