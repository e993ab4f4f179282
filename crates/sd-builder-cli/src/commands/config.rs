//! `sd-builder config`: write `app-config.js`.

use std::sync::Arc;

use sd_builder_config::BuildOptions;

use crate::build::{Orchestrator, StepId, StepRegistry};
use crate::cli::ConfigArgs;
use crate::error::Result;
use crate::ui;

pub async fn execute(options: Arc<BuildOptions>, _args: ConfigArgs) -> Result<()> {
    let source = if options.environment().is_production() {
        "__APP_CONFIG__* variables".to_string()
    } else {
        options.env_file_path().display().to_string()
    };
    ui::info(&format!("Writing runtime configuration from {}", source));

    let orchestrator = Orchestrator::new(Arc::new(StepRegistry::standard()), options);
    let report = orchestrator
        .build_one(StepId::AppConfig)
        .await
        .inspect_err(super::build::report_failures)?;

    for artifact in &report.outcome.artifacts {
        ui::success(&format!("Wrote {}", artifact.display()));
    }
    Ok(())
}
