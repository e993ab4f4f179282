use async_trait::async_trait;
use sd_builder_config::{BuildOptions, render_app_config, runtime_config};

use super::write_artifact;
use crate::build::step::{BuildStep, StepDescriptor, StepError, StepId, StepOutcome};

/// Writes the runtime configuration object to `build/app-config.js`.
#[derive(Debug, Default)]
pub struct AppConfigStep;

#[async_trait]
impl BuildStep for AppConfigStep {
    fn descriptor(&self) -> StepDescriptor {
        StepDescriptor {
            id: StepId::AppConfig,
            inputs: &[".env"],
            output: "build/app-config.js",
        }
    }

    async fn run(&self, options: &BuildOptions) -> Result<StepOutcome, StepError> {
        let config = runtime_config(options);
        tracing::debug!(keys = config.len(), "Rendering runtime configuration");
        let code = render_app_config(&config)?;

        let out = write_artifact(&options.build_dir().join("app-config.js"), code).await?;
        Ok(StepOutcome::written(vec![out]))
    }
}
