use async_trait::async_trait;
use minijinja::{Environment, context};
use sd_builder_config::BuildOptions;

use super::write_artifact;
use crate::build::step::{BuildStep, StepDescriptor, StepError, StepId, StepOutcome};

/// Renders `app/main.html` into `build/index.html`.
///
/// The template sees `NODE_ENV` and `EXEC_ENV`, so a page can switch on the
/// target with `{% if NODE_ENV == "production" %}`.
#[derive(Debug, Default)]
pub struct MainHtmlStep;

#[async_trait]
impl BuildStep for MainHtmlStep {
    fn descriptor(&self) -> StepDescriptor {
        StepDescriptor {
            id: StepId::MainHtml,
            inputs: &["app/main.html"],
            output: "build/index.html",
        }
    }

    async fn run(&self, options: &BuildOptions) -> Result<StepOutcome, StepError> {
        let template_path = options.app_dir().join("main.html");
        let source = tokio::fs::read_to_string(&template_path)
            .await
            .map_err(StepError::io(&template_path))?;

        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        let html = env
            .render_str(
                &source,
                context! {
                    NODE_ENV => options.environment().as_str(),
                    EXEC_ENV => options.exec_env(),
                },
            )
            .map_err(|source| StepError::Template {
                path: template_path.clone(),
                source,
            })?;

        let out = write_artifact(&options.build_dir().join("index.html"), html).await?;
        Ok(StepOutcome::written(vec![out]))
    }
}
