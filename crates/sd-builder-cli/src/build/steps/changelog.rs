use async_trait::async_trait;
use sd_builder_config::BuildOptions;

use super::copy_artifact;
use crate::build::step::{BuildStep, StepDescriptor, StepError, StepId, StepOutcome};

#[derive(Debug, Default)]
pub struct AppChangelogStep;

#[async_trait]
impl BuildStep for AppChangelogStep {
    fn descriptor(&self) -> StepDescriptor {
        StepDescriptor {
            id: StepId::AppChangelog,
            inputs: &["app/CHANGELOG.md"],
            output: "build/CHANGELOG.md",
        }
    }

    async fn run(&self, options: &BuildOptions) -> Result<StepOutcome, StepError> {
        let source = options.app_dir().join("CHANGELOG.md");
        if !source.is_file() {
            tracing::warn!("No changelog at {}", source.display());
            return Ok(StepOutcome::skipped("no app/CHANGELOG.md"));
        }

        let out = copy_artifact(&source, &options.build_dir().join("CHANGELOG.md")).await?;
        Ok(StepOutcome::written(vec![out]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_copies_changelog() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("app")).unwrap();
        std::fs::write(temp.path().join("app/CHANGELOG.md"), "# 1.0.0\n").unwrap();
        let options = BuildOptions::resolve(&HashMap::new(), temp.path());

        AppChangelogStep.run(&options).await.unwrap();
        assert_eq!(
            std::fs::read_to_string(options.build_dir().join("CHANGELOG.md")).unwrap(),
            "# 1.0.0\n"
        );
    }

    #[tokio::test]
    async fn test_missing_changelog_is_skipped() {
        let temp = TempDir::new().unwrap();
        let options = BuildOptions::resolve(&HashMap::new(), temp.path());

        let outcome = AppChangelogStep.run(&options).await.unwrap();
        assert!(outcome.skipped.is_some());
    }
}
