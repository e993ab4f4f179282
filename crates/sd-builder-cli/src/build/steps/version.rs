use std::path::Path;

use async_trait::async_trait;
use sd_builder_config::BuildOptions;

use super::write_artifact;
use crate::build::step::{BuildStep, StepDescriptor, StepError, StepId, StepOutcome};

/// Writes `build/VERSION.txt` as `<version>` or `<version> - <revision>`.
#[derive(Debug, Default)]
pub struct AppVersionStep;

#[async_trait]
impl BuildStep for AppVersionStep {
    fn descriptor(&self) -> StepDescriptor {
        StepDescriptor {
            id: StepId::AppVersion,
            inputs: &["package.json", ".git/HEAD"],
            output: "build/VERSION.txt",
        }
    }

    async fn run(&self, options: &BuildOptions) -> Result<StepOutcome, StepError> {
        let version = package_version(&options.package_json_path()).await?;
        let line = match source_revision(options.root_dir()).await {
            Some(revision) => format!("{} - {}", version, revision),
            None => version,
        };

        let out = write_artifact(&options.build_dir().join("VERSION.txt"), line).await?;
        Ok(StepOutcome::written(vec![out]))
    }
}

async fn package_version(path: &Path) -> Result<String, StepError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(StepError::io(path))?;

    let package: serde_json::Value =
        serde_json::from_str(&raw).map_err(|e| StepError::PackageMetadata {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    package
        .get("version")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| StepError::PackageMetadata {
            path: path.to_path_buf(),
            message: "missing string field `version`".to_string(),
        })
}

/// Current source-control revision. Best effort: `git rev-parse HEAD`, then
/// `.git/ORIG_HEAD`, then nothing.
async fn source_revision(root: &Path) -> Option<String> {
    let output = tokio::process::Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(root)
        .output()
        .await;

    match output {
        Ok(output) if output.status.success() => {
            let revision = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !revision.is_empty() {
                return Some(revision);
            }
        }
        Ok(_) => tracing::warn!("Failed to get commit sha via git command"),
        Err(e) => tracing::warn!("Failed to get commit sha via git command: {}", e),
    }

    match tokio::fs::read_to_string(root.join(".git/ORIG_HEAD")).await {
        Ok(contents) => Some(contents.trim().to_string()).filter(|s| !s.is_empty()),
        Err(_) => {
            tracing::warn!("Failed to get commit sha by reading from ORIG_HEAD");
            None
        }
    }
}
