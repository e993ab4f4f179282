use async_trait::async_trait;
use sd_builder_config::BuildOptions;
use walkdir::{DirEntry, WalkDir};

use super::copy_artifact;
use crate::build::step::{BuildStep, StepDescriptor, StepError, StepId, StepOutcome};

/// Top-level `build/_assets` directories owned by other steps.
///
/// `app/assets/{js,css,fonts}` are never copied: those output trees belong to
/// `all-scripts`, `vendor-styles` and `vendor-fonts`.
pub const RESERVED_ASSET_DIRS: [&str; 3] = ["js", "css", "fonts"];

/// Mirrors `app/assets/` into `build/_assets/`, except [`RESERVED_ASSET_DIRS`].
#[derive(Debug, Default)]
pub struct AppAssetsStep;

#[async_trait]
impl BuildStep for AppAssetsStep {
    fn descriptor(&self) -> StepDescriptor {
        StepDescriptor {
            id: StepId::AppAssets,
            inputs: &["app/assets/**"],
            output: "build/_assets",
        }
    }

    async fn run(&self, options: &BuildOptions) -> Result<StepOutcome, StepError> {
        let source_dir = options.app_dir().join("assets");
        if !source_dir.is_dir() {
            tracing::warn!("No assets directory at {}", source_dir.display());
            return Ok(StepOutcome::skipped("no app/assets directory"));
        }

        let target_dir = options.build_dir().join("_assets");
        let mut artifacts = Vec::new();

        let walker = WalkDir::new(&source_dir)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| !is_reserved(entry));

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(&source_dir).to_path_buf();
                StepError::Io {
                    path,
                    source: e.into(),
                }
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&source_dir) else {
                continue;
            };
            artifacts.push(copy_artifact(entry.path(), &target_dir.join(relative)).await?);
        }

        tracing::debug!("Copied {} asset files", artifacts.len());
        Ok(StepOutcome::written(artifacts))
    }
}

fn is_reserved(entry: &DirEntry) -> bool {
    let reserved = entry.depth() == 1
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| RESERVED_ASSET_DIRS.contains(&name));
    if reserved {
        tracing::warn!(
            "Ignoring {}: this directory is reserved for generated assets",
            entry.path().display()
        );
    }
    reserved
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_copies_nested_tree() {
        let temp = TempDir::new().unwrap();
        let assets = temp.path().join("app/assets");
        std::fs::create_dir_all(assets.join("img/icons")).unwrap();
        std::fs::write(assets.join("logo.svg"), "<svg/>").unwrap();
        std::fs::write(assets.join("img/icons/a.png"), [0u8, 1, 2]).unwrap();

        let options = BuildOptions::resolve(&HashMap::new(), temp.path());
        let outcome = AppAssetsStep.run(&options).await.unwrap();

        assert_eq!(outcome.artifacts.len(), 2);
        let out = options.build_dir().join("_assets");
        assert_eq!(std::fs::read_to_string(out.join("logo.svg")).unwrap(), "<svg/>");
        assert_eq!(std::fs::read(out.join("img/icons/a.png")).unwrap(), vec![0u8, 1, 2]);
    }

    #[tokio::test]
    async fn test_missing_assets_dir_is_skipped() {
        let temp = TempDir::new().unwrap();
        let options = BuildOptions::resolve(&HashMap::new(), temp.path());

        let outcome = AppAssetsStep.run(&options).await.unwrap();
        assert!(outcome.skipped.is_some());
        assert!(!options.build_dir().join("_assets").exists());
    }

    #[tokio::test]
    async fn test_reserved_directories_are_not_copied() {
        let temp = TempDir::new().unwrap();
        let assets = temp.path().join("app/assets");
        for dir in ["js", "css", "fonts", "img/js"] {
            std::fs::create_dir_all(assets.join(dir)).unwrap();
            std::fs::write(assets.join(dir).join("file.txt"), dir).unwrap();
        }

        let options = BuildOptions::resolve(&HashMap::new(), temp.path());
        let outcome = AppAssetsStep.run(&options).await.unwrap();

        let out = options.build_dir().join("_assets");
        assert_eq!(outcome.artifacts, vec![out.join("img/js/file.txt")]);
        for dir in RESERVED_ASSET_DIRS {
            assert!(!out.join(dir).exists(), "{} was copied", dir);
        }
    }
}
