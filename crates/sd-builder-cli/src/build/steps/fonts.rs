use async_trait::async_trait;
use sd_builder_config::{BuildOptions, DependencyManifest};

use super::copy_artifact;
use crate::build::step::{BuildStep, StepDescriptor, StepError, StepId, StepOutcome};

/// Copies the manifest's font files into `_assets/fonts/`, keeping names.
#[derive(Debug, Default)]
pub struct VendorFontsStep;

#[async_trait]
impl BuildStep for VendorFontsStep {
    fn descriptor(&self) -> StepDescriptor {
        StepDescriptor {
            id: StepId::VendorFonts,
            inputs: &["deps.json"],
            output: "build/_assets/fonts",
        }
    }

    async fn run(&self, options: &BuildOptions) -> Result<StepOutcome, StepError> {
        let manifest = DependencyManifest::read(&options.manifest_path())?;
        if manifest.fonts.is_empty() {
            return Ok(StepOutcome::skipped("no fonts in dependency manifest"));
        }

        let fonts_dir = options.build_dir().join("_assets/fonts");
        let mut artifacts = Vec::with_capacity(manifest.fonts.len());

        for font in &manifest.fonts {
            let source = options.resolve_from_root(font);
            let Some(name) = source.file_name() else {
                tracing::warn!("Skipping font entry without a file name: {}", font.display());
                continue;
            };
            artifacts.push(copy_artifact(&source, &fonts_dir.join(name)).await?);
        }

        Ok(StepOutcome::written(artifacts))
    }
}
