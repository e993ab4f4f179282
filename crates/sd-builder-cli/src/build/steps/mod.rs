//! The standard build steps.

mod app_config;
mod assets;
mod changelog;
mod fonts;
mod html;
mod scripts;
mod styles;
mod version;

pub use app_config::AppConfigStep;
pub use assets::{AppAssetsStep, RESERVED_ASSET_DIRS};
pub use changelog::AppChangelogStep;
pub use fonts::VendorFontsStep;
pub use html::MainHtmlStep;
pub use scripts::AllScriptsStep;
pub use styles::VendorStylesStep;
pub use version::AppVersionStep;

use std::path::{Path, PathBuf};

use crate::build::step::StepError;

/// Write `contents` to `path`, creating parent directories. Overwrites.
pub(crate) async fn write_artifact(
    path: &Path,
    contents: impl AsRef<[u8]>,
) -> Result<PathBuf, StepError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(StepError::io(parent))?;
    }
    tokio::fs::write(path, contents)
        .await
        .map_err(StepError::io(path))?;
    Ok(path.to_path_buf())
}

/// Copy `from` to `to`, creating parent directories. Overwrites.
pub(crate) async fn copy_artifact(from: &Path, to: &Path) -> Result<PathBuf, StepError> {
    if let Some(parent) = to.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(StepError::io(parent))?;
    }
    tokio::fs::copy(from, to)
        .await
        .map_err(StepError::io(from))?;
    Ok(to.to_path_buf())
}
