//! Build step identity and the [`BuildStep`] trait.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use async_trait::async_trait;
use sd_builder_config::{BuildOptions, ManifestError};
use thiserror::Error;

/// Identifier of a registered build step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StepId {
    MainHtml,
    AllScripts,
    AppAssets,
    AppVersion,
    AppChangelog,
    VendorStyles,
    VendorFonts,
    AppConfig,
}

impl StepId {
    /// Every known step, in registration order.
    pub const ALL: [StepId; 8] = [
        StepId::MainHtml,
        StepId::AllScripts,
        StepId::AppAssets,
        StepId::AppVersion,
        StepId::AppChangelog,
        StepId::VendorStyles,
        StepId::VendorFonts,
        StepId::AppConfig,
    ];

    /// Steps run by a full build. `app-config` is run on its own.
    pub const FULL_BUILD: [StepId; 7] = [
        StepId::MainHtml,
        StepId::AllScripts,
        StepId::AppAssets,
        StepId::AppVersion,
        StepId::AppChangelog,
        StepId::VendorStyles,
        StepId::VendorFonts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StepId::MainHtml => "main-html",
            StepId::AllScripts => "all-scripts",
            StepId::AppAssets => "app-assets",
            StepId::AppVersion => "app-version",
            StepId::AppChangelog => "app-changelog",
            StepId::VendorStyles => "vendor-styles",
            StepId::VendorFonts => "vendor-fonts",
            StepId::AppConfig => "app-config",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StepId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Static description of a step: what it reads and what it writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepDescriptor {
    pub id: StepId,
    /// Source globs, relative to the project root.
    pub inputs: &'static [&'static str],
    /// Artifact path, relative to the project root.
    pub output: &'static str,
}

/// What a successful step run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOutcome {
    pub artifacts: Vec<PathBuf>,
    /// Set when the step had nothing to do, with the reason.
    pub skipped: Option<String>,
}

impl StepOutcome {
    pub fn written(artifacts: Vec<PathBuf>) -> Self {
        Self {
            artifacts,
            skipped: None,
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            artifacts: Vec::new(),
            skipped: Some(reason.into()),
        }
    }
}

/// Failure of a single step run.
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Bundle(#[from] sd_builder_bundler::Error),

    #[error("Failed to render template {}: {source}", .path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: minijinja::Error,
    },

    #[error("Failed to process CSS: {0}")]
    Css(String),

    #[error("Invalid package metadata in {}: {message}", .path.display())]
    PackageMetadata { path: PathBuf, message: String },

    #[error("Failed to serialize runtime configuration: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StepError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| StepError::Io { path, source }
    }
}

/// A named, idempotent unit of build work.
///
/// Runs overwrite their artifacts, so a step can be rerun any number of
/// times without accumulating side effects.
#[async_trait]
pub trait BuildStep: Send + Sync {
    fn descriptor(&self) -> StepDescriptor;

    async fn run(&self, options: &BuildOptions) -> Result<StepOutcome, StepError>;

    /// Drop any warm state so the next run starts fresh.
    async fn invalidate(&self) {}
}
