//! # sd-builder-bundler
//!
//! Owns the long-lived script bundling session used by the `all-scripts`
//! build step.
//!
//! Bundler initialization is the most expensive operation in the pipeline,
//! so a session is created lazily, kept warm across rebuilds, and only torn
//! down when its configuration-affecting inputs (the dependency manifest)
//! change.
//!
//! ## Layout
//!
//! - [`session`]: the [`BundlerBackend`] / [`BundlerSession`] seam and the
//!   configuration a session is created from.
//! - [`manager`]: [`BundlerSessionManager`], the single owner of the live
//!   session (create, run, invalidate).
//! - [`rolldown_backend`]: production backend driving Rolldown in-process.
//! - [`diagnostics`]: compiler diagnostics extracted from backend errors.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sd_builder_bundler::{BundlerSessionManager, RolldownBackend};
//! # async fn example(options: &sd_builder_config::BuildOptions) -> sd_builder_bundler::Result<()> {
//! let mut manager = BundlerSessionManager::new(Arc::new(RolldownBackend::new()));
//! manager.run(options).await?; // creates the session
//! manager.run(options).await?; // reuses it
//! manager.invalidate();        // next run starts fresh
//! # Ok(())
//! # }
//! ```

pub mod diagnostics;
pub mod manager;
pub mod rolldown_backend;
pub mod session;
mod writer;

pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSeverity};
pub use manager::{BundleResult, BundlerSessionManager};
pub use rolldown_backend::RolldownBackend;
pub use session::{
    BundlerBackend, BundlerSession, EntrySpec, SessionConfig, SessionOutput, SessionToken,
};

use sd_builder_config::ManifestError;

/// Error types for bundler operations.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum Error {
    /// Compiler-level failure reported by the bundler backend.
    #[error("Bundler error: {}", format_bundler_error(.0))]
    #[diagnostic(code(sd_builder::bundle))]
    Bundler(Vec<Diagnostic>),

    /// The dependency manifest could not be loaded while configuring a session.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Output path escapes the output directory.
    #[error("Invalid output path: {0}")]
    InvalidOutputPath(String),

    /// File write operation failed.
    #[error("Write failure: {0}")]
    WriteFailure(String),
}

/// Result type alias for bundler operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a bundler error from a Rolldown error.
    pub fn from_rolldown_batch(error: &dyn std::fmt::Debug) -> Self {
        Error::Bundler(diagnostics::extract_from_rolldown_error(error))
    }

    /// Compiler diagnostics carried by this error, if any.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Error::Bundler(diagnostics) => diagnostics,
            _ => &[],
        }
    }
}

/// Format bundler error diagnostics for display.
fn format_bundler_error(diagnostics: &[Diagnostic]) -> String {
    if diagnostics.is_empty() {
        return "Unknown bundler error".to_string();
    }

    if diagnostics.len() == 1 {
        let diag = &diagnostics[0];
        format!("{}: {}", diag.kind, diag.message)
    } else {
        format!(
            "{} errors: {}",
            diagnostics.len(),
            diagnostics
                .iter()
                .map(|d| format!("{}: {}", d.kind, d.message))
                .collect::<Vec<_>>()
                .join("; ")
        )
    }
}
