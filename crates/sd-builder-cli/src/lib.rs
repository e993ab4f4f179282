//! sd-builder CLI: build orchestration, incremental rebuilds and the dev
//! server for browser applications.
//!
//! - [`build`] - build steps, the step registry and the orchestrator
//! - [`dev`] - watch rules, the watch coordinator and the dev server
//! - [`error`] - error types with actionable messages
//! - [`logger`] - tracing setup
//! - [`ui`] - terminal status output
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sd_builder_cli::build::{Orchestrator, StepRegistry};
//! use sd_builder_config::BuildOptions;
//!
//! # async fn run() -> Result<(), sd_builder_cli::BuildError> {
//! let vars = sd_builder_cli::cli::utf8_vars(std::env::vars_os());
//! let options = BuildOptions::resolve(&vars, std::path::Path::new("."));
//! let orchestrator = Orchestrator::new(Arc::new(StepRegistry::standard()), Arc::new(options));
//! orchestrator.build_all().await?;
//! # Ok(())
//! # }
//! ```

pub mod build;
pub mod cli;
pub mod commands;
pub mod dev;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{BuildError, CliError, ConfigError, Result, StepFailure};
