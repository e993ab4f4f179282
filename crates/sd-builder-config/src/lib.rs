//! Configuration layer for sd-builder.
//!
//! Everything in here is a leaf: resolving the immutable [`BuildOptions`]
//! snapshot from the process environment, reading the dependency manifest
//! (`deps.json`), and producing the runtime configuration object written
//! into the build directory as `app-config.js`.

pub mod app_config;
pub mod error;
pub mod manifest;
pub mod options;

// Re-export main types
pub use app_config::{APP_CONFIG_PREFIX, render_app_config, runtime_config};
pub use error::*;
pub use manifest::DependencyManifest;
pub use options::{BuildOptions, ConfigOverrides, Environment};
