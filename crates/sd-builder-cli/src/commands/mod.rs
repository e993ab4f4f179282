//! Command implementations.
//!
//! Each command lives in its own module and exposes an `execute` function
//! taking the resolved [`BuildOptions`](sd_builder_config::BuildOptions) and
//! its parsed arguments.

pub mod build;
pub mod config;
pub mod dev;

pub use build::execute as build_execute;
pub use config::execute as config_execute;
pub use dev::execute as dev_execute;
