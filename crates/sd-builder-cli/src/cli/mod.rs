//! Command-line interface definition for sd-builder.
//!
//! - `sd-builder build` - full build, or one step with `--only`
//! - `sd-builder config` - write the runtime configuration script
//! - `sd-builder dev` - build, serve and rebuild on change

mod commands;

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::Parser;
use sd_builder_config::{BuildOptions, ConfigOverrides};

pub use commands::{BuildArgs, Command, ConfigArgs, DevArgs};

use crate::error::{ConfigError, Result};

/// sd-builder - build orchestrator for browser applications
#[derive(Parser, Debug)]
#[command(
    name = "sd-builder",
    version,
    about = "Build orchestrator and dev server for browser applications",
    long_about = "sd-builder compiles an application source tree into a static bundle.\n\
                  In dev mode it serves the bundle with live reload and reruns only the\n\
                  build steps affected by each file change."
)]
pub struct Cli {
    /// Project root directory (defaults to ROOT_DIR, then the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub root_dir: Option<PathBuf>,

    /// Target environment: development or production (overrides NODE_ENV)
    #[arg(long, global = true, value_name = "ENV")]
    pub node_env: Option<String>,

    /// Execution environment tag exposed to the app (overrides EXEC_ENV)
    #[arg(long, global = true, value_name = "ENV")]
    pub exec_env: Option<String>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// CLI flags as the top configuration layer.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            root_dir: self.root_dir.clone(),
            node_env: self.node_env.clone(),
            exec_env: self.exec_env.clone(),
        }
    }

    /// Resolve build options from the process environment, the working
    /// directory and these flags.
    pub fn build_options(&self) -> Result<BuildOptions> {
        let vars = utf8_vars(std::env::vars_os());
        let cwd = std::env::current_dir()?;
        self.build_options_from(&vars, &cwd)
    }

    pub fn build_options_from(
        &self,
        vars: &HashMap<String, String>,
        cwd: &Path,
    ) -> Result<BuildOptions> {
        let options = BuildOptions::resolve_with(vars, cwd, &self.overrides());
        if !options.root_dir().is_dir() {
            return Err(ConfigError::RootNotFound(options.root_dir().to_path_buf()).into());
        }
        Ok(options)
    }
}

/// Keep the variables whose name and value are valid UTF-8; skip the rest.
pub fn utf8_vars(
    vars: impl IntoIterator<Item = (OsString, OsString)>,
) -> HashMap<String, String> {
    vars.into_iter()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
        .collect()
}
