use clap::{Args, Subcommand};

/// Available sd-builder subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the application into the build directory
    ///
    /// Runs every build step concurrently. A failing step does not stop the
    /// others; every failure is reported and the command exits non-zero.
    Build(BuildArgs),

    /// Write the runtime configuration script (build/app-config.js)
    ///
    /// Development reads `.env`; production maps `__APP_CONFIG__*`
    /// environment variables with the prefix stripped.
    Config(ConfigArgs),

    /// Build, serve and rebuild on change
    ///
    /// Runs a full build, starts the dev server with live reload, and
    /// reruns only the steps affected by each file change.
    Dev(DevArgs),
}

/// Arguments for the build command
#[derive(Args, Debug, Default)]
pub struct BuildArgs {
    /// Run a single step instead of the full build
    ///
    /// Steps: main-html, all-scripts, app-assets, app-version,
    /// app-changelog, vendor-styles, vendor-fonts, app-config
    #[arg(long, value_name = "STEP")]
    pub only: Option<String>,
}

/// Arguments for the config command
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {}

/// Arguments for the dev command
#[derive(Args, Debug)]
pub struct DevArgs {
    /// Port for the development server
    ///
    /// The next free port is used if this one is taken.
    #[arg(short, long, default_value = "8080", value_name = "PORT")]
    pub port: u16,

    /// Quiet period before a burst of file changes triggers a rebuild
    #[arg(long, default_value = "100", value_name = "MS")]
    pub debounce_ms: u64,
}
