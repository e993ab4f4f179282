//! Logging setup for the `sd-builder` binary.
//!
//! Verbosity is chosen in this order:
//! 1. `--verbose`: DEBUG for every sd-builder crate
//! 2. `--quiet`: errors only
//! 3. `RUST_LOG`: custom filter
//! 4. INFO for every sd-builder crate

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const CRATES: [&str; 3] = ["sd_builder_cli", "sd_builder_bundler", "sd_builder_config"];

/// Build the filter for the given verbosity flags.
pub fn env_filter(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(directives("debug"))
    } else if quiet {
        EnvFilter::new(directives("error"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives("info")))
    }
}

fn directives(level: &str) -> String {
    CRATES
        .iter()
        .map(|krate| format!("{}={}", krate, level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the global tracing subscriber. Call once, before any logging.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color && should_use_colors())
        .compact();

    tracing_subscriber::registry()
        .with(env_filter(verbose, quiet))
        .with(fmt_layer)
        .init();
}

/// Whether stdout supports color, honouring `NO_COLOR` and `FORCE_COLOR`.
pub fn should_use_colors() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    console::Term::stdout().features().colors_supported()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directives_cover_every_crate() {
        assert_eq!(
            directives("debug"),
            "sd_builder_cli=debug,sd_builder_bundler=debug,sd_builder_config=debug"
        );
    }

    #[test]
    fn test_verbose_filter_enables_debug() {
        let filter = env_filter(true, true);
        assert!(filter.to_string().contains("sd_builder_cli=debug"));
    }

    #[test]
    fn test_quiet_filter_is_errors_only() {
        let filter = env_filter(false, true);
        assert!(filter.to_string().contains("sd_builder_bundler=error"));
    }
}
