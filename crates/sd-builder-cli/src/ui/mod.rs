//! Terminal status output.
//!
//! ```no_run
//! use sd_builder_cli::ui;
//!
//! ui::init_colors(false);
//! ui::success("Build complete");
//! ```

mod format;
mod messages;

pub use format::{format_duration, format_size, print_build_summary};
pub use messages::{error, info, success, warning};

/// Check if running in a CI environment.
pub fn is_ci() -> bool {
    ["CI", "GITHUB_ACTIONS", "GITLAB_CI", "CIRCLECI", "TRAVIS"]
        .iter()
        .any(|var| std::env::var_os(var).is_some())
}

/// Check if color output should be enabled on stderr.
///
/// `NO_COLOR` wins over `FORCE_COLOR`; otherwise colors follow whether a
/// user is attached to stderr.
pub fn should_use_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    console::user_attended_stderr() && !is_ci()
}

/// Apply the color decision globally. `--no-color` forces colors off.
pub fn init_colors(no_color: bool) {
    let enabled = !no_color && should_use_color();
    console::set_colors_enabled_stderr(enabled);
    owo_colors::set_override(enabled);
}
