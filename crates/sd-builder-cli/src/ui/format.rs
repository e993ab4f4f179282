//! Formatting for sizes, durations and build summaries.

use std::time::Duration;

use console::Term;
use owo_colors::OwoColorize;

use crate::build::BuildSummary;

/// Format a byte count using the largest fitting unit (B, KB, MB, GB).
///
/// ```
/// use sd_builder_cli::ui::format_size;
///
/// assert_eq!(format_size(500), "500 B");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];

    let mut size = bytes as f64;
    let mut unit_idx = 0;
    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}

/// Format a duration as `50ms`, `1.50s` or `1m 30s`.
pub fn format_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();

    if total_ms < 1000 {
        format!("{}ms", total_ms)
    } else if total_ms < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// Print one line per step with its artifact size and time, then a total.
pub fn print_build_summary(summary: &BuildSummary) {
    let width = (Term::stderr().size().1 as usize).min(80);

    eprintln!("\n{}", "Build Summary".bold().underline());
    eprintln!("{}", "─".repeat(width));

    let mut total_size = 0;
    for report in &summary.steps {
        let detail = match &report.outcome.skipped {
            Some(reason) => format!("skipped: {}", reason),
            None => {
                let size: u64 = report
                    .outcome
                    .artifacts
                    .iter()
                    .filter_map(|path| std::fs::metadata(path).ok())
                    .map(|meta| meta.len())
                    .sum();
                total_size += size;
                format_size(size)
            }
        };

        eprintln!(
            "  {} {} {} {}",
            "▸".blue(),
            report.id.as_str().bright_white().bold(),
            detail.dimmed(),
            format!("({})", format_duration(report.duration)).dimmed()
        );
    }

    eprintln!("{}", "─".repeat(width));
    eprintln!(
        "  {} {} in {}",
        "Total:".bold(),
        format_size(total_size).green(),
        format_duration(summary.duration).green()
    );
}
