//! Static table mapping changed paths to build reactions.

use std::path::{Path, PathBuf};

use sd_builder_config::BuildOptions;

use crate::build::StepId;

/// Source extensions that trigger a script rebuild.
pub const SCRIPT_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "ts", "tsx"];

/// Which paths a rule reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathMatcher {
    /// Exactly this file.
    File(PathBuf),
    /// Anything below `dir`, optionally restricted to some extensions.
    Subtree {
        dir: PathBuf,
        extensions: Option<&'static [&'static str]>,
    },
}

impl PathMatcher {
    pub fn matches(&self, path: &Path) -> bool {
        match self {
            PathMatcher::File(file) => path == file,
            PathMatcher::Subtree { dir, extensions } => {
                if path == dir || !path.starts_with(dir) {
                    return false;
                }
                match extensions {
                    None => true,
                    Some(allowed) => path
                        .extension()
                        .and_then(|ext| ext.to_str())
                        .is_some_and(|ext| allowed.contains(&ext)),
                }
            }
        }
    }
}

/// What to do when a rule fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    /// Drop warm state (the bundler session) before the steps rerun.
    pub invalidate_bundler: bool,
    pub steps: Vec<StepId>,
}

impl Reaction {
    pub fn run(steps: impl Into<Vec<StepId>>) -> Self {
        Self {
            invalidate_bundler: false,
            steps: steps.into(),
        }
    }

    pub fn invalidate_and_run(steps: impl Into<Vec<StepId>>) -> Self {
        Self {
            invalidate_bundler: true,
            steps: steps.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchRule {
    pub name: &'static str,
    pub matcher: PathMatcher,
    pub reaction: Reaction,
}

impl WatchRule {
    pub fn matches(&self, path: &Path) -> bool {
        self.matcher.matches(path)
    }
}

/// The dev-mode rule set for a project.
///
/// A dependency manifest change can add or remove vendor entries, so it
/// rebuilds the bundler session from scratch along with both vendor steps.
pub fn standard_rules(options: &BuildOptions) -> Vec<WatchRule> {
    let app = options.app_dir();
    vec![
        WatchRule {
            name: "html",
            matcher: PathMatcher::File(app.join("main.html")),
            reaction: Reaction::run([StepId::MainHtml]),
        },
        WatchRule {
            name: "scripts",
            matcher: PathMatcher::Subtree {
                dir: app.to_path_buf(),
                extensions: Some(SCRIPT_EXTENSIONS),
            },
            reaction: Reaction::run([StepId::AllScripts]),
        },
        WatchRule {
            name: "assets",
            matcher: PathMatcher::Subtree {
                dir: app.join("assets"),
                extensions: None,
            },
            reaction: Reaction::run([StepId::AppAssets]),
        },
        WatchRule {
            name: "env",
            matcher: PathMatcher::File(options.env_file_path()),
            reaction: Reaction::run([StepId::AppConfig]),
        },
        WatchRule {
            name: "manifest",
            matcher: PathMatcher::File(options.manifest_path()),
            reaction: Reaction::invalidate_and_run([
                StepId::AllScripts,
                StepId::VendorStyles,
                StepId::VendorFonts,
            ]),
        },
    ]
}

/// Indices of every rule matching `path`, in table order.
pub fn matching_rules(rules: &[WatchRule], path: &Path) -> Vec<usize> {
    rules
        .iter()
        .enumerate()
        .filter(|(_, rule)| rule.matches(path))
        .map(|(idx, _)| idx)
        .collect()
}
