//! The seam between session management and the actual bundler.
//!
//! A [`BundlerBackend`] turns a [`SessionConfig`] into a live
//! [`BundlerSession`]. The session is the warm state: it is created once,
//! run any number of times, and dropped on invalidation.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sd_builder_config::{BuildOptions, DependencyManifest};

use crate::Result;

/// Entry name of the application bundle.
pub const APP_ENTRY_NAME: &str = "app";

/// Application entry point, relative to the app directory.
pub const APP_ENTRY_FILE: &str = "main.jsx";

/// Script output directory, relative to the build directory.
pub const SCRIPTS_OUT_DIR: &str = "_assets/js";

/// Opaque identity of a bundler session.
///
/// Tokens are handed out from a monotonic counter, so two distinct sessions
/// never share one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionToken(u64);

impl SessionToken {
    pub(crate) fn new(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// One named bundle entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySpec {
    pub name: String,
    pub import: PathBuf,
}

/// Everything a backend needs to create a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub token: SessionToken,
    pub root_dir: PathBuf,
    pub out_dir: PathBuf,
    pub entries: Vec<EntrySpec>,
    pub defines: Vec<(String, String)>,
    pub minify: bool,
    pub source_maps: bool,
}

impl SessionConfig {
    /// Derive the session configuration from build options and the
    /// dependency manifest's script list.
    pub fn from_options(
        token: SessionToken,
        options: &BuildOptions,
        manifest: &DependencyManifest,
    ) -> Self {
        let mut entries = vec![EntrySpec {
            name: APP_ENTRY_NAME.to_string(),
            import: options.app_dir().join(APP_ENTRY_FILE),
        }];

        let mut taken: HashSet<String> = HashSet::new();
        taken.insert(APP_ENTRY_NAME.to_string());
        for script in &manifest.scripts {
            let base = vendor_entry_name(script);
            // Scripts sharing a file stem get `-2`, `-3`, ... in manifest order.
            let mut name = base.clone();
            let mut n = 1;
            while !taken.insert(name.clone()) {
                n += 1;
                name = format!("{}-{}", base, n);
            }
            entries.push(EntrySpec {
                name,
                import: options.resolve_from_root(script),
            });
        }

        let defines = vec![
            (
                "process.env.NODE_ENV".to_string(),
                js_string_literal(options.environment().as_str()),
            ),
            (
                "process.env.EXEC_ENV".to_string(),
                js_string_literal(options.exec_env()),
            ),
        ];

        Self {
            token,
            root_dir: options.root_dir().to_path_buf(),
            out_dir: options.build_dir().join(SCRIPTS_OUT_DIR),
            entries,
            defines,
            minify: options.minify_files(),
            source_maps: true,
        }
    }
}

fn vendor_entry_name(script: &Path) -> String {
    let stem = script
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "vendor".to_string());
    format!("vendor/{}", stem)
}

fn js_string_literal(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

/// Result of one session run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionOutput {
    /// Files written, absolute.
    pub files: Vec<PathBuf>,
}

/// Creates bundler sessions.
pub trait BundlerBackend: Send + Sync {
    /// Create a session. This is the expensive part and happens at most once
    /// per session lifetime.
    fn create(&self, config: SessionConfig) -> Result<Box<dyn BundlerSession>>;
}

/// A live, reusable bundling session.
#[async_trait]
pub trait BundlerSession: Send {
    fn token(&self) -> SessionToken;

    /// Bundle the configured entries and write the output.
    async fn run(&mut self) -> Result<SessionOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn options(pairs: &[(&str, &str)]) -> BuildOptions {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BuildOptions::resolve(&vars, Path::new("/project"))
    }

    #[test]
    fn test_app_entry_comes_first() {
        let manifest = DependencyManifest {
            scripts: vec![PathBuf::from("node_modules/react/umd/react.js")],
            ..Default::default()
        };
        let config = SessionConfig::from_options(SessionToken::new(1), &options(&[]), &manifest);

        assert_eq!(config.entries.len(), 2);
        assert_eq!(config.entries[0].name, "app");
        assert_eq!(
            config.entries[0].import,
            Path::new("/project/app/main.jsx")
        );
        assert_eq!(config.entries[1].name, "vendor/react");
        assert_eq!(
            config.entries[1].import,
            Path::new("/project/node_modules/react/umd/react.js")
        );
        assert_eq!(config.out_dir, Path::new("/project/build/_assets/js"));
    }

    #[test]
    fn test_vendor_scripts_with_same_stem_get_distinct_names() {
        let manifest = DependencyManifest {
            scripts: vec![
                PathBuf::from("node_modules/a/index.js"),
                PathBuf::from("node_modules/b/index.js"),
                PathBuf::from("node_modules/c/index.mjs"),
            ],
            ..Default::default()
        };
        let config = SessionConfig::from_options(SessionToken::new(1), &options(&[]), &manifest);

        let names: Vec<_> = config.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["app", "vendor/index", "vendor/index-2", "vendor/index-3"]
        );
        assert_eq!(
            config.entries[2].import,
            Path::new("/project/node_modules/b/index.js")
        );
    }

    #[test]
    fn test_defines_and_minify_follow_environment() {
        let config = SessionConfig::from_options(
            SessionToken::new(1),
            &options(&[("NODE_ENV", "production"), ("EXEC_ENV", "cordova")]),
            &DependencyManifest::default(),
        );

        assert!(config.minify);
        assert!(config.source_maps);
        assert!(config.defines.contains(&(
            "process.env.NODE_ENV".to_string(),
            "\"production\"".to_string()
        )));
        assert!(config.defines.contains(&(
            "process.env.EXEC_ENV".to_string(),
            "\"cordova\"".to_string()
        )));
    }

    #[test]
    fn test_development_does_not_minify() {
        let config = SessionConfig::from_options(
            SessionToken::new(1),
            &options(&[]),
            &DependencyManifest::default(),
        );
        assert!(!config.minify);
        assert_eq!(config.entries.len(), 1);
    }
}
