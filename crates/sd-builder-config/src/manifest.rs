//! Dependency manifest (`deps.json`) loading.
//!
//! The manifest lists vendor files that are bundled verbatim:
//!
//! ```json
//! { "js": ["node_modules/a/a.js"], "css": ["a.css"], "fonts": ["f.woff2"] }
//! ```
//!
//! Every key is optional. The manifest is read from disk on every call and
//! never cached, so edits are picked up without restarting the process.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ManifestError, Result};

/// Vendor assets grouped by class, each list kept in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyManifest {
    #[serde(rename = "js", default)]
    pub scripts: Vec<PathBuf>,

    #[serde(rename = "css", default)]
    pub styles: Vec<PathBuf>,

    #[serde(default)]
    pub fonts: Vec<PathBuf>,
}

impl DependencyManifest {
    /// Load the manifest at `path`.
    ///
    /// A missing file yields an empty manifest. A file that exists but is not
    /// a valid manifest yields [`ManifestError::Parse`].
    pub fn read(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                tracing::debug!("No dependency manifest at {}", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ManifestError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        Self::parse(&content).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse manifest JSON.
    pub fn parse(content: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty() && self.styles.is_empty() && self.fonts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty_manifest() {
        let temp = TempDir::new().unwrap();
        let manifest = DependencyManifest::read(&temp.path().join("deps.json")).unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn test_partial_manifest_defaults_missing_classes() {
        let manifest = DependencyManifest::parse(r#"{"css": ["a.css", "b.css"]}"#).unwrap();
        assert_eq!(
            manifest.styles,
            vec![PathBuf::from("a.css"), PathBuf::from("b.css")]
        );
        assert!(manifest.scripts.is_empty());
        assert!(manifest.fonts.is_empty());
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let manifest =
            DependencyManifest::parse(r#"{"js": ["x.js"], "comment": "vendor"}"#).unwrap();
        assert_eq!(manifest.scripts, vec![PathBuf::from("x.js")]);
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("deps.json");
        std::fs::write(&path, "{ \"js\": [").unwrap();

        let err = DependencyManifest::read(&path).unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
        assert_eq!(err.path(), path.as_path());
    }

    #[test]
    fn test_wrong_shape_is_parse_error() {
        assert!(DependencyManifest::parse(r#"{"fonts": "a.woff"}"#).is_err());
    }
}
