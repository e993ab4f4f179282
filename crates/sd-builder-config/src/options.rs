//! Immutable build options resolved once per invocation.
//!
//! Resolution layers, lowest to highest priority:
//! defaults < process environment (`ROOT_DIR`, `NODE_ENV`, `EXEC_ENV`) < CLI overrides.
//! Resolution never fails; anything unusable falls back to the defaults.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use figment::{Figment, providers::Serialized};
use path_clean::PathClean;
use serde::{Deserialize, Serialize};

use crate::app_config::collect_prefixed;

/// Default execution environment tag.
pub const DEFAULT_EXEC_ENV: &str = "browser";

/// Target environment of a build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment: {}", other)),
        }
    }
}

/// Overrides supplied by the caller (usually CLI flags).
///
/// Also used as the figment layer type: unset fields are skipped on
/// serialization so they never shadow a lower layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_env: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec_env: Option<String>,
}

impl ConfigOverrides {
    fn from_vars(vars: &HashMap<String, String>) -> Self {
        let non_empty = |key: &str| {
            vars.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Self {
            root_dir: non_empty("ROOT_DIR").map(PathBuf::from),
            node_env: non_empty("NODE_ENV"),
            exec_env: non_empty("EXEC_ENV"),
        }
    }
}

/// Read-only snapshot shared by every build step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    root_dir: PathBuf,
    app_dir: PathBuf,
    build_dir: PathBuf,
    environment: Environment,
    exec_env: String,
    minify_files: bool,
    app_config_vars: BTreeMap<String, String>,
}

impl BuildOptions {
    /// Resolve options from environment variables and the working directory.
    pub fn resolve(vars: &HashMap<String, String>, cwd: &Path) -> Self {
        Self::resolve_with(vars, cwd, &ConfigOverrides::default())
    }

    /// Resolve options with caller overrides layered on top of the environment.
    pub fn resolve_with(
        vars: &HashMap<String, String>,
        cwd: &Path,
        overrides: &ConfigOverrides,
    ) -> Self {
        let defaults = ConfigOverrides {
            root_dir: Some(cwd.to_path_buf()),
            node_env: Some(Environment::default().as_str().to_string()),
            exec_env: Some(DEFAULT_EXEC_ENV.to_string()),
        };

        let layered: ConfigOverrides = Figment::new()
            .merge(Serialized::defaults(&defaults))
            .merge(Serialized::defaults(ConfigOverrides::from_vars(vars)))
            .merge(Serialized::defaults(overrides))
            .extract()
            .unwrap_or_else(|err| {
                tracing::warn!("Ignoring unusable build configuration: {}", err);
                defaults.clone()
            });

        let root_dir = match layered.root_dir {
            Some(root) if root.is_absolute() => root.clean(),
            Some(root) => cwd.join(root).clean(),
            None => cwd.to_path_buf(),
        };

        let environment = layered
            .node_env
            .as_deref()
            .map(|raw| {
                raw.parse().unwrap_or_else(|err| {
                    tracing::warn!("{}, falling back to {}", err, Environment::default());
                    Environment::default()
                })
            })
            .unwrap_or_default();

        let exec_env = layered
            .exec_env
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_EXEC_ENV.to_string());

        Self {
            app_dir: root_dir.join("app"),
            build_dir: root_dir.join("build"),
            root_dir,
            environment,
            exec_env,
            minify_files: environment.is_production(),
            app_config_vars: collect_prefixed(vars),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn app_dir(&self) -> &Path {
        &self.app_dir
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn exec_env(&self) -> &str {
        &self.exec_env
    }

    pub fn minify_files(&self) -> bool {
        self.minify_files
    }

    /// `__APP_CONFIG__*` variables captured at resolution time, prefix stripped.
    pub fn app_config_vars(&self) -> &BTreeMap<String, String> {
        &self.app_config_vars
    }

    /// `<root>/deps.json`
    pub fn manifest_path(&self) -> PathBuf {
        self.root_dir.join("deps.json")
    }

    /// `<root>/.env`
    pub fn env_file_path(&self) -> PathBuf {
        self.root_dir.join(".env")
    }

    /// `<root>/package.json`
    pub fn package_json_path(&self) -> PathBuf {
        self.root_dir.join("package.json")
    }

    /// Resolve a manifest entry against the project root.
    pub fn resolve_from_root(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root_dir.join(path)
        }
    }
}
