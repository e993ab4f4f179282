//! Runtime configuration handed to the served application.
//!
//! In development the values come from the project's `.env` file; in
//! production they come from process variables carrying
//! [`APP_CONFIG_PREFIX`]. Either way the result is serialized into
//! `app-config.js` as `window.APP_CONFIG = {...};`.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Serialize;

use crate::options::{BuildOptions, Environment};

/// Prefix marking process variables that belong to the runtime config.
pub const APP_CONFIG_PREFIX: &str = "__APP_CONFIG__";

/// Collect `__APP_CONFIG__*` variables with the prefix stripped.
pub fn collect_prefixed(vars: &HashMap<String, String>) -> BTreeMap<String, String> {
    vars.iter()
        .filter_map(|(key, value)| {
            key.strip_prefix(APP_CONFIG_PREFIX)
                .filter(|stripped| !stripped.is_empty())
                .map(|stripped| (stripped.to_string(), value.clone()))
        })
        .collect()
}

/// Parse a `.env` file. Best effort: any failure yields an empty map.
pub fn read_env_file(path: &Path) -> BTreeMap<String, String> {
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(err) => {
            tracing::warn!(
                "Failed to read configuration from file `{}`: {}",
                path.display(),
                err
            );
            return BTreeMap::new();
        }
    };

    let mut config = BTreeMap::new();
    for item in iter {
        match item {
            Ok((key, value)) => {
                config.insert(key, value);
            }
            Err(err) => {
                tracing::warn!("Skipping malformed line in `{}`: {}", path.display(), err);
            }
        }
    }
    config
}

/// Runtime configuration for the target environment of `options`.
pub fn runtime_config(options: &BuildOptions) -> BTreeMap<String, String> {
    match options.environment() {
        Environment::Development => read_env_file(&options.env_file_path()),
        Environment::Production => options.app_config_vars().clone(),
    }
}

/// Render the `app-config.js` source for `config`.
pub fn render_app_config(config: &BTreeMap<String, String>) -> Result<String, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    config.serialize(&mut serializer)?;
    // serde_json only ever emits UTF-8
    let json = String::from_utf8_lossy(&buf);
    Ok(format!("window.APP_CONFIG = {};", json))
}
