//! Shared fixtures: a small project tree and a bundler backend that writes a
//! fixed output instead of compiling.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use sd_builder_bundler::{BundlerBackend, BundlerSession, SessionConfig, SessionOutput, SessionToken};
use sd_builder_config::BuildOptions;
use tempfile::TempDir;

#[derive(Default)]
pub struct FakeBackend {
    pub created: AtomicUsize,
    pub runs: Arc<AtomicUsize>,
}

impl FakeBackend {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

struct FakeSession {
    config: SessionConfig,
    runs: Arc<AtomicUsize>,
}

impl BundlerBackend for FakeBackend {
    fn create(&self, config: SessionConfig) -> sd_builder_bundler::Result<Box<dyn BundlerSession>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            config,
            runs: Arc::clone(&self.runs),
        }))
    }
}

#[async_trait]
impl BundlerSession for FakeSession {
    fn token(&self) -> SessionToken {
        self.config.token
    }

    async fn run(&mut self) -> sd_builder_bundler::Result<SessionOutput> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        fs::create_dir_all(&self.config.out_dir)?;
        let mut files = Vec::new();
        for entry in &self.config.entries {
            let out = self.config.out_dir.join(format!("{}.js", entry.name));
            if let Some(parent) = out.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&out, format!("// {}", entry.import.display()))?;
            files.push(out);
        }
        Ok(SessionOutput { files })
    }
}

/// A project with every step input present.
pub fn project() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    write(root, "app/main.html", "<html><body>{{ NODE_ENV }}</body></html>\n");
    write(root, "app/main.jsx", "console.log('app');\n");
    write(root, "app/CHANGELOG.md", "# 1.2.3\n");
    write(root, "app/assets/img/logo.svg", "<svg/>");
    write(root, "package.json", r#"{"name": "demo", "version": "1.2.3"}"#);
    write(root, "vendor/a.css", ".a { color: red; }\n");
    write(root, "vendor/font.woff2", "woff2");
    write(
        root,
        "deps.json",
        r#"{"js": [], "css": ["vendor/a.css"], "fonts": ["vendor/font.woff2"]}"#,
    );
    temp
}

pub fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

pub fn options(root: &Path) -> BuildOptions {
    BuildOptions::resolve(&HashMap::new(), root)
}
