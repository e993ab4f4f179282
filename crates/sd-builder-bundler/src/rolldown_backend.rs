//! Production backend: an in-process Rolldown bundler kept alive per session.

use async_trait::async_trait;
use rolldown::{
    Bundler, BundlerBuilder, BundlerOptions, InputItem, Platform, RawMinifyOptions, SourceMapType,
};
use rolldown_common::Output;

use crate::session::{BundlerBackend, BundlerSession, SessionConfig, SessionOutput, SessionToken};
use crate::writer::{OutputFile, write_outputs};
use crate::{Error, Result};

#[derive(Debug, Default, Clone, Copy)]
pub struct RolldownBackend;

impl RolldownBackend {
    pub fn new() -> Self {
        Self
    }
}

impl BundlerBackend for RolldownBackend {
    fn create(&self, config: SessionConfig) -> Result<Box<dyn BundlerSession>> {
        let bundler = BundlerBuilder::default()
            .with_options(bundler_options(&config))
            .build()
            .map_err(|e| Error::from_rolldown_batch(&e))?;

        Ok(Box::new(RolldownSession { config, bundler }))
    }
}

fn bundler_options(config: &SessionConfig) -> BundlerOptions {
    BundlerOptions {
        input: Some(
            config
                .entries
                .iter()
                .map(|entry| InputItem {
                    name: Some(entry.name.clone()),
                    import: entry.import.to_string_lossy().into_owned(),
                })
                .collect(),
        ),
        cwd: Some(config.root_dir.clone()),
        platform: Some(Platform::Browser),
        sourcemap: config.source_maps.then_some(SourceMapType::File),
        minify: config.minify.then(|| RawMinifyOptions::from(true)),
        define: Some(config.defines.iter().cloned().collect()),
        ..Default::default()
    }
}

struct RolldownSession {
    config: SessionConfig,
    bundler: Bundler,
}

#[async_trait]
impl BundlerSession for RolldownSession {
    fn token(&self) -> SessionToken {
        self.config.token
    }

    async fn run(&mut self) -> Result<SessionOutput> {
        let bundle = self
            .bundler
            .generate()
            .await
            .map_err(|e| Error::from_rolldown_batch(&e))?;

        for warning in &bundle.warnings {
            tracing::warn!("{:?}", warning);
        }

        let files: Vec<OutputFile> = bundle
            .assets
            .iter()
            .map(|item| match item {
                Output::Chunk(chunk) => OutputFile {
                    filename: chunk.filename.to_string(),
                    content: chunk.code.as_bytes().to_vec(),
                },
                Output::Asset(asset) => OutputFile {
                    filename: asset.filename.to_string(),
                    content: asset.source.as_bytes().to_vec(),
                },
            })
            .collect();

        let out_dir = self.config.out_dir.clone();
        let written = tokio::task::spawn_blocking(move || write_outputs(&out_dir, &files))
            .await
            .map_err(|e| Error::WriteFailure(format!("Output writer task failed: {}", e)))??;

        tracing::debug!(token = %self.config.token, files = written.len(), "Bundle written");
        Ok(SessionOutput { files: written })
    }
}
