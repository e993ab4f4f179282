//! Bundler session lifecycle.
//!
//! [`BundlerSessionManager`] is the only owner of the live session. It is
//! not internally synchronized: callers that share it wrap it in a
//! `tokio::sync::Mutex`, which also serializes concurrent runs.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sd_builder_config::{BuildOptions, DependencyManifest};

use crate::Result;
use crate::session::{BundlerBackend, BundlerSession, SessionConfig, SessionToken};

/// Outcome of a successful [`BundlerSessionManager::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleResult {
    pub token: SessionToken,
    /// `true` when an existing session was reused.
    pub reused: bool,
    pub files: Vec<PathBuf>,
    pub duration: Duration,
}

pub struct BundlerSessionManager {
    backend: Arc<dyn BundlerBackend>,
    session: Option<Box<dyn BundlerSession>>,
    next_token: u64,
}

impl BundlerSessionManager {
    pub fn new(backend: Arc<dyn BundlerBackend>) -> Self {
        Self {
            backend,
            session: None,
            next_token: 1,
        }
    }

    /// Token of the live session, if any.
    pub fn session_token(&self) -> Option<SessionToken> {
        self.session.as_ref().map(|session| session.token())
    }

    /// Bundle scripts, creating a session first if none is live.
    ///
    /// Session creation reads the dependency manifest; a malformed manifest
    /// fails the run and leaves the manager without a session. A compiler
    /// failure during the run is returned as is and the session stays warm.
    pub async fn run(&mut self, options: &BuildOptions) -> Result<BundleResult> {
        let start = Instant::now();

        let (session, reused) = match self.session.take() {
            Some(session) => (session, true),
            None => (self.create_session(options)?, false),
        };
        let session = self.session.insert(session);

        let token = session.token();
        tracing::debug!(%token, reused, "Running bundler session");

        let output = session.run().await?;

        Ok(BundleResult {
            token,
            reused,
            files: output.files,
            duration: start.elapsed(),
        })
    }

    /// Drop the live session. The next [`run`](Self::run) creates a new one.
    pub fn invalidate(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::debug!(token = %session.token(), "Bundler session invalidated");
        }
    }

    fn create_session(&mut self, options: &BuildOptions) -> Result<Box<dyn BundlerSession>> {
        let manifest = DependencyManifest::read(&options.manifest_path())?;

        let token = SessionToken::new(self.next_token);
        self.next_token += 1;

        let config = SessionConfig::from_options(token, options, &manifest);
        tracing::info!(
            %token,
            entries = config.entries.len(),
            minify = config.minify,
            "Creating bundler session"
        );

        self.backend.create(config)
    }
}

impl std::fmt::Debug for BundlerSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BundlerSessionManager")
            .field("session", &self.session_token())
            .field("next_token", &self.next_token)
            .finish()
    }
}
