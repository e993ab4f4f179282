use std::sync::Arc;

use async_trait::async_trait;
use sd_builder_bundler::{BundlerBackend, BundlerSessionManager, SessionToken};
use sd_builder_config::BuildOptions;
use tokio::sync::Mutex;

use crate::build::step::{BuildStep, StepDescriptor, StepError, StepId, StepOutcome};

/// Bundles application and vendor scripts through the warm bundler session.
///
/// This is the only stateful step. The session manager sits behind an async
/// mutex, so concurrent runs of this step queue up instead of racing on the
/// session.
pub struct AllScriptsStep {
    manager: Mutex<BundlerSessionManager>,
}

impl AllScriptsStep {
    pub fn new(backend: Arc<dyn BundlerBackend>) -> Self {
        Self {
            manager: Mutex::new(BundlerSessionManager::new(backend)),
        }
    }

    /// Token of the live bundler session, if one exists.
    pub async fn session_token(&self) -> Option<SessionToken> {
        self.manager.lock().await.session_token()
    }
}

#[async_trait]
impl BuildStep for AllScriptsStep {
    fn descriptor(&self) -> StepDescriptor {
        StepDescriptor {
            id: StepId::AllScripts,
            inputs: &["app/**/*.{js,jsx,mjs,ts,tsx}", "deps.json"],
            output: "build/_assets/js",
        }
    }

    async fn run(&self, options: &BuildOptions) -> Result<StepOutcome, StepError> {
        let result = self.manager.lock().await.run(options).await?;
        tracing::debug!(
            token = %result.token,
            reused = result.reused,
            files = result.files.len(),
            "Scripts bundled"
        );
        Ok(StepOutcome::written(result.files))
    }

    async fn invalidate(&self) {
        self.manager.lock().await.invalidate();
    }
}
