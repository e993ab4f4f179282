//! Runs build steps concurrently and aggregates their results.
//!
//! Steps write disjoint artifacts, so a full build spawns every step at once
//! on a [`JoinSet`] and waits for all of them. A failing step never cancels
//! its siblings; failures are collected and reported together.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sd_builder_config::BuildOptions;
use tokio::task::{Id as TaskId, JoinSet};

use crate::build::registry::StepRegistry;
use crate::build::step::{StepId, StepOutcome};
use crate::error::{BuildError, StepFailure};

/// Result of one successful step.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub id: StepId,
    pub outcome: StepOutcome,
    pub duration: Duration,
}

/// Successful result of a multi-step build.
#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub steps: Vec<StepReport>,
    pub duration: Duration,
}

impl BuildSummary {
    pub fn artifact_count(&self) -> usize {
        self.steps.iter().map(|s| s.outcome.artifacts.len()).sum()
    }
}

#[derive(Debug, Clone)]
pub struct Orchestrator {
    registry: Arc<StepRegistry>,
    options: Arc<BuildOptions>,
}

impl Orchestrator {
    pub fn new(registry: Arc<StepRegistry>, options: Arc<BuildOptions>) -> Self {
        Self { registry, options }
    }

    /// Run every full-build step concurrently.
    pub async fn build_all(&self) -> Result<BuildSummary, BuildError> {
        self.build_steps(&StepId::FULL_BUILD).await
    }

    /// Run a single step by its registered name.
    pub async fn build_named(&self, name: &str) -> Result<StepReport, BuildError> {
        let id = name
            .parse::<StepId>()
            .map_err(BuildError::UnknownStep)?;
        self.build_one(id).await
    }

    /// Run a single step.
    pub async fn build_one(&self, id: StepId) -> Result<StepReport, BuildError> {
        let step = self.registry.get(id)?;
        tracing::info!(step = %id, "Running step");

        let start = Instant::now();
        match step.run(&self.options).await {
            Ok(outcome) => {
                let duration = start.elapsed();
                log_outcome(id, &outcome, duration);
                Ok(StepReport {
                    id,
                    outcome,
                    duration,
                })
            }
            Err(err) => {
                tracing::error!(step = %id, "Step failed: {}", err);
                Err(BuildError::StepsFailed {
                    failures: vec![StepFailure {
                        step: id,
                        message: err.to_string(),
                    }],
                })
            }
        }
    }

    /// Run `ids` concurrently, succeeding only if every step succeeds.
    pub async fn build_steps(&self, ids: &[StepId]) -> Result<BuildSummary, BuildError> {
        let start = Instant::now();

        // Resolve every step before spawning anything.
        let steps = ids
            .iter()
            .map(|&id| self.registry.get(id).map(|step| (id, step)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut tasks = JoinSet::new();
        let mut task_steps: HashMap<TaskId, StepId> = HashMap::with_capacity(steps.len());

        for (id, step) in steps {
            let options = Arc::clone(&self.options);
            let handle = tasks.spawn(async move {
                tracing::debug!(step = %id, "Step started");
                let start = Instant::now();
                let result = step.run(&options).await;
                (id, result, start.elapsed())
            });
            task_steps.insert(handle.id(), id);
        }

        let mut reports = Vec::new();
        let mut failures = Vec::new();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((id, Ok(outcome), duration)) => {
                    log_outcome(id, &outcome, duration);
                    reports.push(StepReport {
                        id,
                        outcome,
                        duration,
                    });
                }
                Ok((id, Err(err), _)) => {
                    tracing::error!(step = %id, "Step failed: {}", err);
                    failures.push(StepFailure {
                        step: id,
                        message: err.to_string(),
                    });
                }
                Err(join_err) => {
                    let Some(&id) = task_steps.get(&join_err.id()) else {
                        tracing::error!("Untracked build task failed: {}", join_err);
                        continue;
                    };
                    tracing::error!(step = %id, "Step task aborted: {}", join_err);
                    failures.push(StepFailure {
                        step: id,
                        message: format!("step panicked: {}", join_err),
                    });
                }
            }
        }

        if !failures.is_empty() {
            failures.sort_by_key(|f| f.step.as_str());
            return Err(BuildError::StepsFailed { failures });
        }

        reports.sort_by_key(|r| r.id);
        let summary = BuildSummary {
            steps: reports,
            duration: start.elapsed(),
        };
        tracing::info!(
            steps = summary.steps.len(),
            artifacts = summary.artifact_count(),
            "Build finished in {:?}",
            summary.duration
        );
        Ok(summary)
    }
}

fn log_outcome(id: StepId, outcome: &StepOutcome, duration: Duration) {
    match &outcome.skipped {
        Some(reason) => tracing::info!(step = %id, "Step skipped: {}", reason),
        None => tracing::debug!(
            step = %id,
            artifacts = outcome.artifacts.len(),
            "Step completed in {:?}",
            duration
        ),
    }
}
