//! Turns filesystem changes into debounced, serialized step reruns.
//!
//! Every rule has its own trailing debounce timer: each matching change
//! pushes the rule's deadline out by the debounce window, and the reaction
//! fires once the window passes with no further changes.
//!
//! Every step has one lane: a worker task fed by a channel of capacity one.
//! At most one run is in flight and at most one more is pending; further
//! triggers while a rerun is already pending coalesce into it. Invalidation
//! requests are a sticky flag on the lane, consumed by the next run, so
//! coalescing never loses one.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use sd_builder_config::BuildOptions;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{Instant, sleep_until};

use crate::build::{BuildStep, StepId, StepRegistry};
use crate::dev::DevEvent;
use crate::dev::rules::{WatchRule, matching_rules};
use crate::dev::watcher::FileChange;
use crate::error::BuildError;

/// Coordinator lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Not yet consuming changes.
    Idle,
    Watching,
    /// The change source closed and every lane has drained.
    Stopped,
}

struct Lane {
    trigger: mpsc::Sender<()>,
    invalidate: Arc<AtomicBool>,
}

impl Lane {
    fn request(&self, step: StepId, invalidate: bool) {
        if invalidate {
            self.invalidate.store(true, Ordering::SeqCst);
        }
        match self.trigger.try_send(()) {
            Ok(()) => tracing::debug!(step = %step, "Rerun queued"),
            Err(mpsc::error::TrySendError::Full(())) => {
                tracing::debug!(step = %step, "Rerun already pending, coalesced")
            }
            Err(mpsc::error::TrySendError::Closed(())) => {
                tracing::error!(step = %step, "Step lane stopped unexpectedly")
            }
        }
    }
}

pub struct WatchCoordinator {
    registry: Arc<StepRegistry>,
    options: Arc<BuildOptions>,
    rules: Vec<WatchRule>,
    debounce: Duration,
    events: Option<mpsc::UnboundedSender<DevEvent>>,
    state: WatchState,
}

impl WatchCoordinator {
    pub fn new(
        registry: Arc<StepRegistry>,
        options: Arc<BuildOptions>,
        rules: Vec<WatchRule>,
        debounce: Duration,
    ) -> Self {
        Self {
            registry,
            options,
            rules,
            debounce,
            events: None,
            state: WatchState::Idle,
        }
    }

    /// Report step progress on `events` (usually forwarded to the dev server).
    pub fn with_events(mut self, events: mpsc::UnboundedSender<DevEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    /// Consume `changes` until the channel closes.
    ///
    /// Reactions still waiting on their debounce window when the channel
    /// closes fire immediately, and every lane drains before this returns.
    /// Fails only if a rule names a step missing from the registry.
    pub async fn run(&mut self, mut changes: mpsc::Receiver<FileChange>) -> Result<(), BuildError> {
        let mut workers = JoinSet::new();
        let lanes = self.spawn_lanes(&mut workers)?;

        self.state = WatchState::Watching;
        tracing::info!(rules = self.rules.len(), "Watching for changes");

        let mut deadlines: HashMap<usize, Instant> = HashMap::new();
        loop {
            let next = deadlines.values().min().copied();
            tokio::select! {
                change = changes.recv() => {
                    let Some(change) = change else { break };
                    let matched = matching_rules(&self.rules, change.path());
                    if matched.is_empty() {
                        tracing::trace!(path = %change.path().display(), "No rule matches change");
                    }
                    let deadline = Instant::now() + self.debounce;
                    for idx in matched {
                        tracing::debug!(
                            rule = self.rules[idx].name,
                            path = %change.path().display(),
                            "Change detected"
                        );
                        deadlines.insert(idx, deadline);
                    }
                }
                _ = sleep_until(next.unwrap_or_else(Instant::now)), if next.is_some() => {
                    let now = Instant::now();
                    let mut due: Vec<usize> = deadlines
                        .iter()
                        .filter(|(_, deadline)| **deadline <= now)
                        .map(|(idx, _)| *idx)
                        .collect();
                    due.sort_unstable();
                    for idx in due {
                        deadlines.remove(&idx);
                        self.fire(idx, &lanes);
                    }
                }
            }
        }

        let mut pending: Vec<usize> = deadlines.into_keys().collect();
        pending.sort_unstable();
        for idx in pending {
            self.fire(idx, &lanes);
        }

        // Closing the triggers lets each worker finish its pending run and exit.
        drop(lanes);
        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined {
                tracing::error!("Step lane panicked: {}", err);
            }
        }

        self.state = WatchState::Stopped;
        tracing::info!("Stopped watching");
        Ok(())
    }

    fn spawn_lanes(&self, workers: &mut JoinSet<()>) -> Result<BTreeMap<StepId, Lane>, BuildError> {
        let mut lanes = BTreeMap::new();
        for rule in &self.rules {
            for &id in &rule.reaction.steps {
                if lanes.contains_key(&id) {
                    continue;
                }
                let step = self.registry.get(id)?;
                let (trigger, triggers) = mpsc::channel(1);
                let invalidate = Arc::new(AtomicBool::new(false));

                workers.spawn(lane_worker(
                    id,
                    step,
                    Arc::clone(&self.options),
                    Arc::clone(&invalidate),
                    triggers,
                    self.events.clone(),
                ));
                lanes.insert(id, Lane { trigger, invalidate });
            }
        }
        Ok(lanes)
    }

    fn fire(&self, idx: usize, lanes: &BTreeMap<StepId, Lane>) {
        let rule = &self.rules[idx];
        tracing::info!(rule = rule.name, "Rebuilding");
        for id in &rule.reaction.steps {
            if let Some(lane) = lanes.get(id) {
                lane.request(*id, rule.reaction.invalidate_bundler);
            }
        }
    }
}

async fn lane_worker(
    id: StepId,
    step: Arc<dyn BuildStep>,
    options: Arc<BuildOptions>,
    invalidate: Arc<AtomicBool>,
    mut triggers: mpsc::Receiver<()>,
    events: Option<mpsc::UnboundedSender<DevEvent>>,
) {
    let emit = |event: DevEvent| {
        if let Some(events) = &events {
            // Nobody listening is fine in headless mode.
            let _ = events.send(event);
        }
    };

    while triggers.recv().await.is_some() {
        if invalidate.swap(false, Ordering::SeqCst) {
            tracing::debug!(step = %id, "Invalidating warm state");
            step.invalidate().await;
        }

        emit(DevEvent::StepStarted {
            step: id.to_string(),
        });
        let start = std::time::Instant::now();

        match step.run(&options).await {
            Ok(outcome) => {
                let duration = start.elapsed();
                match &outcome.skipped {
                    Some(reason) => tracing::info!(step = %id, "Skipped: {}", reason),
                    None => tracing::info!(step = %id, "Rebuilt in {:?}", duration),
                }
                emit(DevEvent::StepCompleted {
                    step: id.to_string(),
                    duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
                });
            }
            Err(err) => {
                tracing::error!(step = %id, "Rebuild failed: {}", err);
                emit(DevEvent::StepFailed {
                    step: id.to_string(),
                    error: err.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{StepDescriptor, StepError, StepOutcome};
    use crate::dev::rules::{PathMatcher, Reaction};
    use async_trait::async_trait;
    use std::collections::HashMap as Vars;
    use std::path::PathBuf;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct SlowStep {
        runs: AtomicUsize,
        invalidations: AtomicUsize,
    }

    #[async_trait]
    impl BuildStep for SlowStep {
        fn descriptor(&self) -> StepDescriptor {
            StepDescriptor {
                id: StepId::AllScripts,
                inputs: &[],
                output: "build/_assets/js",
            }
        }

        async fn run(&self, _options: &BuildOptions) -> Result<StepOutcome, StepError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(StepOutcome::default())
        }

        async fn invalidate(&self) {
            self.invalidations.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn coordinator(step: Arc<SlowStep>) -> WatchCoordinator {
        let mut registry = StepRegistry::new();
        registry.register(step);
        let options = BuildOptions::resolve(&Vars::new(), std::path::Path::new("/project"));
        let rules = vec![
            WatchRule {
                name: "scripts",
                matcher: PathMatcher::File(PathBuf::from("/project/app/main.jsx")),
                reaction: Reaction::run([StepId::AllScripts]),
            },
            WatchRule {
                name: "manifest",
                matcher: PathMatcher::File(PathBuf::from("/project/deps.json")),
                reaction: Reaction::invalidate_and_run([StepId::AllScripts]),
            },
        ];
        WatchCoordinator::new(
            Arc::new(registry),
            Arc::new(options),
            rules,
            Duration::from_millis(100),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_triggers_during_a_run_coalesce_into_one_rerun() {
        let step = Arc::new(SlowStep::default());
        let mut coordinator = coordinator(Arc::clone(&step));
        let (tx, rx) = mpsc::channel(16);
        let handle = tokio::spawn(async move {
            coordinator.run(rx).await.unwrap();
            coordinator
        });

        let script = || FileChange::Modified(PathBuf::from("/project/app/main.jsx"));
        tx.send(script()).await.unwrap();
        // First run starts after the debounce window and takes a second.
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(step.runs.load(Ordering::SeqCst), 1);

        // Three separate reactions while the first run is in flight.
        for _ in 0..3 {
            tx.send(script()).await.unwrap();
            tokio::time::sleep(Duration::from_millis(150)).await;
        }

        drop(tx);
        let coordinator = handle.await.unwrap();
        assert_eq!(coordinator.state(), WatchState::Stopped);
        assert_eq!(step.runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidation_survives_coalescing() {
        let step = Arc::new(SlowStep::default());
        let mut coordinator = coordinator(Arc::clone(&step));
        let (tx, rx) = mpsc::channel(16);
        let handle = tokio::spawn(async move { coordinator.run(rx).await });

        tx.send(FileChange::Modified(PathBuf::from("/project/app/main.jsx")))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        // Plain rerun queued first, then a manifest change coalesces into it.
        tx.send(FileChange::Modified(PathBuf::from("/project/app/main.jsx")))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        tx.send(FileChange::Modified(PathBuf::from("/project/deps.json")))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;

        drop(tx);
        handle.await.unwrap().unwrap();
        assert_eq!(step.runs.load(Ordering::SeqCst), 2);
        assert_eq!(step.invalidations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_step_fails_before_watching() {
        let registry = StepRegistry::new();
        let options = BuildOptions::resolve(&Vars::new(), std::path::Path::new("/project"));
        let mut coordinator = WatchCoordinator::new(
            Arc::new(registry),
            Arc::new(options.clone()),
            crate::dev::rules::standard_rules(&options),
            Duration::from_millis(100),
        );
        let (_tx, rx) = mpsc::channel(1);

        let err = coordinator.run(rx).await.unwrap_err();
        assert!(matches!(err, BuildError::NotRegistered(_)));
        assert_eq!(coordinator.state(), WatchState::Idle);
    }
}
