//! Shared state for the development server.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::dev::DevEvent;

/// Last known state of a build step in dev mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    Running,
    Succeeded { duration_ms: u64 },
    Failed { error: String },
}

impl StepStatus {
    pub fn error(&self) -> Option<&str> {
        match self {
            StepStatus::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// SSE client senders keyed by client id.
pub type ClientRegistry = Arc<RwLock<HashMap<usize, mpsc::Sender<String>>>>;

pub struct DevServerState {
    steps: RwLock<BTreeMap<String, StepStatus>>,
    clients: ClientRegistry,
    next_client_id: RwLock<usize>,
    build_dir: PathBuf,
}

impl DevServerState {
    pub fn new(build_dir: PathBuf) -> Self {
        Self {
            steps: RwLock::new(BTreeMap::new()),
            clients: Arc::new(RwLock::new(HashMap::new())),
            next_client_id: RwLock::new(0),
            build_dir,
        }
    }

    /// Directory served to the browser.
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Steps whose last run failed, with their errors.
    pub fn failed_steps(&self) -> Vec<(String, String)> {
        self.steps
            .read()
            .iter()
            .filter_map(|(step, status)| status.error().map(|e| (step.clone(), e.to_string())))
            .collect()
    }

    fn record(&self, event: &DevEvent) {
        let mut steps = self.steps.write();
        match event {
            DevEvent::StepStarted { step } => {
                steps.insert(step.clone(), StepStatus::Running);
            }
            DevEvent::StepCompleted { step, duration_ms } => {
                steps.insert(
                    step.clone(),
                    StepStatus::Succeeded {
                        duration_ms: *duration_ms,
                    },
                );
            }
            DevEvent::StepFailed { step, error } => {
                steps.insert(
                    step.clone(),
                    StepStatus::Failed {
                        error: error.clone(),
                    },
                );
            }
            DevEvent::ClientConnected { .. } => {}
        }
    }

    /// Register a new SSE client, returning its id and event receiver.
    pub fn register_client(&self) -> (usize, mpsc::Receiver<String>) {
        let id = {
            let mut next_id = self.next_client_id.write();
            let id = *next_id;
            *next_id += 1;
            id
        };

        let (tx, rx) = mpsc::channel(100);
        self.clients.write().insert(id, tx);
        (id, rx)
    }

    pub fn unregister_client(&self, id: usize) {
        self.clients.write().remove(&id);
    }

    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }

    /// Record `event` and send it to every connected client.
    ///
    /// Clients whose channel is closed are dropped.
    pub async fn broadcast(&self, event: &DevEvent) {
        self.record(event);

        let json = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(err) => {
                tracing::error!("Failed to serialize dev event: {}", err);
                return;
            }
        };

        let clients = self.clients.read().clone();
        let mut failed_ids = Vec::new();
        for (id, tx) in clients {
            if tx.send(json.clone()).await.is_err() {
                failed_ids.push(id);
            }
        }

        for id in failed_ids {
            tracing::debug!(client = id, "Dropping disconnected client");
            self.unregister_client(id);
        }
    }
}

pub type SharedState = Arc<DevServerState>;
