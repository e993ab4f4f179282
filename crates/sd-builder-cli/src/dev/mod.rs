//! Development mode: file watching, incremental rebuilds and the live-reload
//! server.

pub mod config;
pub mod coordinator;
pub mod rules;
pub mod server;
pub mod state;
pub mod watcher;

pub use config::DevConfig;
pub use coordinator::{WatchCoordinator, WatchState};
pub use rules::{PathMatcher, Reaction, WatchRule, standard_rules};
pub use server::DevServer;
pub use state::{DevServerState, SharedState, StepStatus};
pub use watcher::{FileChange, FileWatcher};

use serde::{Deserialize, Serialize};

/// Events pushed to connected browsers over SSE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DevEvent {
    StepStarted { step: String },

    StepCompleted { step: String, duration_ms: u64 },

    StepFailed { step: String, error: String },

    ClientConnected { id: usize },
}
