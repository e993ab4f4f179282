//! `sd-builder dev`: initial build, dev server and incremental rebuilds.
//!
//! Lifecycle:
//! 1. Full build plus runtime config; failures are reported, not fatal
//! 2. Start the file watcher and the watch coordinator
//! 3. Serve the build directory with live reload
//! 4. Run until Ctrl+C

use std::sync::Arc;

use sd_builder_config::BuildOptions;
use tokio::signal;
use tokio::sync::mpsc;

use crate::build::{Orchestrator, StepId, StepRegistry};
use crate::cli::DevArgs;
use crate::dev::{
    DevConfig, DevEvent, DevServer, DevServerState, FileWatcher, SharedState, WatchCoordinator,
    standard_rules,
};
use crate::error::{CliError, Result};
use crate::ui;

pub async fn execute(options: Arc<BuildOptions>, args: DevArgs) -> Result<()> {
    let config = DevConfig::from_args(&args, &options)?;
    let registry = Arc::new(StepRegistry::standard());
    for descriptor in registry.descriptors() {
        tracing::debug!(
            step = %descriptor.id,
            inputs = ?descriptor.inputs,
            output = descriptor.output,
            "Registered step"
        );
    }
    let state: SharedState = Arc::new(DevServerState::new(options.build_dir().to_path_buf()));

    ui::info(&format!(
        "Starting development build of {} ({})",
        options.root_dir().display(),
        options.environment()
    ));
    initial_build(
        &Orchestrator::new(Arc::clone(&registry), Arc::clone(&options)),
        &state,
    )
    .await;

    let (watcher, changes) = FileWatcher::new(
        options.root_dir().to_path_buf(),
        options.app_dir(),
        config.watch_ignore.clone(),
    )?;
    ui::info(&format!("Watching {}", watcher.root().display()));

    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<DevEvent>();
    let forward_state = Arc::clone(&state);
    let forwarder = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            forward_state.broadcast(&event).await;
        }
    });

    let mut coordinator = WatchCoordinator::new(
        Arc::clone(&registry),
        Arc::clone(&options),
        standard_rules(&options),
        config.debounce,
    )
    .with_events(events_tx);
    let mut coordinator_handle = tokio::spawn(async move { coordinator.run(changes).await });

    let server = DevServer::new(config, Arc::clone(&state));
    let mut server_handle = tokio::spawn(server.start());

    ui::info("Press Ctrl+C to stop");

    let outcome = tokio::select! {
        _ = signal::ctrl_c() => {
            ui::info("Shutting down development server...");
            Ok(())
        }
        joined = &mut server_handle => match joined {
            Ok(result) => result,
            Err(e) => Err(CliError::Server(format!("Server task failed: {}", e))),
        },
        joined = &mut coordinator_handle => match joined {
            Ok(Ok(())) => Err(CliError::Custom("File watcher stopped unexpectedly".to_string())),
            Ok(Err(e)) => Err(e.into()),
            Err(e) => Err(CliError::Custom(format!("Watch task failed: {}", e))),
        },
    };

    server_handle.abort();
    coordinator_handle.abort();
    forwarder.abort();
    drop(watcher);

    outcome
}

/// Full build followed by the runtime config. Failures are recorded in the
/// dev server state and printed, and dev mode continues regardless.
async fn initial_build(orchestrator: &Orchestrator, state: &SharedState) {
    match orchestrator.build_all().await {
        Ok(summary) => {
            for report in &summary.steps {
                state
                    .broadcast(&DevEvent::StepCompleted {
                        step: report.id.to_string(),
                        duration_ms: duration_ms(report.duration),
                    })
                    .await;
            }
            ui::success(&format!(
                "Initial build completed in {}",
                ui::format_duration(summary.duration)
            ));
        }
        Err(err) => {
            for failure in err.failures() {
                state
                    .broadcast(&DevEvent::StepFailed {
                        step: failure.step.to_string(),
                        error: failure.message.clone(),
                    })
                    .await;
            }
            ui::error(&format!("Initial build failed: {}", err));
            ui::warning("Continuing in watch mode; fix the errors to trigger a rebuild");
        }
    }

    match orchestrator.build_one(StepId::AppConfig).await {
        Ok(report) => {
            state
                .broadcast(&DevEvent::StepCompleted {
                    step: report.id.to_string(),
                    duration_ms: duration_ms(report.duration),
                })
                .await;
        }
        Err(err) => ui::error(&format!("Runtime config failed: {}", err)),
    }
}

fn duration_ms(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
