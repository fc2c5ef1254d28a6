//! Long-running `run` command: seed, initial load, perpetual refresh.

use std::sync::Arc;

use parkwatch_scheduler::{Lifecycle, SchedulerState, SeedOutcome};
use parkwatch_store::FacilityStore;
use tokio::sync::watch;

use crate::context::Runtime;

/// Run the scheduler until ctrl-c or SIGTERM.
///
/// On unix, SIGUSR1 moves the lifecycle to the foreground and SIGUSR2 to the
/// background.
///
/// # Errors
///
/// Returns an error if seeding fails, the client cannot be built, or the
/// final commit fails.
pub(crate) async fn run_daemon(runtime: Runtime, initial_load: bool) -> anyhow::Result<()> {
    match runtime.seed_if_needed().await? {
        SeedOutcome::Seeded { inserted } => println!("seeded {inserted} facilities from catalogue"),
        SeedOutcome::AlreadySeeded { existing } => {
            tracing::info!(existing, "store already populated");
        }
    }

    let scheduler = runtime.scheduler()?;
    let watcher = tokio::spawn(log_state_changes(scheduler.subscribe()));
    let signals = tokio::spawn(lifecycle_signals(Arc::clone(&runtime.lifecycle)));

    if initial_load {
        let loader = Arc::clone(&scheduler);
        tokio::spawn(async move {
            let outcome = loader.perform_initial_load().await;
            tracing::info!(outcome = ?outcome, "initial load finished");
        });
    }
    scheduler.start_auto_refresh();

    shutdown_signal().await;

    scheduler.stop_auto_refresh();
    signals.abort();
    watcher.abort();
    runtime.store.commit().await?;

    let state = scheduler.state();
    println!("stopped; {}", state.stats);
    Ok(())
}

/// Logs every published state change that an operator would care about.
async fn log_state_changes(mut rx: watch::Receiver<SchedulerState>) {
    let mut previous = rx.borrow_and_update().clone();
    while rx.changed().await.is_ok() {
        let current = rx.borrow_and_update().clone();

        if current.progress.phase_index() != previous.progress.phase_index() {
            tracing::info!(
                progress = %current.progress,
                fraction = current.progress.fraction(),
                "initial load progress"
            );
        }
        if current.is_refreshing != previous.is_refreshing {
            tracing::debug!(refreshing = current.is_refreshing, "refresh flag changed");
        }
        if current.last_refresh_time != previous.last_refresh_time {
            tracing::info!(stats = %current.stats, "refresh run finished");
        }

        previous = current;
    }
}

#[cfg(unix)]
async fn lifecycle_signals(lifecycle: Arc<Lifecycle>) {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut foreground, mut background) = match (
        signal(SignalKind::user_defined1()),
        signal(SignalKind::user_defined2()),
    ) {
        (Ok(fg), Ok(bg)) => (fg, bg),
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "lifecycle signals unavailable");
            return;
        }
    };

    loop {
        tokio::select! {
            Some(()) = foreground.recv() => {
                lifecycle.enter_foreground();
            }
            Some(()) = background.recv() => {
                lifecycle.enter_background();
            }
            else => break,
        }
    }
}

#[cfg(not(unix))]
async fn lifecycle_signals(_lifecycle: Arc<Lifecycle>) {}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, stopping scheduler");
}
