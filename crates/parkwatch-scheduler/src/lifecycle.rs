//! Foreground / background observer.
//!
//! The binary flips the state from OS signals; the scheduler reads it only
//! when sizing the next tick sleep or scheduling a record.

use parkwatch_core::AppState;
use tokio::sync::watch;

#[derive(Debug)]
pub struct Lifecycle {
    tx: watch::Sender<AppState>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new(AppState::Active)
    }
}

impl Lifecycle {
    #[must_use]
    pub fn new(initial: AppState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    #[must_use]
    pub fn current(&self) -> AppState {
        *self.tx.borrow()
    }

    /// Sets the state; returns `true` if it changed.
    pub fn set(&self, state: AppState) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
        if changed {
            tracing::info!(state = %state, "lifecycle: state changed");
        }
        changed
    }

    pub fn enter_foreground(&self) -> bool {
        self.set(AppState::Active)
    }

    pub fn enter_background(&self) -> bool {
        self.set(AppState::Background)
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.tx.subscribe()
    }
}
