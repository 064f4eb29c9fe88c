//! Pause/resume/cancel signalling between the controller and the writer.
//!
//! The writer checks in at every record boundary through
//! [`SyncControl::wait_if_paused`], which parks on a watch channel until the
//! run is resumed or cancelled.

use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlState {
    #[default]
    Running,
    Paused,
    Cancelled,
}

/// Cloneable handle to the run control flags.
#[derive(Debug, Clone)]
pub struct SyncControl {
    tx: Arc<watch::Sender<ControlState>>,
}

impl Default for SyncControl {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncControl {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ControlState::Running);
        Self { tx: Arc::new(tx) }
    }

    pub fn state(&self) -> ControlState {
        *self.tx.borrow()
    }

    pub fn is_paused(&self) -> bool {
        self.state() == ControlState::Paused
    }

    pub fn is_cancelled(&self) -> bool {
        self.state() == ControlState::Cancelled
    }

    /// Returns whether the state changed.
    pub fn pause(&self) -> bool {
        self.tx.send_if_modified(|state| {
            if *state == ControlState::Running {
                *state = ControlState::Paused;
                true
            } else {
                false
            }
        })
    }

    /// Returns whether the state changed.
    pub fn resume(&self) -> bool {
        self.tx.send_if_modified(|state| {
            if *state == ControlState::Paused {
                *state = ControlState::Running;
                true
            } else {
                false
            }
        })
    }

    /// Cancel the current run. Also releases a paused writer.
    pub fn cancel(&self) {
        self.tx.send_replace(ControlState::Cancelled);
    }

    /// Clear a cancellation left over from a previous run. A pause stays in
    /// effect.
    pub fn reset_cancel(&self) {
        self.tx.send_if_modified(|state| {
            if *state == ControlState::Cancelled {
                *state = ControlState::Running;
                true
            } else {
                false
            }
        });
    }

    /// Park while paused. Returns immediately when running or cancelled.
    pub async fn wait_if_paused(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while waiting.
        let _ = rx.wait_for(|state| *state != ControlState::Paused).await;
    }
}
