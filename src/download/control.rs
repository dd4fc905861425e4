//! Run-state controller: start, pause, resume and stop a playlist run
//!
//! The controller is the only writer of [`RunState`]. The dispatch loop asks
//! [`RunController::wait_for_dispatch`] before submitting each track, which
//! parks on a watch channel while paused instead of polling. Stopping never
//! interrupts tracks that are already downloading.

use std::fmt;
use tokio::sync::watch;
use tracing::debug;

/// Lifecycle of a playlist run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Paused,
    Stopping,
    Completed,
}

impl RunState {
    /// A run is in progress (dispatching, paused or draining)
    pub fn is_active(self) -> bool {
        matches!(self, RunState::Running | RunState::Paused | RunState::Stopping)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Paused => "paused",
            RunState::Stopping => "stopping",
            RunState::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Single-writer, multi-reader run state
#[derive(Debug)]
pub struct RunController {
    state: watch::Sender<RunState>,
}

impl Default for RunController {
    fn default() -> Self {
        Self::new()
    }
}

impl RunController {
    pub fn new() -> Self {
        let (state, _) = watch::channel(RunState::Idle);
        Self { state }
    }

    pub fn state(&self) -> RunState {
        *self.state.borrow()
    }

    /// Watch state changes (for presentation layers)
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    /// Apply `next` if `allowed` holds for the current state
    fn transition(&self, allowed: impl Fn(RunState) -> bool, next: RunState) -> bool {
        let changed = self.state.send_if_modified(|state| {
            if allowed(*state) && *state != next {
                *state = next;
                true
            } else {
                false
            }
        });
        if changed {
            debug!("Run state -> {}", next);
        }
        changed
    }

    /// Enter `Running`; false if a run is already active
    pub fn start(&self) -> bool {
        self.transition(|s| !s.is_active(), RunState::Running)
    }

    /// Running -> Paused
    pub fn pause(&self) -> bool {
        self.transition(|s| s == RunState::Running, RunState::Paused)
    }

    /// Paused -> Running
    pub fn resume(&self) -> bool {
        self.transition(|s| s == RunState::Paused, RunState::Running)
    }

    /// Running/Paused -> Stopping
    pub fn stop(&self) -> bool {
        self.transition(
            |s| matches!(s, RunState::Running | RunState::Paused),
            RunState::Stopping,
        )
    }

    /// Mark the run finished, whatever state it was in
    pub fn complete(&self) -> bool {
        self.transition(|_| true, RunState::Completed)
    }

    /// Wait until new work may be submitted
    ///
    /// Returns `true` once the state is `Running`, `false` if the run is
    /// stopping or not active. Parks without spinning while `Paused`.
    pub async fn wait_for_dispatch(&self) -> bool {
        let mut rx = self.state.subscribe();
        loop {
            let state = *rx.borrow_and_update();
            match state {
                RunState::Running => return true,
                RunState::Paused => {}
                _ => return false,
            }
            if rx.changed().await.is_err() {
                return false;
            }
        }
    }
}
