//! Subsystem lifecycle transitions.
//!
//! Constructed → Running on the first tick, Running → Stopped on stop,
//! Stopped → Running on resume. A stopped subsystem ignores ticks until it is
//! resumed; its registry state is untouched by any transition.

use std::fmt;

/// Lifecycle state of one subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifecycle {
    /// States registered and at their defaults; no cycle has run yet.
    #[default]
    Constructed,
    /// Ticked once per period.
    Running,
    /// Outputs zeroed; resumable.
    Stopped,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Constructed => "Constructed",
            Self::Running => "Running",
            Self::Stopped => "Stopped",
        };
        f.write_str(name)
    }
}

/// Event that can trigger a lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Periodic scheduler tick.
    Tick,
    /// Zero outputs and stop cycling.
    Stop,
    /// Resume cycling after a stop.
    Resume,
}

/// Result of a transition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition succeeded; new state.
    Ok(Lifecycle),
    /// Transition rejected; reason.
    Rejected(&'static str),
}

/// Lifecycle manager holding the current state.
#[derive(Debug, Clone, Default)]
pub struct LifecycleMachine {
    state: Lifecycle,
}

impl LifecycleMachine {
    pub const fn new() -> Self {
        Self {
            state: Lifecycle::Constructed,
        }
    }

    #[inline]
    pub const fn state(&self) -> Lifecycle {
        self.state
    }

    /// Attempt a transition given an event.
    pub fn handle_event(&mut self, event: LifecycleEvent) -> TransitionResult {
        use Lifecycle::*;
        use LifecycleEvent::*;

        let next = match (self.state, event) {
            (Constructed | Running, Tick) => Running,
            (Constructed | Running | Stopped, Stop) => Stopped,
            (Stopped, Resume) => Running,
            (Stopped, Tick) => return TransitionResult::Rejected("Stopped: resume before ticking"),
            (Constructed, Resume) => {
                return TransitionResult::Rejected("Constructed: first tick starts the subsystem");
            }
            (Running, Resume) => return TransitionResult::Rejected("Running: already running"),
        };

        self.state = next;
        TransitionResult::Ok(next)
    }

    /// Whether ticks currently run the cycle body.
    #[inline]
    pub const fn is_running(&self) -> bool {
        matches!(self.state, Lifecycle::Running)
    }
}
