//! Run event types.
//!
//! Events are plain values carrying just enough data to follow a run from
//! a log or to assert on it in tests.

use serde::{Deserialize, Serialize};

/// An event emitted by the stepping loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationEvent {
    /// Model step counter at emission.
    pub step: u64,
    pub kind: EventKind,
}

/// Event payload variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    /// Iteration started at model time `time`.
    StepBegin { time: f64 },

    /// Iteration finished.
    StepEnd {
        /// Model time after the clock advance.
        time: f64,
        /// Timestep used.
        dt: f64,
        /// Wall-clock duration of the iteration (seconds).
        wall_time: f64,
    },

    /// Non-linear solve completed.
    Solve {
        iterations: u32,
        residual: f64,
        converged: bool,
        /// First solve of the run (initial tolerance and bounds).
        initial: bool,
    },

    /// Timestep selected.
    Timestep {
        dt: f64,
        /// Name of the bound that set `dt`.
        bound: String,
    },

    /// Checkpoint written.
    Checkpoint {
        id: u64,
        time: f64,
        /// Whether the particle swarm was persisted too.
        swarm: bool,
    },

    /// Run resumed from a checkpoint.
    Restart { checkpoint: u64, time: f64 },

    /// Free-form event.
    Custom {
        label: String,
        /// JSON-encoded payload.
        payload: String,
    },
}

impl SimulationEvent {
    pub fn new(step: u64, kind: EventKind) -> Self {
        Self { step, kind }
    }

    /// Short label of the variant.
    pub fn label(&self) -> &str {
        match &self.kind {
            EventKind::StepBegin { .. } => "step_begin",
            EventKind::StepEnd { .. } => "step_end",
            EventKind::Solve { .. } => "solve",
            EventKind::Timestep { .. } => "timestep",
            EventKind::Checkpoint { .. } => "checkpoint",
            EventKind::Restart { .. } => "restart",
            EventKind::Custom { label, .. } => label,
        }
    }
}
