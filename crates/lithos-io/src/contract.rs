//! Run contract types.
//!
//! [`RunParams`] carries the arguments of one `run_for` call. All values
//! are in the solver's non-dimensional units; the caller scales them.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Checkpoint cadence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointSchedule {
    /// Every `interval` units of model time.
    ByTime(f64),
    /// Every `n` completed steps.
    BySteps(u64),
}

impl CheckpointSchedule {
    pub fn is_by_time(&self) -> bool {
        matches!(self, CheckpointSchedule::ByTime(_))
    }
}

/// Where and from which checkpoint to resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestartRequest {
    /// Checkpoint index; negative values count back from the last
    /// available one (`-1` = last).
    #[serde(default = "last_step")]
    pub step: i64,
    /// Directory to read from; the model's output store when `None`.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

fn last_step() -> i64 {
    -1
}

impl RestartRequest {
    /// Restart from the last checkpoint of the model's own output.
    pub fn last() -> Self {
        Self { step: -1, dir: None }
    }

    pub fn at(step: i64) -> Self {
        Self { step, dir: None }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }
}

/// Arguments of one `run_for` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunParams {
    /// Model time to run for, added to the current time.
    pub duration: Option<f64>,
    /// Regular checkpoint cadence.
    pub checkpoint: Option<CheckpointSchedule>,
    /// Minimum number of steps to perform.
    pub nstep: Option<u64>,
    /// Additional absolute checkpoint times.
    pub checkpoint_times: Vec<f64>,
    /// Persist the swarm on every `restart_checkpoint`-th checkpoint.
    pub restart_checkpoint: u64,
    /// Upper bound on the timestep.
    pub dt: Option<f64>,
    pub restart: Option<RestartRequest>,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            duration: None,
            checkpoint: None,
            nstep: None,
            checkpoint_times: Vec::new(),
            restart_checkpoint: 1,
            dt: None,
            restart: None,
        }
    }
}

impl RunParams {
    /// Run for a span of model time.
    pub fn for_duration(duration: f64) -> Self {
        Self { duration: Some(duration), ..Default::default() }
    }

    /// Run for a number of steps.
    pub fn for_steps(nstep: u64) -> Self {
        Self { nstep: Some(nstep), ..Default::default() }
    }

    pub fn checkpoint_every(mut self, interval: f64) -> Self {
        self.checkpoint = Some(CheckpointSchedule::ByTime(interval));
        self
    }

    pub fn checkpoint_every_steps(mut self, n: u64) -> Self {
        self.checkpoint = Some(CheckpointSchedule::BySteps(n));
        self
    }

    pub fn with_checkpoint_times(mut self, times: Vec<f64>) -> Self {
        self.checkpoint_times = times;
        self
    }

    pub fn with_swarm_stride(mut self, stride: u64) -> Self {
        self.restart_checkpoint = stride;
        self
    }

    pub fn with_max_dt(mut self, dt: f64) -> Self {
        self.dt = Some(dt);
        self
    }

    pub fn restart_from(mut self, request: RestartRequest) -> Self {
        self.restart = Some(request);
        self
    }

    /// Whether the run writes any checkpoint.
    pub fn checkpoints_requested(&self) -> bool {
        self.checkpoint.is_some() || !self.checkpoint_times.is_empty()
    }
}

/// One checkpoint written during a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    pub id: u64,
    pub time: f64,
    pub step: u64,
    /// Whether the swarm was persisted as well.
    pub swarm: bool,
}

/// Outcome of one `run_for` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Steps performed by this call.
    pub steps: u64,
    /// Model time at the end of the call.
    pub time: f64,
    /// Model step counter at the end of the call.
    pub step: u64,
    /// Checkpoint index restored from, if the call restarted.
    pub restarted_from: Option<u64>,
    pub checkpoints: Vec<CheckpointRecord>,
    /// Timestep of the last iteration.
    pub last_dt: Option<f64>,
    pub particle_count: usize,
    pub wall_time_seconds: f64,
}
