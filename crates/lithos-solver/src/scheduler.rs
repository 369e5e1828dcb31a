//! Checkpoint scheduler.

use lithos_io::{CheckpointSchedule, RunParams};
use lithos_types::constants::CHECKPOINT_TIME_RTOL;
use lithos_types::Scalar;

/// `time` has reached `target` up to round-off.
#[inline]
pub fn reached(time: Scalar, target: Scalar) -> bool {
    time >= target - CHECKPOINT_TIME_RTOL * target.abs().max(1.0)
}

/// Decides which iterations end with a checkpoint.
///
/// Interval checkpoints keep a running target (`next_time` or
/// `next_step`) that moves by one interval per trigger. Listed checkpoint
/// times never trigger a checkpoint themselves: they request the initial
/// one and bound the timestep until the clock passes them.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointScheduler {
    schedule: Option<CheckpointSchedule>,
    next_time: Option<Scalar>,
    next_step: Option<u64>,
    /// Listed times still ahead, ascending.
    times: Vec<Scalar>,
    stride: u64,
}

impl CheckpointScheduler {
    /// Scheduler for a run starting at `time` with `steps_done` steps.
    pub fn new(params: &RunParams, time: Scalar, steps_done: u64) -> Self {
        let (next_time, next_step) = match params.checkpoint {
            Some(CheckpointSchedule::ByTime(interval)) => (Some(time + interval), None),
            Some(CheckpointSchedule::BySteps(n)) => (None, Some(steps_done + n)),
            None => (None, None),
        };
        let mut times: Vec<Scalar> = params.checkpoint_times.iter().copied().filter(|&t| !reached(time, t)).collect();
        times.sort_by(|a, b| a.total_cmp(b));
        times.dedup();
        Self { schedule: params.checkpoint, next_time, next_step, times, stride: params.restart_checkpoint.max(1) }
    }

    /// Any checkpoint requested for the run.
    pub fn is_active(&self) -> bool {
        self.schedule.is_some() || !self.times.is_empty()
    }

    /// Absolute time of the next interval checkpoint (by-time schedules).
    pub fn next_time(&self) -> Option<Scalar> {
        self.next_time
    }

    pub fn next_step(&self) -> Option<u64> {
        self.next_step
    }

    /// Listed checkpoint times not reached yet.
    pub fn checkpoint_times(&self) -> &[Scalar] {
        &self.times
    }

    /// Checks the clock after an iteration and moves the targets on.
    /// Only the interval schedule decides; listed times that were reached
    /// are dropped.
    pub fn due(&mut self, time: Scalar, steps_done: u64) -> bool {
        let mut due = false;
        if let (Some(next), Some(CheckpointSchedule::ByTime(interval))) = (self.next_time, self.schedule) {
            if reached(time, next) {
                due = true;
                self.next_time = Some(next + interval);
            }
        }
        if let (Some(next), Some(CheckpointSchedule::BySteps(n))) = (self.next_step, self.schedule) {
            if steps_done >= next {
                due = true;
                self.next_step = Some(next + n);
            }
        }
        self.times.retain(|&t| !reached(time, t));
        due
    }

    /// Whether checkpoint `id` also persists the swarm.
    pub fn swarm_due(&self, id: u64) -> bool {
        id % self.stride == 0
    }
}
