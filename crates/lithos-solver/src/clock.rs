//! Model clock.

use serde::{Deserialize, Serialize};

/// Time-keeping state of a model.
///
/// `time` and `step` advance together once per iteration; `checkpoint_id`
/// only moves on checkpoint events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelClock {
    pub time: f64,
    pub step: u64,
    /// Timestep of the current iteration; `None` before the first one.
    pub dt: Option<f64>,
    pub checkpoint_id: u64,
}

impl ModelClock {
    /// Advances time and step by one iteration of size `dt`.
    pub fn tick(&mut self, dt: f64) {
        self.dt = Some(dt);
        self.time += dt;
        self.step += 1;
    }
}
