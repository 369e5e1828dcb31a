//! Run-parameter validation.
//!
//! Catches inconsistent `run_for` arguments before the loop starts.

use lithos_types::{LithosError, LithosResult};

use crate::contract::{CheckpointSchedule, RunParams};

/// Validates the arguments of a `run_for` call.
///
/// Checks:
/// - duration, timestep ceiling and time interval are positive and finite
/// - step interval and swarm stride are at least 1
/// - checkpoint times are finite
pub fn validate_run_params(params: &RunParams) -> LithosResult<()> {
    if let Some(d) = params.duration {
        if !(d.is_finite() && d > 0.0) {
            return Err(LithosError::InvalidConfig(format!("duration must be positive, got {d}")));
        }
    }
    match params.checkpoint {
        Some(CheckpointSchedule::ByTime(interval)) if !(interval.is_finite() && interval > 0.0) => {
            return Err(LithosError::InvalidConfig(format!(
                "checkpoint interval must be positive, got {interval}"
            )));
        }
        Some(CheckpointSchedule::BySteps(0)) => {
            return Err(LithosError::InvalidConfig("checkpoint step interval must be >= 1".into()));
        }
        _ => {}
    }
    if params.restart_checkpoint == 0 {
        return Err(LithosError::InvalidConfig("restart_checkpoint stride must be >= 1".into()));
    }
    if let Some(dt) = params.dt {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(LithosError::InvalidConfig(format!("dt ceiling must be positive, got {dt}")));
        }
    }
    if let Some(t) = params.checkpoint_times.iter().find(|t| !t.is_finite()) {
        return Err(LithosError::InvalidConfig(format!("checkpoint time {t} is not finite")));
    }
    Ok(())
}
