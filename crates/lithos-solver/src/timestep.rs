//! Timestep selector.
//!
//! The admissible timestep is the minimum over a set of independent
//! bounds. A bound that does not apply is `None` and takes no part in the
//! minimum.

use std::fmt;

use lithos_types::constants::ELASTIC_DT_FRACTION;
use lithos_types::{LithosError, LithosResult, Scalar};

/// Origin of a timestep bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimestepBound {
    /// `2 CFL` times the advector's stable step.
    Advection,
    /// `2 CFL` times the SUPG advection-diffusion stable step.
    Thermal,
    /// Time left to the next interval checkpoint.
    NextCheckpoint,
    /// Time left in the requested duration.
    RunEnd,
    /// User ceiling.
    UserCeiling,
    /// Time left to the nearest listed checkpoint time.
    CheckpointTime,
    /// One third of the smallest elastic observation time.
    ElasticRelaxation,
}

impl fmt::Display for TimestepBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimestepBound::Advection => "advection",
            TimestepBound::Thermal => "thermal",
            TimestepBound::NextCheckpoint => "next_checkpoint",
            TimestepBound::RunEnd => "run_end",
            TimestepBound::UserCeiling => "user_ceiling",
            TimestepBound::CheckpointTime => "checkpoint_time",
            TimestepBound::ElasticRelaxation => "elastic_relaxation",
        };
        f.write_str(s)
    }
}

/// Candidate bounds for one iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimestepBounds {
    pub advection: Scalar,
    pub thermal: Option<Scalar>,
    pub next_checkpoint: Option<Scalar>,
    pub run_end: Option<Scalar>,
    pub user_ceiling: Option<Scalar>,
    pub checkpoint_time: Option<Scalar>,
    pub elastic: Option<Scalar>,
}

impl TimestepBounds {
    /// Only the advective bound active.
    pub fn advective(dt: Scalar) -> Self {
        Self {
            advection: dt,
            thermal: None,
            next_checkpoint: None,
            run_end: None,
            user_ceiling: None,
            checkpoint_time: None,
            elastic: None,
        }
    }

    /// Active bounds in evaluation order.
    pub fn active(&self) -> impl Iterator<Item = (TimestepBound, Scalar)> {
        [
            (TimestepBound::Advection, Some(self.advection)),
            (TimestepBound::Thermal, self.thermal),
            (TimestepBound::NextCheckpoint, self.next_checkpoint),
            (TimestepBound::RunEnd, self.run_end),
            (TimestepBound::UserCeiling, self.user_ceiling),
            (TimestepBound::CheckpointTime, self.checkpoint_time),
            (TimestepBound::ElasticRelaxation, self.elastic),
        ]
        .into_iter()
        .filter_map(|(b, v)| v.map(|v| (b, v)))
    }

    /// Minimum active bound and its origin; the first bound wins a tie.
    ///
    /// Fails when the minimum is not a positive finite number, e.g. a
    /// model at rest with no other bound active.
    pub fn select(&self) -> LithosResult<(Scalar, TimestepBound)> {
        let mut best = (self.advection, TimestepBound::Advection);
        for (bound, value) in self.active().skip(1) {
            if value < best.0 {
                best = (value, bound);
            }
        }
        if !(best.0.is_finite() && best.0 > 0.0) {
            return Err(LithosError::InvariantViolation(format!(
                "no admissible timestep: {} bound is {}",
                best.1, best.0
            )));
        }
        Ok(best)
    }
}

/// Raw inputs of the selector, gathered by the stepping loop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimestepInputs<'a> {
    pub cfl: Scalar,
    /// Advector's stable step.
    pub advector_max_dt: Scalar,
    /// Thermal solver's stable step when the scheme limits the timestep.
    pub thermal_max_dt: Option<Scalar>,
    pub time: Scalar,
    /// Absolute time of the next interval checkpoint.
    pub next_checkpoint: Option<Scalar>,
    /// Absolute end of the requested duration.
    pub run_end: Option<Scalar>,
    pub user_ceiling: Option<Scalar>,
    /// Additional absolute checkpoint times.
    pub checkpoint_times: &'a [Scalar],
    /// Smallest elastic observation time.
    pub min_observation_time: Option<Scalar>,
}

impl TimestepInputs<'_> {
    /// Turns absolute targets into remaining gaps.
    ///
    /// Targets already reached contribute nothing, so a bound can never
    /// force a zero step.
    pub fn bounds(&self) -> TimestepBounds {
        let ahead = |target: Scalar| {
            let gap = target - self.time;
            (gap > 0.0).then_some(gap)
        };
        TimestepBounds {
            advection: 2.0 * self.cfl * self.advector_max_dt,
            thermal: self.thermal_max_dt.map(|dt| 2.0 * self.cfl * dt),
            next_checkpoint: self.next_checkpoint.and_then(ahead),
            run_end: self.run_end.and_then(ahead),
            user_ceiling: self.user_ceiling,
            checkpoint_time: self
                .checkpoint_times
                .iter()
                .filter_map(|&t| ahead(t))
                .fold(None, |acc: Option<Scalar>, g| Some(acc.map_or(g, |a| a.min(g)))),
            elastic: self.min_observation_time.map(|t| t * ELASTIC_DT_FRACTION),
        }
    }

    pub fn select(&self) -> LithosResult<(Scalar, TimestepBound)> {
        self.bounds().select()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimum_of_active_bounds() {
        let b = TimestepBounds { user_ceiling: Some(3.0), elastic: Some(2.0), ..TimestepBounds::advective(10.0) };
        assert_eq!(b.select().unwrap(), (2.0, TimestepBound::ElasticRelaxation));
    }

    #[test]
    fn tie_keeps_first_bound() {
        let b = TimestepBounds { run_end: Some(5.0), ..TimestepBounds::advective(5.0) };
        assert_eq!(b.select().unwrap().1, TimestepBound::Advection);
    }

    #[test]
    fn at_rest_without_other_bounds_fails() {
        assert!(TimestepBounds::advective(f64::INFINITY).select().is_err());
        let b = TimestepBounds { run_end: Some(4.0), ..TimestepBounds::advective(f64::INFINITY) };
        assert_eq!(b.select().unwrap(), (4.0, TimestepBound::RunEnd));
    }

    #[test]
    fn inputs_skip_reached_targets() {
        let times = [5.0, 10.0, 12.0];
        let inputs = TimestepInputs {
            cfl: 0.5,
            advector_max_dt: 100.0,
            time: 10.0,
            checkpoint_times: &times,
            ..Default::default()
        };
        let b = inputs.bounds();
        assert_eq!(b.advection, 100.0);
        assert_eq!(b.checkpoint_time, Some(2.0));
        assert_eq!(b.next_checkpoint, None);
    }
}
