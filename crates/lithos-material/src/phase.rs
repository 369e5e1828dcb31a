//! Phase-change rules.
//!
//! A rule attached to a material reassigns particles of that material to
//! `result` wherever its trigger fires.

use serde::{Deserialize, Serialize};

use lithos_types::{Dimension, MaterialId, Scalar};

use crate::point::PointState;
use crate::shape::Shape;

/// Condition under which a phase change fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PhaseTrigger {
    /// Particle lies inside a region.
    Region { shape: Shape },
    /// Temperature strictly above a threshold. Never fires without temperature.
    TemperatureAbove { temperature: Scalar },
    /// Temperature strictly below a threshold. Never fires without temperature.
    TemperatureBelow { temperature: Scalar },
    /// Pressure strictly above a threshold.
    PressureAbove { pressure: Scalar },
    /// Accumulated plastic strain strictly above a threshold.
    PlasticStrainAbove { strain: Scalar },
    /// All nested triggers fire.
    All { triggers: Vec<PhaseTrigger> },
}

impl PhaseTrigger {
    pub fn fires(&self, point: &PointState, dim: Dimension) -> bool {
        match self {
            PhaseTrigger::Region { shape } => shape.contains(&point.position, dim),
            PhaseTrigger::TemperatureAbove { temperature } => point.temperature.is_some_and(|t| t > *temperature),
            PhaseTrigger::TemperatureBelow { temperature } => point.temperature.is_some_and(|t| t < *temperature),
            PhaseTrigger::PressureAbove { pressure } => point.pressure > *pressure,
            PhaseTrigger::PlasticStrainAbove { strain } => point.plastic_strain > *strain,
            PhaseTrigger::All { triggers } => triggers.iter().all(|t| t.fires(point, dim)),
        }
    }
}

/// One phase-change rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseChange {
    pub trigger: PhaseTrigger,
    /// Target material.
    pub result: MaterialId,
}

impl PhaseChange {
    pub fn new(trigger: PhaseTrigger, result: MaterialId) -> Self {
        Self { trigger, result }
    }
}
