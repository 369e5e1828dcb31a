//! Plastic yield criteria with linear strain softening.

use serde::{Deserialize, Serialize};

use lithos_types::{Dimension, Scalar};

use crate::point::PointState;

/// Plastic law of a material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlasticityLaw {
    /// Pressure-independent yield stress.
    VonMises { yield_stress: Scalar },
    /// Pressure-dependent Drucker-Prager criterion.
    DruckerPrager(DruckerPrager),
}

/// Drucker-Prager yield criterion.
///
/// Cohesion and friction coefficient soften linearly from their intact
/// values to the "after softening" values as the accumulated plastic
/// strain goes from `epsilon1` to `epsilon2`. The friction angle is
/// `atan(friction_coefficient)`.
///
/// ```text
/// 2-D: tau_y = C cos(phi) + P sin(phi)
/// 3-D: tau_y = 6 (C cos(phi) + P sin(phi)) / (sqrt(3) (3 - sin(phi)))
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DruckerPrager {
    pub cohesion: Scalar,
    pub cohesion_after_softening: Scalar,
    pub friction_coefficient: Scalar,
    pub friction_after_softening: Scalar,
    #[serde(default)]
    pub epsilon1: Scalar,
    #[serde(default = "default_epsilon2")]
    pub epsilon2: Scalar,
}

fn default_epsilon2() -> Scalar {
    1.0
}

impl DruckerPrager {
    /// Criterion without softening.
    pub fn new(cohesion: Scalar, friction_coefficient: Scalar) -> Self {
        Self {
            cohesion,
            cohesion_after_softening: cohesion,
            friction_coefficient,
            friction_after_softening: friction_coefficient,
            epsilon1: 0.0,
            epsilon2: default_epsilon2(),
        }
    }

    /// Adds linear strain softening between `epsilon1` and `epsilon2`.
    pub fn with_softening(
        mut self,
        cohesion_after_softening: Scalar,
        friction_after_softening: Scalar,
        epsilon1: Scalar,
        epsilon2: Scalar,
    ) -> Self {
        self.cohesion_after_softening = cohesion_after_softening;
        self.friction_after_softening = friction_after_softening;
        self.epsilon1 = epsilon1;
        self.epsilon2 = epsilon2;
        self
    }

    fn soften(&self, intact: Scalar, weakened: Scalar, plastic_strain: Scalar) -> Scalar {
        if plastic_strain <= self.epsilon1 {
            return intact;
        }
        if plastic_strain >= self.epsilon2 {
            return weakened;
        }
        let s = (plastic_strain - self.epsilon1) / (self.epsilon2 - self.epsilon1);
        intact + (weakened - intact) * s
    }

    /// Cohesion at the given accumulated plastic strain.
    pub fn cohesion_at(&self, plastic_strain: Scalar) -> Scalar {
        self.soften(self.cohesion, self.cohesion_after_softening, plastic_strain)
    }

    /// Friction coefficient at the given accumulated plastic strain.
    pub fn friction_at(&self, plastic_strain: Scalar) -> Scalar {
        self.soften(self.friction_coefficient, self.friction_after_softening, plastic_strain)
    }

    /// Yield stress; floored at zero under tension.
    pub fn yield_stress(&self, dim: Dimension, pressure: Scalar, plastic_strain: Scalar) -> Scalar {
        let c = self.cohesion_at(plastic_strain);
        let phi = self.friction_at(plastic_strain).atan();
        let (sin_phi, cos_phi) = phi.sin_cos();
        let tau = match dim {
            Dimension::Two => c * cos_phi + pressure * sin_phi,
            Dimension::Three => {
                6.0 * (c * cos_phi + pressure * sin_phi) / (3.0f64.sqrt() * (3.0 - sin_phi))
            }
        };
        tau.max(0.0)
    }
}

impl PlasticityLaw {
    /// Constant yield stress.
    pub fn von_mises(yield_stress: Scalar) -> Self {
        PlasticityLaw::VonMises { yield_stress }
    }

    /// Yield stress at one particle.
    pub fn yield_stress(&self, dim: Dimension, point: &PointState) -> Scalar {
        match self {
            PlasticityLaw::VonMises { yield_stress } => *yield_stress,
            PlasticityLaw::DruckerPrager(dp) => dp.yield_stress(dim, point.pressure, point.plastic_strain),
        }
    }

    /// Copy of this law with both intact and softened friction replaced.
    ///
    /// Laws without a friction coefficient are returned unchanged.
    pub fn with_friction(&self, friction: Scalar) -> PlasticityLaw {
        match self {
            PlasticityLaw::VonMises { .. } => self.clone(),
            PlasticityLaw::DruckerPrager(dp) => PlasticityLaw::DruckerPrager(DruckerPrager {
                friction_coefficient: friction,
                friction_after_softening: friction,
                ..dp.clone()
            }),
        }
    }

    /// Human-readable description.
    pub fn name(&self) -> &'static str {
        match self {
            PlasticityLaw::VonMises { .. } => "von Mises",
            PlasticityLaw::DruckerPrager(_) => "Drucker-Prager",
        }
    }
}
