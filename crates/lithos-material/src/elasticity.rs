//! Maxwell visco-elasticity.

use serde::{Deserialize, Serialize};

use lithos_types::{Scalar, SymTensor};

/// Elastic behaviour of a material.
///
/// The elastic contribution is expressed through an effective viscosity
/// and a stress-history term, both scaled by `mu * dt_e` where `dt_e` is
/// the observation time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Elasticity {
    /// Shear modulus `mu`.
    pub shear_modulus: Scalar,
    /// Elastic observation time `dt_e`.
    pub observation_time: Scalar,
}

impl Elasticity {
    pub fn new(shear_modulus: Scalar, observation_time: Scalar) -> Self {
        Self { shear_modulus, observation_time }
    }

    /// `mu * dt_e`.
    #[inline]
    pub fn relaxation_viscosity(&self) -> Scalar {
        self.shear_modulus * self.observation_time
    }

    /// Visco-elastic effective viscosity `eta mu dt_e / (eta + mu dt_e)`.
    pub fn effective_viscosity(&self, viscosity: Scalar) -> Scalar {
        let g = self.relaxation_viscosity();
        viscosity * g / (viscosity + g)
    }

    /// Elastic stress carried over from the previous step.
    pub fn elastic_stress(&self, effective_viscosity: Scalar, previous_stress: SymTensor) -> SymTensor {
        previous_stress * (effective_viscosity / self.relaxation_viscosity())
    }

    /// Strain rate augmented by the stress history, used for yielding.
    pub fn effective_strain_rate(&self, strain_rate: SymTensor, previous_stress: SymTensor) -> SymTensor {
        strain_rate + previous_stress * (0.5 / self.relaxation_viscosity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_viscosity_is_below_both_branches() {
        let e = Elasticity::new(1e10, 1e10);
        let eta = 1e21;
        let eff = e.effective_viscosity(eta);
        assert!(eff < eta);
        assert!(eff < e.relaxation_viscosity());
        // Harmonic mean of equal branches halves them.
        let e = Elasticity::new(1e11, 1e10);
        assert!((e.effective_viscosity(1e21) - 0.5e21).abs() / 1e21 < 1e-12);
    }

    #[test]
    fn elastic_stress_scales_history() {
        let e = Elasticity::new(2.0, 5.0);
        let prev = SymTensor::new_2d(1.0, -1.0, 0.5);
        let s = e.elastic_stress(5.0, prev);
        assert_eq!(s, prev * 0.5);
    }
}
