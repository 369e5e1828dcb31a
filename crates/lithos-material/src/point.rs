//! Per-particle evaluation point.

use lithos_types::{Scalar, SymTensor};

/// Snapshot of the fields a constitutive law may read at one particle.
///
/// Built by the composer from the swarm storage and the latest solution
/// samples. `temperature` is `None` when the model carries no thermal field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointState {
    /// Particle position; unused trailing axes are zero.
    pub position: [Scalar; 3],
    /// Dynamic pressure.
    pub pressure: Scalar,
    /// Temperature, if the model solves for it.
    pub temperature: Option<Scalar>,
    /// Strain-rate tensor (symmetric velocity gradient).
    pub strain_rate: SymTensor,
    /// Second invariant of the strain rate. Equals the default strain rate
    /// before the first solve.
    pub strain_rate_invariant: Scalar,
    /// Accumulated plastic strain.
    pub plastic_strain: Scalar,
    /// Melt fraction carried by the particle.
    pub melt: Scalar,
    /// Stress history carried by the particle.
    pub previous_stress: SymTensor,
}

impl Default for PointState {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            pressure: 0.0,
            temperature: None,
            strain_rate: SymTensor::ZERO,
            strain_rate_invariant: lithos_types::constants::DEFAULT_STRAIN_RATE,
            plastic_strain: 0.0,
            melt: 0.0,
            previous_stress: SymTensor::ZERO,
        }
    }
}
