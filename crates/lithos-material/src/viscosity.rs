//! Viscous flow laws.
//!
//! Parameters are expected in the solver's non-dimensional domain; the
//! creep law carries its own gas constant so callers can scale it
//! consistently with activation energies.

use serde::{Deserialize, Serialize};

use lithos_types::constants::{GAS_CONSTANT, STRAIN_RATE_FLOOR};
use lithos_types::{LithosError, LithosResult, MaterialId, Scalar};

use crate::point::PointState;

/// Viscous law of a material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViscosityLaw {
    /// Newtonian, uniform viscosity.
    Constant { viscosity: Scalar },
    /// Power-law dislocation/diffusion creep.
    Creep(ViscousCreep),
}

/// Power-law creep:
///
/// ```text
/// eta = f/2 · A^(-1/n) · edot^((1-n)/n) · d^(m/n) · fH2O^(-r/n) · exp((E + P·V) / (n·R·T))
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViscousCreep {
    pub name: String,
    pub pre_exponential_factor: Scalar,
    pub stress_exponent: Scalar,
    #[serde(default)]
    pub activation_energy: Scalar,
    #[serde(default)]
    pub activation_volume: Scalar,
    #[serde(default = "one")]
    pub grain_size: Scalar,
    #[serde(default)]
    pub grain_size_exponent: Scalar,
    #[serde(default = "one")]
    pub water_fugacity: Scalar,
    #[serde(default)]
    pub water_fugacity_exponent: Scalar,
    #[serde(default = "one")]
    pub scaling_factor: Scalar,
    #[serde(default = "gas_constant")]
    pub gas_constant: Scalar,
}

fn one() -> Scalar {
    1.0
}

fn gas_constant() -> Scalar {
    GAS_CONSTANT
}

impl ViscousCreep {
    /// Creep law with only a pre-factor and stress exponent; other terms neutral.
    pub fn new(name: impl Into<String>, pre_exponential_factor: Scalar, stress_exponent: Scalar) -> Self {
        Self {
            name: name.into(),
            pre_exponential_factor,
            stress_exponent,
            activation_energy: 0.0,
            activation_volume: 0.0,
            grain_size: 1.0,
            grain_size_exponent: 0.0,
            water_fugacity: 1.0,
            water_fugacity_exponent: 0.0,
            scaling_factor: 1.0,
            gas_constant: GAS_CONSTANT,
        }
    }

    /// Sets the Arrhenius terms.
    pub fn with_activation(mut self, energy: Scalar, volume: Scalar) -> Self {
        self.activation_energy = energy;
        self.activation_volume = volume;
        self
    }

    fn is_thermally_activated(&self) -> bool {
        self.activation_energy != 0.0 || self.activation_volume != 0.0
    }

    fn evaluate(&self, material: MaterialId, point: &PointState) -> LithosResult<Scalar> {
        let n = self.stress_exponent;
        let edot = point.strain_rate_invariant.max(STRAIN_RATE_FLOOR);

        let mut eta = self.scaling_factor
            * 0.5
            * self.pre_exponential_factor.powf(-1.0 / n)
            * edot.powf((1.0 - n) / n)
            * self.grain_size.powf(self.grain_size_exponent / n)
            * self.water_fugacity.powf(-self.water_fugacity_exponent / n);

        if self.is_thermally_activated() {
            let t = point
                .temperature
                .ok_or(LithosError::MissingField { material, field: "temperature" })?;
            let arg = (self.activation_energy + point.pressure * self.activation_volume)
                / (n * self.gas_constant * t);
            eta *= arg.exp();
        }
        Ok(eta)
    }
}

impl ViscosityLaw {
    /// Newtonian viscosity.
    pub fn constant(viscosity: Scalar) -> Self {
        ViscosityLaw::Constant { viscosity }
    }

    /// Evaluates the viscous branch at one particle.
    pub fn evaluate(&self, material: MaterialId, point: &PointState) -> LithosResult<Scalar> {
        match self {
            ViscosityLaw::Constant { viscosity } => Ok(*viscosity),
            ViscosityLaw::Creep(creep) => creep.evaluate(material, point),
        }
    }

    /// Human-readable description.
    pub fn name(&self) -> String {
        match self {
            ViscosityLaw::Constant { viscosity } => format!("Constant ({viscosity:e})"),
            ViscosityLaw::Creep(c) => c.name.clone(),
        }
    }
}
