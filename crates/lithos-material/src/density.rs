//! Density laws.

use serde::{Deserialize, Serialize};

use lithos_types::{LithosError, LithosResult, MaterialId, Scalar};

use crate::point::PointState;

/// Density law of a material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DensityLaw {
    /// Uniform density.
    Constant {
        density: Scalar,
    },
    /// Thermally and mechanically linearised density:
    ///
    /// `rho = rho0 * (1 + beta * (P - P0) - alpha * (T - T0))`
    Linear {
        reference_density: Scalar,
        #[serde(default = "default_expansivity")]
        thermal_expansivity: Scalar,
        #[serde(default = "default_reference_temperature")]
        reference_temperature: Scalar,
        #[serde(default)]
        beta: Scalar,
        #[serde(default)]
        reference_pressure: Scalar,
    },
}

fn default_expansivity() -> Scalar {
    3.0e-5
}

fn default_reference_temperature() -> Scalar {
    273.15
}

impl DensityLaw {
    /// Uniform density.
    pub fn constant(density: Scalar) -> Self {
        DensityLaw::Constant { density }
    }

    /// Linear law with the default expansivity (3e-5 1/K), reference
    /// temperature (273.15 K) and no pressure dependence.
    pub fn linear(reference_density: Scalar) -> Self {
        DensityLaw::Linear {
            reference_density,
            thermal_expansivity: default_expansivity(),
            reference_temperature: default_reference_temperature(),
            beta: 0.0,
            reference_pressure: 0.0,
        }
    }

    /// Density at reference conditions.
    pub fn reference_density(&self) -> Scalar {
        match *self {
            DensityLaw::Constant { density } => density,
            DensityLaw::Linear { reference_density, .. } => reference_density,
        }
    }

    /// Evaluates the law at one particle.
    ///
    /// The linear law needs a temperature and fails with
    /// [`LithosError::MissingField`] without one.
    pub fn evaluate(&self, material: MaterialId, point: &PointState) -> LithosResult<Scalar> {
        match *self {
            DensityLaw::Constant { density } => Ok(density),
            DensityLaw::Linear {
                reference_density,
                thermal_expansivity,
                reference_temperature,
                beta,
                reference_pressure,
            } => {
                let t = point
                    .temperature
                    .ok_or(LithosError::MissingField { material, field: "temperature" })?;
                let t_term = thermal_expansivity * (t - reference_temperature);
                let p_term = beta * (point.pressure - reference_pressure);
                Ok(reference_density * (1.0 + p_term - t_term))
            }
        }
    }

    /// Human-readable description.
    pub fn name(&self) -> String {
        match self {
            DensityLaw::Constant { density } => format!("Constant ({density})"),
            DensityLaw::Linear { reference_density, .. } => format!("Linear (ref: {reference_density})"),
        }
    }
}
