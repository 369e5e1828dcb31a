//! Non-dimensional scaling.
//!
//! Physical inputs are divided by a characteristic combination of the
//! length, mass, time and temperature scales before they reach the
//! composer or the timestep selector. Every quantity is described by its
//! [`Dimensions`] exponents.

use serde::{Deserialize, Serialize};

use crate::error::{LithosError, LithosResult};
use crate::scalar::Scalar;

/// Seconds in one Julian year.
pub const SECONDS_PER_YEAR: Scalar = 365.25 * 24.0 * 3600.0;

/// Exponents of the base dimensions of a physical quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub length: i32,
    pub mass: i32,
    pub time: i32,
    pub temperature: i32,
}

impl Dimensions {
    const fn new(length: i32, mass: i32, time: i32, temperature: i32) -> Self {
        Self { length, mass, time, temperature }
    }

    pub const DIMENSIONLESS: Dimensions = Dimensions::new(0, 0, 0, 0);
    pub const LENGTH: Dimensions = Dimensions::new(1, 0, 0, 0);
    pub const TIME: Dimensions = Dimensions::new(0, 0, 1, 0);
    pub const TEMPERATURE: Dimensions = Dimensions::new(0, 0, 0, 1);
    pub const VELOCITY: Dimensions = Dimensions::new(1, 0, -1, 0);
    pub const STRAIN_RATE: Dimensions = Dimensions::new(0, 0, -1, 0);
    /// Pa = kg m⁻¹ s⁻².
    pub const STRESS: Dimensions = Dimensions::new(-1, 1, -2, 0);
    /// Pa·s.
    pub const VISCOSITY: Dimensions = Dimensions::new(-1, 1, -1, 0);
    pub const DENSITY: Dimensions = Dimensions::new(-3, 1, 0, 0);
    pub const DIFFUSIVITY: Dimensions = Dimensions::new(2, 0, -1, 0);
    /// W m⁻³.
    pub const HEAT_PRODUCTION: Dimensions = Dimensions::new(-1, 1, -3, 0);
    /// J kg⁻¹ K⁻¹.
    pub const HEAT_CAPACITY: Dimensions = Dimensions::new(2, 0, -2, -1);
    /// J kg⁻¹.
    pub const LATENT_HEAT: Dimensions = Dimensions::new(2, 0, -2, 0);
    pub const EXPANSIVITY: Dimensions = Dimensions::new(0, 0, 0, -1);
    /// Pa⁻¹.
    pub const COMPRESSIBILITY: Dimensions = Dimensions::new(1, -1, 2, 0);
    pub const ACCELERATION: Dimensions = Dimensions::new(1, 0, -2, 0);
}

/// Characteristic scales used to non-dimensionalise physical inputs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scaling {
    /// Length scale (m).
    pub length: Scalar,
    /// Mass scale (kg).
    pub mass: Scalar,
    /// Time scale (s).
    pub time: Scalar,
    /// Temperature scale (K).
    pub temperature: Scalar,
}

impl Default for Scaling {
    /// SI units with time measured in years.
    fn default() -> Self {
        Self {
            length: 1.0,
            mass: 1.0,
            time: SECONDS_PER_YEAR,
            temperature: 1.0,
        }
    }
}

impl Scaling {
    /// Identity scaling (values pass through unchanged).
    pub fn identity() -> Self {
        Self { length: 1.0, mass: 1.0, time: 1.0, temperature: 1.0 }
    }

    /// Checks that all scales are finite and strictly positive.
    pub fn validate(&self) -> LithosResult<()> {
        for (name, v) in [
            ("length", self.length),
            ("mass", self.mass),
            ("time", self.time),
            ("temperature", self.temperature),
        ] {
            if !(v.is_finite() && v > 0.0) {
                return Err(LithosError::InvalidConfig(format!(
                    "scaling.{name} must be positive, got {v}"
                )));
            }
        }
        Ok(())
    }

    fn factor(&self, dims: Dimensions) -> Scalar {
        self.length.powi(dims.length)
            * self.mass.powi(dims.mass)
            * self.time.powi(dims.time)
            * self.temperature.powi(dims.temperature)
    }

    /// Converts a physical value into the solver's numeric domain.
    #[inline]
    pub fn nd(&self, value: Scalar, dims: Dimensions) -> Scalar {
        value / self.factor(dims)
    }

    /// Converts a non-dimensional value back to physical units.
    #[inline]
    pub fn dimensionalise(&self, value: Scalar, dims: Dimensions) -> Scalar {
        value * self.factor(dims)
    }
}
