//! Partial melting and melt weakening.

use serde::{Deserialize, Serialize};

use lithos_types::{LithosError, LithosResult, MaterialId, Scalar};

/// Cubic polynomial `T(P) = c0 + c1 P + c2 P^2 + c3 P^3`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolidusCurve {
    pub c0: Scalar,
    #[serde(default)]
    pub c1: Scalar,
    #[serde(default)]
    pub c2: Scalar,
    #[serde(default)]
    pub c3: Scalar,
}

impl SolidusCurve {
    pub fn new(c0: Scalar, c1: Scalar, c2: Scalar, c3: Scalar) -> Self {
        Self { c0, c1, c2, c3 }
    }

    /// Pressure-independent curve.
    pub fn constant(temperature: Scalar) -> Self {
        Self::new(temperature, 0.0, 0.0, 0.0)
    }

    /// Temperature at the given pressure (Horner form).
    #[inline]
    pub fn temperature(&self, pressure: Scalar) -> Scalar {
        self.c0 + pressure * (self.c1 + pressure * (self.c2 + pressure * self.c3))
    }
}

/// Batch-melting parameterisation between a solidus and a liquidus.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeltModel {
    pub solidus: SolidusCurve,
    pub liquidus: SolidusCurve,
    /// Upper bound of the melt fraction.
    #[serde(default = "default_limit")]
    pub limit: Scalar,
}

fn default_limit() -> Scalar {
    0.3
}

impl MeltModel {
    pub fn new(solidus: SolidusCurve, liquidus: SolidusCurve) -> Self {
        Self { solidus, liquidus, limit: default_limit() }
    }

    pub fn with_limit(mut self, limit: Scalar) -> Self {
        self.limit = limit;
        self
    }

    /// Melt fraction at `(pressure, temperature)`.
    ///
    /// Zero outside the window between solidus and liquidus, capped at
    /// [`MeltModel::limit`] inside it.
    pub fn melt_fraction(&self, pressure: Scalar, temperature: Scalar) -> Scalar {
        let ts = self.solidus.temperature(pressure);
        let tl = self.liquidus.temperature(pressure);
        let t_ss = (temperature - 0.5 * (ts + tl)) / (tl - ts);
        if -0.5 < t_ss && t_ss < 0.5 {
            let f = 0.5 + t_ss + (t_ss * t_ss - 0.25) * (0.4256 + 2.988 * t_ss);
            f.min(self.limit)
        } else {
            0.0
        }
    }
}

/// Three-segment viscosity multiplier as a function of melt fraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeltWeakening {
    /// Multiplier reached at and above `x2`.
    pub viscosity_change: Scalar,
    pub x1: Scalar,
    pub x2: Scalar,
}

impl MeltWeakening {
    pub fn new(viscosity_change: Scalar, x1: Scalar, x2: Scalar) -> Self {
        Self { viscosity_change, x1, x2 }
    }

    /// Rejects degenerate breakpoints.
    pub fn validate(&self, material: MaterialId) -> LithosResult<()> {
        if self.x2 <= self.x1 {
            return Err(LithosError::Configuration(format!(
                "melt weakening of material {material}: x2 ({}) must exceed x1 ({})",
                self.x2, self.x1
            )));
        }
        Ok(())
    }

    /// Multiplier at the given melt fraction.
    pub fn multiplier(&self, melt: Scalar) -> Scalar {
        if melt < self.x1 {
            1.0
        } else if melt > self.x2 {
            self.viscosity_change
        } else {
            1.0 + (self.viscosity_change - 1.0) / (self.x2 - self.x1) * (melt - self.x1)
        }
    }
}
