//! Model configuration.
//!
//! Typed replacement for a string-keyed parameter dictionary. Values are
//! in the solver's non-dimensional units.

use serde::{Deserialize, Serialize};

use lithos_types::constants::{
    DEFAULT_CFL, DEFAULT_DIFFUSIVITY, DEFAULT_MAX_VISCOSITY, DEFAULT_MIN_VISCOSITY, DEFAULT_STRAIN_RATE, GRAVITY,
};
use lithos_types::{Dimension, LithosError, LithosResult, Scalar};

/// Stabilisation scheme of the advection-diffusion solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvectionDiffusion {
    /// Streamline-upwind Petrov-Galerkin; contributes a timestep bound.
    Supg,
    /// Semi-Lagrangian Crank-Nicolson; unconditionally stable.
    Slcn,
}

impl AdvectionDiffusion {
    /// Whether the scheme limits the timestep.
    pub fn limits_timestep(self) -> bool {
        matches!(self, AdvectionDiffusion::Supg)
    }
}

/// Particle population control parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub aggressive: bool,
    /// Relative cell-volume threshold above which particles are split.
    pub split_threshold: Scalar,
    pub max_splits: u32,
    pub particles_per_cell_2d: usize,
    pub particles_per_cell_3d: usize,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            aggressive: true,
            split_threshold: 0.15,
            max_splits: 10,
            particles_per_cell_2d: 40,
            particles_per_cell_3d: 120,
        }
    }
}

impl PopulationConfig {
    pub fn particles_per_cell(&self, dim: Dimension) -> usize {
        match dim {
            Dimension::Two => self.particles_per_cell_2d,
            Dimension::Three => self.particles_per_cell_3d,
        }
    }
}

/// Configuration of a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub name: String,
    pub output_dir: String,

    /// Courant number applied to the advective and SUPG bounds.
    pub cfl: Scalar,

    pub initial_nonlinear_tolerance: Scalar,
    pub initial_nonlinear_min_iterations: u32,
    pub initial_nonlinear_max_iterations: u32,
    pub nonlinear_tolerance: Scalar,
    pub nonlinear_min_iterations: u32,
    pub nonlinear_max_iterations: u32,

    pub shear_heating: bool,
    pub advection_diffusion: AdvectionDiffusion,

    /// Strain-rate invariant assumed before the first solve.
    pub default_strain_rate: Scalar,
    pub min_viscosity: Scalar,
    pub max_viscosity: Scalar,
    /// Diffusivity of materials that do not declare one.
    pub diffusivity: Scalar,
    pub gravity: Scalar,
    /// Model-wide cap on yield stress; a material-level limiter wins.
    pub stress_limiter: Option<Scalar>,

    pub population: PopulationConfig,

    /// Fields written at every checkpoint.
    pub default_outputs: Vec<String>,
    /// Solver fields reloaded on restart. Swarm variables always reload.
    pub restart_fields: Vec<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "Model".into(),
            output_dir: "outputs".into(),
            cfl: DEFAULT_CFL,
            initial_nonlinear_tolerance: 1e-2,
            initial_nonlinear_min_iterations: 2,
            initial_nonlinear_max_iterations: 500,
            nonlinear_tolerance: 1e-2,
            nonlinear_min_iterations: 2,
            nonlinear_max_iterations: 500,
            shear_heating: false,
            advection_diffusion: AdvectionDiffusion::Supg,
            default_strain_rate: DEFAULT_STRAIN_RATE,
            min_viscosity: DEFAULT_MIN_VISCOSITY,
            max_viscosity: DEFAULT_MAX_VISCOSITY,
            diffusivity: DEFAULT_DIFFUSIVITY,
            gravity: GRAVITY,
            stress_limiter: None,
            population: PopulationConfig::default(),
            default_outputs: [
                "temperature",
                "pressure",
                "strain_rate",
                "velocity",
                "stress",
                "viscosity",
                "density",
                "plastic_strain",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            restart_fields: ["temperature", "pressure", "velocity"].iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ModelConfig {
    /// Fast configuration for tests and debugging (few iterations, loose
    /// tolerance, sparse swarm).
    pub fn debug() -> Self {
        Self {
            initial_nonlinear_max_iterations: 5,
            nonlinear_max_iterations: 5,
            initial_nonlinear_tolerance: 1e-1,
            nonlinear_tolerance: 1e-1,
            population: PopulationConfig {
                particles_per_cell_2d: 4,
                particles_per_cell_3d: 8,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Tighter non-linear convergence.
    pub fn high_quality() -> Self {
        Self {
            initial_nonlinear_tolerance: 1e-3,
            nonlinear_tolerance: 1e-4,
            nonlinear_max_iterations: 1000,
            ..Default::default()
        }
    }

    /// `(tolerance, min_iterations, max_iterations)` for a solve.
    pub fn nonlinear_bounds(&self, initial: bool) -> (Scalar, u32, u32) {
        if initial {
            (
                self.initial_nonlinear_tolerance,
                self.initial_nonlinear_min_iterations,
                self.initial_nonlinear_max_iterations,
            )
        } else {
            (self.nonlinear_tolerance, self.nonlinear_min_iterations, self.nonlinear_max_iterations)
        }
    }

    /// Rejects physically or numerically meaningless settings.
    pub fn validate(&self) -> LithosResult<()> {
        let positive = [
            ("cfl", self.cfl),
            ("initial_nonlinear_tolerance", self.initial_nonlinear_tolerance),
            ("nonlinear_tolerance", self.nonlinear_tolerance),
            ("default_strain_rate", self.default_strain_rate),
            ("min_viscosity", self.min_viscosity),
            ("max_viscosity", self.max_viscosity),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(LithosError::InvalidConfig(format!("{name} must be positive, got {value}")));
            }
        }
        if self.min_viscosity > self.max_viscosity {
            return Err(LithosError::InvalidConfig(format!(
                "min_viscosity {:e} exceeds max_viscosity {:e}",
                self.min_viscosity, self.max_viscosity
            )));
        }
        if self.initial_nonlinear_min_iterations > self.initial_nonlinear_max_iterations
            || self.nonlinear_min_iterations > self.nonlinear_max_iterations
        {
            return Err(LithosError::InvalidConfig("min iterations exceed max iterations".into()));
        }
        if self.diffusivity < 0.0 {
            return Err(LithosError::InvalidConfig("diffusivity must be non-negative".into()));
        }
        if let Some(limit) = self.stress_limiter {
            if limit <= 0.0 {
                return Err(LithosError::InvalidConfig("stress_limiter must be positive".into()));
            }
        }
        if self.population.particles_per_cell_2d == 0 || self.population.particles_per_cell_3d == 0 {
            return Err(LithosError::InvalidConfig("particles per cell must be >= 1".into()));
        }
        Ok(())
    }
}
