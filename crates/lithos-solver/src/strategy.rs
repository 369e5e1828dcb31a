//! Collaborator seams.
//!
//! The model drives the PDE solves, particle advection, population
//! control and optional surface collaborators through these traits. The
//! stepping loop calls them in a fixed order:
//!
//! ```text
//! stokes.solve(problem, options)?;
//! dt = select(advector.max_dt(..), thermal.max_dt(..), ..);
//! thermal.integrate(..)?; advector.integrate(..)?; population.repopulate(..)?;
//! ```

use lithos_io::{FieldSnapshot, TracerSnapshot};
use lithos_mesh::{per_cell_layout, CartesianMesh};
use lithos_material::MaterialRegistry;
use lithos_mesh::FrictionBoundaries;
use lithos_types::{LithosResult, Scalar};

use crate::composer::Composer;
use crate::config::ModelConfig;
use crate::hooks::StepHooks;
use crate::solution::Solution;
use crate::swarm::{Remap, Swarm};

/// Velocity sampled anywhere in the domain.
pub trait VelocityField {
    fn velocity_at(&self, p: &[Scalar; 3]) -> [Scalar; 3];
}

/// Zero velocity everywhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct AtRest;

impl VelocityField for AtRest {
    fn velocity_at(&self, _p: &[Scalar; 3]) -> [Scalar; 3] {
        [0.0; 3]
    }
}

/// Non-linear iteration bounds for one solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveOptions {
    pub tolerance: Scalar,
    pub min_iterations: u32,
    pub max_iterations: u32,
    /// First solve of the model.
    pub initial: bool,
}

impl SolveOptions {
    pub fn from_config(config: &ModelConfig, initial: bool) -> Self {
        let (tolerance, min_iterations, max_iterations) = config.nonlinear_bounds(initial);
        Self { tolerance, min_iterations, max_iterations, initial }
    }
}

/// Result of a solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveReport {
    /// Number of non-linear iterations performed.
    pub iterations: u32,
    /// Final residual norm.
    pub residual: f64,
    /// Whether the solve reached tolerance.
    pub converged: bool,
}

/// Everything a Stokes collaborator reads and writes during a solve.
///
/// Coefficients come from [`StokesProblem::composer`], which recomposes
/// from the current solution each time it is called.
pub struct StokesProblem<'a> {
    pub(crate) registry: &'a MaterialRegistry,
    pub(crate) config: &'a ModelConfig,
    pub(crate) mesh: &'a CartesianMesh,
    pub(crate) swarm: &'a Swarm,
    pub(crate) friction: Option<&'a FrictionBoundaries>,
    pub(crate) solution: &'a mut Solution,
    pub(crate) solution_exists: &'a mut bool,
    pub(crate) dt: Option<Scalar>,
    pub(crate) hooks: &'a mut dyn StepHooks,
}

impl<'a> StokesProblem<'a> {
    /// Composer over the current solution samples.
    pub fn composer(&self) -> Composer<'_> {
        Composer {
            registry: self.registry,
            config: self.config,
            mesh: self.mesh,
            swarm: self.swarm,
            solution: &*self.solution,
            friction: self.friction,
            solution_exists: *self.solution_exists,
            dt: self.dt,
        }
    }

    pub fn mesh(&self) -> &CartesianMesh {
        self.mesh
    }

    pub fn swarm(&self) -> &Swarm {
        self.swarm
    }

    pub fn config(&self) -> &ModelConfig {
        self.config
    }

    /// Samples written back by the solver.
    pub fn solution_mut(&mut self) -> &mut Solution {
        self.solution
    }

    /// Marks the solution as available and notifies the hooks.
    ///
    /// Call after every non-linear iteration.
    pub fn post_iteration(&mut self, iteration: u32, residual: f64) {
        *self.solution_exists = true;
        self.hooks.post_iteration(iteration, residual);
    }
}

/// Non-linear Stokes solve.
pub trait StokesSolver: Send {
    /// Solves for velocity and pressure and writes particle samples of
    /// pressure and strain rate into the problem's solution.
    fn solve(&mut self, problem: &mut StokesProblem<'_>, options: &SolveOptions) -> LithosResult<SolveReport>;

    /// Velocity of the latest solve.
    fn velocity(&self) -> &dyn VelocityField;

    /// Mesh fields for a checkpoint (e.g. `velocity`, `pressure`).
    fn fields(&self, mesh: &CartesianMesh, time: Scalar) -> Vec<FieldSnapshot>;

    /// Reloads a checkpointed field; `false` if the name is not owned here.
    fn restore_field(&mut self, field: &FieldSnapshot) -> LithosResult<bool>;

    fn name(&self) -> &str;
}

/// Particle advection integrator.
pub trait Advector: Send {
    fn integrate(
        &mut self,
        positions: &mut [[Scalar; 3]],
        velocity: &dyn VelocityField,
        mesh: &CartesianMesh,
        dt: Scalar,
    ) -> LithosResult<()>;

    /// Largest stable step for the current velocity (before the CFL
    /// factor is applied).
    fn max_dt(&self, velocity: &dyn VelocityField, mesh: &CartesianMesh) -> Scalar;

    fn name(&self) -> &str;
}

/// Per-particle coefficients handed to the thermal solver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThermalSources {
    pub positions: Vec<[Scalar; 3]>,
    pub diffusivity: Vec<Scalar>,
    pub heat_production: Vec<Scalar>,
}

/// Advection-diffusion of temperature.
pub trait ThermalSolver: Send {
    fn integrate(
        &mut self,
        sources: &ThermalSources,
        velocity: &dyn VelocityField,
        mesh: &CartesianMesh,
        dt: Scalar,
    ) -> LithosResult<()>;

    /// Largest stable step of the scheme (before the CFL factor).
    fn max_dt(&self, sources: &ThermalSources, velocity: &dyn VelocityField, mesh: &CartesianMesh) -> Scalar;

    /// Temperature at arbitrary positions.
    fn sample(&self, mesh: &CartesianMesh, positions: &[[Scalar; 3]]) -> Vec<Scalar>;

    /// Solves for a steady geotherm; no-op unless overridden.
    fn steady_state(&mut self, sources: &ThermalSources, mesh: &CartesianMesh) -> LithosResult<()> {
        let _ = (sources, mesh);
        Ok(())
    }

    /// Mesh fields for a checkpoint (`temperature`).
    fn fields(&self, time: Scalar) -> Vec<FieldSnapshot>;

    fn restore_field(&mut self, field: &FieldSnapshot) -> LithosResult<bool>;

    fn name(&self) -> &str;
}

/// Particle container operations: initial layout, ownership and
/// population control.
pub trait PopulationControl: Send {
    /// Initial particle positions.
    fn populate(&self, mesh: &CartesianMesh, per_cell: usize) -> Vec<[Scalar; 3]> {
        per_cell_layout(mesh, per_cell)
    }

    /// Reassigns particles to elements after a move; `None` if nothing
    /// changes.
    fn update_owners(&mut self, positions: &[[Scalar; 3]], mesh: &CartesianMesh) -> LithosResult<Option<Remap>>;

    /// Splits and merges particles to keep the per-cell count healthy.
    fn repopulate(&mut self, positions: &[[Scalar; 3]], mesh: &CartesianMesh) -> LithosResult<Option<Remap>>;

    fn name(&self) -> &str;
}

/// Moves mesh nodes with the flow.
pub trait MeshAdvector: Send {
    fn advect_mesh(&mut self, mesh: &mut CartesianMesh, velocity: &dyn VelocityField, dt: Scalar) -> LithosResult<()>;
}

/// Updates the top surface of the mesh.
pub trait FreeSurface: Send {
    fn solve(&mut self, mesh: &mut CartesianMesh, velocity: &dyn VelocityField, dt: Scalar) -> LithosResult<()>;
}

/// Erosion / sedimentation coupling.
pub trait SurfaceProcess: Send {
    fn solve(&mut self, swarm: &mut Swarm, dt: Scalar) -> LithosResult<()>;

    /// Clock of the coupled process, if it keeps one; checked on restart.
    fn model_time(&self) -> Option<Scalar> {
        None
    }
}

/// Visualisation grid carried with the flow.
pub trait Visugrid: Send {
    fn advect(&mut self, velocity: &dyn VelocityField, dt: Scalar) -> LithosResult<()>;
}

/// A named set of passive tracers.
pub trait TracerSet: Send {
    fn name(&self) -> &str;

    fn integrate(&mut self, velocity: &dyn VelocityField, mesh: &CartesianMesh, dt: Scalar) -> LithosResult<()>;

    fn snapshot(&self, time: Scalar) -> TracerSnapshot;

    fn restore(&mut self, snapshot: &TracerSnapshot) -> LithosResult<()>;
}
