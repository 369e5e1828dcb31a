//! # lithos-solver
//!
//! Rheology composition, timestep selection, state advance and the
//! stepping loop.
//!
//! ## Key Types
//!
//! - [`Model`]: owns the mesh, swarm, materials and collaborators; runs
//!   [`Model::solve`], [`Model::advance`] and [`Model::run_for`]
//! - [`Composer`]: per-particle viscosity, density, heat production and
//!   melt fraction from the material registry
//! - [`PiecewiseMap`]: material-keyed property lookup
//! - [`TimestepBounds`]: candidate timesteps and the selection rule
//! - [`CheckpointScheduler`]: when to write checkpoints
//! - [`StokesSolver`], [`Advector`], [`ThermalSolver`], [`PopulationControl`]:
//!   pluggable collaborators
//! - [`stub`]: reference collaborators used by tests and benchmarks

pub mod advance;
pub mod checkpoint;
pub mod clock;
pub mod composer;
pub mod config;
pub mod hooks;
pub mod model;
pub mod piecewise;
pub mod scheduler;
pub mod solution;
pub mod strategy;
pub mod stub;
pub mod swarm;
pub mod timestep;
pub mod tracers;

pub use clock::ModelClock;
pub use composer::{Composer, ViscosityBreakdown};
pub use config::{AdvectionDiffusion, ModelConfig, PopulationConfig};
pub use hooks::{NoHooks, StepContext, StepHooks};
pub use model::Model;
pub use piecewise::PiecewiseMap;
pub use scheduler::{reached, CheckpointScheduler};
pub use solution::Solution;
pub use strategy::{
    Advector, AtRest, FreeSurface, MeshAdvector, PopulationControl, SolveOptions, SolveReport, StokesProblem,
    StokesSolver, SurfaceProcess, ThermalSolver, ThermalSources, TracerSet, VelocityField, Visugrid,
};
pub use stub::{CellRefill, ConductiveGeotherm, Flow, MidpointAdvector, PrescribedFlow};
pub use swarm::{Remap, Swarm};
pub use timestep::{TimestepBound, TimestepBounds, TimestepInputs};
pub use tracers::PassiveTracers;
