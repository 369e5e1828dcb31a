//! Step hooks for user logic inside the stepping loop.
//!
//! Hooks are called at fixed points of every iteration and may edit the
//! swarm (e.g. re-seeding a boundary material).

use lithos_mesh::CartesianMesh;
use lithos_types::LithosResult;

use crate::clock::ModelClock;
use crate::swarm::Swarm;

/// State exposed to hooks.
pub struct StepContext<'a> {
    pub clock: &'a ModelClock,
    pub mesh: &'a CartesianMesh,
    pub swarm: &'a mut Swarm,
}

/// User callbacks around the solve.
///
/// # Lifecycle
///
/// ```text
/// for each iteration:
///   hooks.pre_solve(...)
///   for each non-linear iteration:
///     hooks.post_iteration(...)
///   hooks.post_step(...)
/// ```
pub trait StepHooks: Send {
    /// Called before the solve of every iteration.
    fn pre_solve(&mut self, ctx: &mut StepContext<'_>) -> LithosResult<()> {
        let _ = ctx;
        Ok(())
    }

    /// Called by the Stokes collaborator after each non-linear iteration.
    fn post_iteration(&mut self, iteration: u32, residual: f64) {
        let _ = (iteration, residual);
    }

    /// Called after the checkpoint decision of every iteration.
    fn post_step(&mut self, ctx: &mut StepContext<'_>) -> LithosResult<()> {
        let _ = ctx;
        Ok(())
    }

    fn name(&self) -> &str;
}

/// Hooks that do nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl StepHooks for NoHooks {
    fn name(&self) -> &str {
        "none"
    }
}
