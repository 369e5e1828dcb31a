//! State advancer.
//!
//! Mutates the per-particle history fields across one timestep. The order
//! is fixed because later stages read fields written by earlier ones:
//!
//! ```text
//!  1. heal plastic strain              7. passive tracers
//!  2. accumulate plastic strain        8. population control
//!  3. melt fraction                    9. surface processes
//!  4. temperature                     10. particle time
//!  5. particles / mesh / free surface 11. visualisation grid
//!  6. stress history                  12. phase changes
//! ```

use lithos_material::Capability;
use lithos_types::{LithosError, LithosResult, Scalar};

use crate::model::Model;

impl Model {
    /// Advances the particle state by `dt`.
    pub fn advance(&mut self, dt: Scalar) -> LithosResult<()> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(LithosError::InvariantViolation(format!("cannot advance by dt = {dt}")));
        }
        self.heal_plastic_strain(dt)?;
        self.accumulate_plastic_strain(dt)?;
        self.update_melt_fraction()?;
        self.advance_temperature(dt)?;
        self.advance_geometry(dt)?;
        self.update_stress_history(dt)?;
        self.advance_tracers(dt)?;
        self.control_population()?;
        self.run_surface_processes(dt)?;
        for t in &mut self.swarm.time {
            *t += dt;
        }
        self.advect_visugrid(dt)?;
        self.apply_phase_changes()
    }

    /// Subtracts `rate * dt` where a healing rate is declared, floored at 0.
    pub(crate) fn heal_plastic_strain(&mut self, dt: Scalar) -> LithosResult<()> {
        let rates = self.composer().healing_rate()?;
        if let Some(rates) = rates {
            for (e, r) in self.swarm.plastic_strain.iter_mut().zip(rates) {
                *e = (*e - r * dt).max(0.0);
            }
        }
        Ok(())
    }

    /// Adds `yielding * dt`; the diagnostic is the strain-rate invariant
    /// where plasticity governs and zero elsewhere.
    pub(crate) fn accumulate_plastic_strain(&mut self, dt: Scalar) -> LithosResult<()> {
        let yielding = self.composer().yielding()?;
        for (e, y) in self.swarm.plastic_strain.iter_mut().zip(yielding) {
            *e += y * dt;
        }
        Ok(())
    }

    pub(crate) fn update_melt_fraction(&mut self) -> LithosResult<()> {
        if !self.registry.any(Capability::Melt) {
            return Ok(());
        }
        self.swarm.melt = self.composer().melt_fraction()?;
        Ok(())
    }

    fn advance_temperature(&mut self, dt: Scalar) -> LithosResult<()> {
        if self.thermal.is_none() {
            return Ok(());
        }
        let sources = self.thermal_sources()?;
        let velocity = self.stokes.velocity();
        if let Some(thermal) = self.thermal.as_mut() {
            thermal.integrate(&sources, velocity, &self.mesh, dt)?;
        }
        self.refresh_temperature();
        Ok(())
    }

    /// Moves particles, then the free surface or the mesh.
    ///
    /// With a free surface, ownership is reconciled after the surface
    /// update; otherwise right after particle advection.
    fn advance_geometry(&mut self, dt: Scalar) -> LithosResult<()> {
        let velocity = self.stokes.velocity();
        self.advector.integrate(&mut self.swarm.positions, velocity, &self.mesh, dt)?;
        if self.mesh_advector.is_none() {
            if let Some(surface) = self.free_surface.as_mut() {
                surface.solve(&mut self.mesh, velocity, dt)?;
            }
        }
        self.update_owners()?;
        if let Some(mesh_advector) = self.mesh_advector.as_mut() {
            mesh_advector.advect_mesh(&mut self.mesh, self.stokes.velocity(), dt)?;
        }
        self.refresh_temperature();
        Ok(())
    }

    /// Relaxes the stress history towards the current total stress with
    /// `phi = dt / min(dt_e)`.
    pub(crate) fn update_stress_history(&mut self, dt: Scalar) -> LithosResult<()> {
        let composer = self.composer();
        let Some(dt_e) = composer.min_observation_time() else {
            return Ok(());
        };
        let phi = dt / dt_e;
        let stress = composer.stress()?;
        for (prev, current) in self.swarm.previous_stress.iter_mut().zip(&stress) {
            *prev = prev.relax_towards(current, phi);
        }
        Ok(())
    }

    fn advance_tracers(&mut self, dt: Scalar) -> LithosResult<()> {
        let velocity = self.stokes.velocity();
        for tracers in self.tracers.iter_mut() {
            tracers.integrate(velocity, &self.mesh, dt)?;
        }
        Ok(())
    }

    fn control_population(&mut self) -> LithosResult<()> {
        if let Some(remap) = self.population.repopulate(&self.swarm.positions, &self.mesh)? {
            tracing::debug!(before = self.swarm.len(), after = remap.len(), "swarm repopulated");
            self.apply_remap(&remap)?;
        }
        self.update_owners()
    }

    fn run_surface_processes(&mut self, dt: Scalar) -> LithosResult<()> {
        if let Some(process) = self.surface_process.as_mut() {
            process.solve(&mut self.swarm, dt)?;
            self.swarm.validate()?;
            self.solution.check_len(self.swarm.len())?;
        }
        Ok(())
    }

    fn advect_visugrid(&mut self, dt: Scalar) -> LithosResult<()> {
        if let Some(grid) = self.visugrid.as_mut() {
            grid.advect(self.stokes.velocity(), dt)?;
        }
        Ok(())
    }

    /// Reassigns particles whose phase-change trigger fires.
    ///
    /// Rules run in registry then declaration order and each sees the
    /// material field as left by the previous rule, so a particle may
    /// cascade through several materials in one call.
    pub(crate) fn apply_phase_changes(&mut self) -> LithosResult<()> {
        if !self.registry.any(Capability::PhaseChange) {
            return Ok(());
        }
        let dim = self.swarm.dim;
        let mut changed = 0usize;
        for material in self.registry.iter().filter(|m| m.has(Capability::PhaseChange)) {
            for change in &material.phase_changes {
                if !self.registry.contains(change.result) {
                    return Err(LithosError::MaterialNotFound(change.result));
                }
                let composer = self.composer();
                let fires: Vec<bool> =
                    (0..self.swarm.len()).map(|i| change.trigger.fires(&composer.point(i), dim)).collect();
                for (slot, fire) in self.swarm.material.iter_mut().zip(fires) {
                    if fire && *slot == material.index {
                        *slot = change.result;
                        changed += 1;
                    }
                }
            }
        }
        if changed > 0 {
            tracing::debug!(changed, "phase changes applied");
        }
        Ok(())
    }
}
