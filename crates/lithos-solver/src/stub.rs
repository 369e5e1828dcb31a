//! Reference collaborators.
//!
//! Small stand-ins that implement the collaborator traits without a real
//! finite-element solve. They exercise the whole stepping loop (solve,
//! timestep, advance, checkpoint, restart) and serve as the baseline for
//! benchmark scenarios:
//!
//! - [`PrescribedFlow`]: analytic velocity field with optional lithostatic
//!   pressure; iterates the composed viscosity to mimic a non-linear solve.
//! - [`MidpointAdvector`]: explicit RK2 particle advection.
//! - [`CellRefill`]: drops escaped particles, refills empty cells.
//! - [`ConductiveGeotherm`]: explicit nodal diffusion with fixed top and
//!   bottom temperatures.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use lithos_io::FieldSnapshot;
use lithos_mesh::{per_cell_layout, CartesianMesh};
use lithos_types::{Dimension, LithosError, LithosResult, Scalar, SymTensor};

use crate::strategy::{
    Advector, PopulationControl, SolveOptions, SolveReport, StokesProblem, StokesSolver, ThermalSolver,
    ThermalSources, VelocityField,
};
use crate::swarm::Remap;
use crate::tracers::{clamp_to_domain, midpoint_step};

/// Analytic flow.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Flow {
    /// Constant velocity.
    Uniform { velocity: [Scalar; 3] },
    /// `vx = rate * (y - y0)`.
    SimpleShear { rate: Scalar, origin: Scalar },
    /// `vx = rate (x - cx)`, `vy = -rate (y - cy)`.
    PureShear { rate: Scalar, centre: [Scalar; 3] },
    /// Rotation about `centre` in the x-y plane.
    RigidRotation { omega: Scalar, centre: [Scalar; 3] },
}

impl Flow {
    /// Constant strain-rate tensor of the flow.
    pub fn strain_rate(&self, dim: Dimension) -> SymTensor {
        match *self {
            Flow::Uniform { .. } | Flow::RigidRotation { .. } => SymTensor::ZERO,
            Flow::SimpleShear { rate, .. } => match dim {
                Dimension::Two => SymTensor::new_2d(0.0, 0.0, 0.5 * rate),
                Dimension::Three => SymTensor::new_3d(0.0, 0.0, 0.0, 0.5 * rate, 0.0, 0.0),
            },
            Flow::PureShear { rate, .. } => match dim {
                Dimension::Two => SymTensor::new_2d(rate, -rate, 0.0),
                Dimension::Three => SymTensor::new_3d(rate, -rate, 0.0, 0.0, 0.0, 0.0),
            },
        }
    }
}

impl VelocityField for Flow {
    fn velocity_at(&self, p: &[Scalar; 3]) -> [Scalar; 3] {
        match *self {
            Flow::Uniform { velocity } => velocity,
            Flow::SimpleShear { rate, origin } => [rate * (p[1] - origin), 0.0, 0.0],
            Flow::PureShear { rate, centre } => [rate * (p[0] - centre[0]), -rate * (p[1] - centre[1]), 0.0],
            Flow::RigidRotation { omega, centre } => {
                [-omega * (p[1] - centre[1]), omega * (p[0] - centre[0]), 0.0]
            }
        }
    }
}

// ─── Stokes stand-in ──────────────────────────────────────────

/// Stokes stand-in with a prescribed velocity field.
///
/// Each solve writes the flow's strain rate (and, if enabled, the
/// lithostatic pressure `rho g depth`) into the particle samples, then
/// iterates the composed viscosity until its relative change drops below
/// the tolerance.
#[derive(Debug, Clone)]
pub struct PrescribedFlow {
    pub flow: Flow,
    pub lithostatic: bool,
    nodal_pressure: Vec<Scalar>,
}

impl PrescribedFlow {
    pub fn new(flow: Flow) -> Self {
        Self { flow, lithostatic: false, nodal_pressure: Vec::new() }
    }

    /// Derives pressure from the composed density.
    pub fn with_lithostatic_pressure(mut self) -> Self {
        self.lithostatic = true;
        self
    }
}

fn depth(mesh: &CartesianMesh, p: &[Scalar; 3]) -> Scalar {
    let up = mesh.dim.axes() - 1;
    (mesh.max_coord[up] - p[up]).max(0.0)
}

impl StokesSolver for PrescribedFlow {
    fn solve(&mut self, problem: &mut StokesProblem<'_>, options: &SolveOptions) -> LithosResult<SolveReport> {
        let start = Instant::now();
        let dim = problem.swarm().dim;
        let gravity = problem.config().gravity;
        let strain_rate = self.flow.strain_rate(dim);

        let pressure: Vec<Scalar> = if self.lithostatic {
            let density = problem.composer().density()?;
            let mesh = problem.mesh();
            let mean = density.iter().sum::<Scalar>() / density.len().max(1) as Scalar;
            self.nodal_pressure = (0..mesh.node_count()).map(|i| mean * gravity * depth(mesh, &mesh.node(i))).collect();
            problem.swarm().positions.iter().zip(&density).map(|(p, rho)| rho * gravity * depth(mesh, p)).collect()
        } else {
            self.nodal_pressure = vec![0.0; problem.mesh().node_count()];
            vec![0.0; problem.swarm().len()]
        };
        {
            let solution = problem.solution_mut();
            solution.pressure = pressure;
            solution.strain_rate = vec![strain_rate; solution.pressure.len()];
        }

        let mut previous: Option<Scalar> = None;
        let mut residual = 1.0;
        let mut iterations = 0;
        while iterations < options.max_iterations.max(1) {
            iterations += 1;
            let eta = problem.composer().viscosity()?;
            let total: Scalar = eta.iter().map(|v| v.ln()).sum();
            residual = match previous {
                Some(prev) if prev != 0.0 => ((total - prev) / prev).abs(),
                Some(_) => total.abs(),
                None => 1.0,
            };
            previous = Some(total);
            problem.post_iteration(iterations, residual);
            if iterations >= options.min_iterations && residual < options.tolerance {
                break;
            }
        }

        tracing::trace!(iterations, residual, elapsed = start.elapsed().as_secs_f64(), "prescribed flow solve");
        Ok(SolveReport { iterations, residual, converged: residual < options.tolerance })
    }

    fn velocity(&self) -> &dyn VelocityField {
        &self.flow
    }

    fn fields(&self, mesh: &CartesianMesh, time: Scalar) -> Vec<FieldSnapshot> {
        let axes = mesh.dim.axes();
        let velocity: Vec<Scalar> =
            (0..mesh.node_count()).flat_map(|i| self.flow.velocity_at(&mesh.node(i))[..axes].to_vec()).collect();
        let pressure =
            if self.nodal_pressure.len() == mesh.node_count() { self.nodal_pressure.clone() } else { vec![0.0; mesh.node_count()] };
        vec![
            FieldSnapshot { name: "velocity".into(), time, components: axes, values: velocity },
            FieldSnapshot::scalar("pressure", time, pressure),
        ]
    }

    fn restore_field(&mut self, field: &FieldSnapshot) -> LithosResult<bool> {
        match field.name.as_str() {
            // Prescribed; nothing to reload.
            "velocity" => Ok(true),
            "pressure" => {
                self.nodal_pressure = field.values.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "prescribed-flow"
    }
}

// ─── Advection ────────────────────────────────────────────────

/// Explicit midpoint (RK2) particle advection.
#[derive(Debug, Clone, Copy, Default)]
pub struct MidpointAdvector;

impl Advector for MidpointAdvector {
    fn integrate(
        &mut self,
        positions: &mut [[Scalar; 3]],
        velocity: &dyn VelocityField,
        _mesh: &CartesianMesh,
        dt: Scalar,
    ) -> LithosResult<()> {
        for p in positions.iter_mut() {
            *p = midpoint_step(p, velocity, dt);
        }
        Ok(())
    }

    /// Smallest element edge over the largest nodal speed.
    fn max_dt(&self, velocity: &dyn VelocityField, mesh: &CartesianMesh) -> Scalar {
        let vmax = (0..mesh.node_count())
            .map(|i| {
                let v = velocity.velocity_at(&mesh.node(i));
                (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
            })
            .fold(0.0, Scalar::max);
        if vmax > 0.0 {
            mesh.min_spacing() / vmax
        } else {
            Scalar::INFINITY
        }
    }

    fn name(&self) -> &str {
        "midpoint"
    }
}

// ─── Population control ───────────────────────────────────────

/// Removes escaped particles and refills cells that fall below
/// `min_per_cell` with copies of the nearest particle.
#[derive(Debug, Clone, Copy)]
pub struct CellRefill {
    pub min_per_cell: usize,
    /// Clamp escaped particles back into the domain instead of dropping.
    pub clamp: bool,
}

impl Default for CellRefill {
    fn default() -> Self {
        Self { min_per_cell: 1, clamp: false }
    }
}

impl CellRefill {
    pub fn new(min_per_cell: usize) -> Self {
        Self { min_per_cell, ..Default::default() }
    }

    pub fn clamped(mut self) -> Self {
        self.clamp = true;
        self
    }
}

fn nearest(positions: &[[Scalar; 3]], p: &[Scalar; 3]) -> Option<usize> {
    positions
        .iter()
        .enumerate()
        .map(|(i, q)| (i, (q[0] - p[0]).powi(2) + (q[1] - p[1]).powi(2) + (q[2] - p[2]).powi(2)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

impl PopulationControl for CellRefill {
    fn update_owners(&mut self, positions: &[[Scalar; 3]], mesh: &CartesianMesh) -> LithosResult<Option<Remap>> {
        if positions.iter().all(|p| mesh.contains(p)) {
            return Ok(None);
        }
        if self.clamp {
            let clamped = positions
                .iter()
                .map(|p| {
                    let mut q = *p;
                    clamp_to_domain(&mut q, mesh);
                    q
                })
                .collect();
            return Ok(Some(Remap { sources: (0..positions.len()).collect(), positions: clamped }));
        }
        Ok(Some(Remap::retain(positions, |p| mesh.contains(p))))
    }

    fn repopulate(&mut self, positions: &[[Scalar; 3]], mesh: &CartesianMesh) -> LithosResult<Option<Remap>> {
        if self.min_per_cell == 0 {
            return Ok(None);
        }
        let mut counts = vec![0usize; mesh.element_count()];
        for p in positions {
            if let Some(e) = mesh.element_containing(p) {
                counts[e] += 1;
            }
        }
        if counts.iter().all(|&c| c >= self.min_per_cell) {
            return Ok(None);
        }
        if positions.is_empty() {
            return Err(LithosError::InvariantViolation("cannot refill an empty swarm".into()));
        }

        let mut remap = Remap { sources: (0..positions.len()).collect(), positions: positions.to_vec() };
        let layout = per_cell_layout(mesh, self.min_per_cell);
        for (e, &count) in counts.iter().enumerate() {
            let missing = self.min_per_cell.saturating_sub(count);
            let seeds = &layout[e * self.min_per_cell..(e + 1) * self.min_per_cell];
            for p in seeds.iter().take(missing) {
                if let Some(src) = nearest(positions, p) {
                    remap.sources.push(src);
                    remap.positions.push(*p);
                }
            }
        }
        Ok(Some(remap))
    }

    fn name(&self) -> &str {
        "cell-refill"
    }
}

// ─── Thermal stand-in ─────────────────────────────────────────

/// Explicit nodal diffusion between fixed top and bottom temperatures.
///
/// Uses the mean particle diffusivity and heat production; advection is
/// not modelled. The steady state is the linear conductive profile.
#[derive(Debug, Clone, PartialEq)]
pub struct ConductiveGeotherm {
    pub top_temperature: Scalar,
    pub bottom_temperature: Scalar,
    pub nodal: Vec<Scalar>,
}

impl ConductiveGeotherm {
    /// Linear profile on `mesh`.
    pub fn new(mesh: &CartesianMesh, top_temperature: Scalar, bottom_temperature: Scalar) -> Self {
        let mut g = Self { top_temperature, bottom_temperature, nodal: Vec::new() };
        g.nodal = g.linear_profile(mesh);
        g
    }

    fn linear_profile(&self, mesh: &CartesianMesh) -> Vec<Scalar> {
        let up = mesh.dim.axes() - 1;
        let height = mesh.max_coord[up] - mesh.min_coord[up];
        (0..mesh.node_count())
            .map(|i| {
                let s = (mesh.node(i)[up] - mesh.min_coord[up]) / height;
                self.bottom_temperature + s * (self.top_temperature - self.bottom_temperature)
            })
            .collect()
    }

    fn mean(values: &[Scalar]) -> Scalar {
        if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<Scalar>() / values.len() as Scalar
        }
    }
}

impl ThermalSolver for ConductiveGeotherm {
    fn integrate(
        &mut self,
        sources: &ThermalSources,
        _velocity: &dyn VelocityField,
        mesh: &CartesianMesh,
        dt: Scalar,
    ) -> LithosResult<()> {
        if self.nodal.len() != mesh.node_count() {
            return Err(LithosError::InvariantViolation(format!(
                "geotherm holds {} nodes, mesh has {}",
                self.nodal.len(),
                mesh.node_count()
            )));
        }
        let kappa = Self::mean(&sources.diffusivity);
        let heating = Self::mean(&sources.heat_production);
        let n = mesh.nodes_per_axis();
        let h = mesh.spacing();
        let axes = mesh.dim.axes();
        let up = axes - 1;
        let stride = [1, n[0], n[0] * n[1]];

        let old = self.nodal.clone();
        for k in 0..n[2] {
            for j in 0..n[1] {
                for i in 0..n[0] {
                    let idx = [i, j, k];
                    if idx[up] == 0 || idx[up] == n[up] - 1 {
                        continue;
                    }
                    let node = i + stride[1] * j + stride[2] * k;
                    let mut lap = 0.0;
                    for a in 0..axes {
                        // Insulated side walls: mirror the missing neighbour.
                        let lo = if idx[a] > 0 { node - stride[a] } else { node + stride[a] };
                        let hi = if idx[a] + 1 < n[a] { node + stride[a] } else { node - stride[a] };
                        lap += (old[lo] - 2.0 * old[node] + old[hi]) / (h[a] * h[a]);
                    }
                    self.nodal[node] = old[node] + dt * (kappa * lap + heating);
                }
            }
        }
        Ok(())
    }

    fn max_dt(&self, sources: &ThermalSources, _velocity: &dyn VelocityField, mesh: &CartesianMesh) -> Scalar {
        let kappa = Self::mean(&sources.diffusivity);
        if kappa > 0.0 {
            let h = mesh.min_spacing();
            h * h / (2.0 * mesh.dim.axes() as Scalar * kappa)
        } else {
            Scalar::INFINITY
        }
    }

    /// Multilinear interpolation of the nodal values.
    fn sample(&self, mesh: &CartesianMesh, positions: &[[Scalar; 3]]) -> Vec<Scalar> {
        let n = mesh.nodes_per_axis();
        let h = mesh.spacing();
        let axes = mesh.dim.axes();
        positions
            .iter()
            .map(|p| {
                let mut q = *p;
                clamp_to_domain(&mut q, mesh);
                let Some(e) = mesh.element_containing(&q) else {
                    return 0.0;
                };
                let o = mesh.element_origin(e);
                let mut base = [0usize; 3];
                let mut w = [0.0; 3];
                for a in 0..axes {
                    base[a] = ((o[a] - mesh.min_coord[a]) / h[a]).round() as usize;
                    w[a] = ((q[a] - o[a]) / h[a]).clamp(0.0, 1.0);
                }
                let corners = 1usize << axes;
                let mut value = 0.0;
                for c in 0..corners {
                    let mut idx = base;
                    let mut weight = 1.0;
                    for a in 0..axes {
                        if c >> a & 1 == 1 {
                            idx[a] += 1;
                            weight *= w[a];
                        } else {
                            weight *= 1.0 - w[a];
                        }
                    }
                    value += weight * self.nodal[idx[0] + n[0] * (idx[1] + n[1] * idx[2])];
                }
                value
            })
            .collect()
    }

    fn steady_state(&mut self, _sources: &ThermalSources, mesh: &CartesianMesh) -> LithosResult<()> {
        self.nodal = self.linear_profile(mesh);
        Ok(())
    }

    fn fields(&self, time: Scalar) -> Vec<FieldSnapshot> {
        vec![FieldSnapshot::scalar("temperature", time, self.nodal.clone())]
    }

    fn restore_field(&mut self, field: &FieldSnapshot) -> LithosResult<bool> {
        if field.name != "temperature" {
            return Ok(false);
        }
        field.check_len(self.nodal.len())?;
        self.nodal = field.values.clone();
        Ok(true)
    }

    fn name(&self) -> &str {
        "conductive-geotherm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mesh() -> CartesianMesh {
        CartesianMesh::new_2d([0.0, 0.0], [4.0, 2.0], [4, 2]).unwrap()
    }

    #[test]
    fn simple_shear_strain_rate_invariant() {
        let flow = Flow::SimpleShear { rate: 2e-14, origin: 0.0 };
        let d = flow.strain_rate(Dimension::Two);
        assert!((d.second_invariant(Dimension::Two) - 1e-14).abs() < 1e-28);
    }

    #[test]
    fn advector_bound_is_cell_crossing_time() {
        let m = mesh();
        let flow = Flow::Uniform { velocity: [2.0, 0.0, 0.0] };
        assert!((MidpointAdvector.max_dt(&flow, &m) - 0.5).abs() < 1e-12);
        let still = Flow::Uniform { velocity: [0.0; 3] };
        assert!(MidpointAdvector.max_dt(&still, &m).is_infinite());
    }

    #[test]
    fn refill_fills_empty_cells() {
        let m = mesh();
        let positions = vec![[0.5, 0.5, 0.0]];
        let remap = CellRefill::new(1).repopulate(&positions, &m).unwrap().unwrap();
        assert_eq!(remap.len(), m.element_count());
        assert!(remap.sources.iter().all(|&s| s == 0));
    }

    #[test]
    fn escaped_particles_are_dropped_or_clamped() {
        let m = mesh();
        let positions = vec![[0.5, 0.5, 0.0], [5.0, 0.5, 0.0]];
        let dropped = CellRefill::default().update_owners(&positions, &m).unwrap().unwrap();
        assert_eq!(dropped.sources, vec![0]);
        let clamped = CellRefill::default().clamped().update_owners(&positions, &m).unwrap().unwrap();
        assert_eq!(clamped.positions[1], [4.0, 0.5, 0.0]);
    }

    #[test]
    fn geotherm_samples_linear_profile() {
        let m = mesh();
        let g = ConductiveGeotherm::new(&m, 0.0, 100.0);
        let t = g.sample(&m, &[[1.3, 1.5, 0.0], [0.0, 2.0, 0.0]]);
        assert!((t[0] - 25.0).abs() < 1e-9);
        assert!(t[1].abs() < 1e-9);
    }

    #[test]
    fn linear_profile_is_steady() {
        let m = mesh();
        let mut g = ConductiveGeotherm::new(&m, 0.0, 100.0);
        let before = g.nodal.clone();
        let sources = ThermalSources { positions: vec![], diffusivity: vec![1.0], heat_production: vec![0.0] };
        let dt = g.max_dt(&sources, &Flow::Uniform { velocity: [0.0; 3] }, &m);
        g.integrate(&sources, &Flow::Uniform { velocity: [0.0; 3] }, &m, dt).unwrap();
        for (a, b) in before.iter().zip(&g.nodal) {
            assert!((a - b).abs() < 1e-9);
        }
    }
}
