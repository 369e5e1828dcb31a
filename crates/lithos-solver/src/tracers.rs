//! Passive tracers.

use lithos_io::TracerSnapshot;
use lithos_mesh::CartesianMesh;
use lithos_types::{LithosError, LithosResult, Scalar};

use crate::strategy::{TracerSet, VelocityField};

/// Massless markers carried by the flow with a midpoint (RK2) step.
///
/// With `escape` set, tracers leaving the domain are dropped; otherwise
/// they are clamped to the domain box.
#[derive(Debug, Clone, PartialEq)]
pub struct PassiveTracers {
    name: String,
    pub positions: Vec<[Scalar; 3]>,
    pub escape: bool,
}

impl PassiveTracers {
    pub fn new(name: impl Into<String>, positions: Vec<[Scalar; 3]>) -> Self {
        Self { name: name.into(), positions, escape: true }
    }

    /// Evenly spaced tracers on the segment `a`-`b`.
    pub fn line(name: impl Into<String>, a: [Scalar; 3], b: [Scalar; 3], count: usize) -> Self {
        let n = count.max(2);
        let positions = (0..n)
            .map(|i| {
                let s = i as Scalar / (n - 1) as Scalar;
                [a[0] + s * (b[0] - a[0]), a[1] + s * (b[1] - a[1]), a[2] + s * (b[2] - a[2])]
            })
            .collect();
        Self::new(name, positions)
    }

    pub fn without_escape(mut self) -> Self {
        self.escape = false;
        self
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// One midpoint step of `p` through `velocity`.
pub fn midpoint_step(p: &[Scalar; 3], velocity: &dyn VelocityField, dt: Scalar) -> [Scalar; 3] {
    let v0 = velocity.velocity_at(p);
    let mid = [p[0] + 0.5 * dt * v0[0], p[1] + 0.5 * dt * v0[1], p[2] + 0.5 * dt * v0[2]];
    let v1 = velocity.velocity_at(&mid);
    [p[0] + dt * v1[0], p[1] + dt * v1[1], p[2] + dt * v1[2]]
}

/// Projects `p` onto the closed domain box.
pub fn clamp_to_domain(p: &mut [Scalar; 3], mesh: &CartesianMesh) {
    for axis in 0..mesh.dim.axes() {
        p[axis] = p[axis].max(mesh.min_coord[axis]).min(mesh.max_coord[axis]);
    }
}

impl TracerSet for PassiveTracers {
    fn name(&self) -> &str {
        &self.name
    }

    fn integrate(&mut self, velocity: &dyn VelocityField, mesh: &CartesianMesh, dt: Scalar) -> LithosResult<()> {
        for p in &mut self.positions {
            *p = midpoint_step(p, velocity, dt);
            if !self.escape {
                clamp_to_domain(p, mesh);
            }
        }
        if self.escape {
            self.positions.retain(|p| mesh.contains(p));
        }
        Ok(())
    }

    fn snapshot(&self, time: Scalar) -> TracerSnapshot {
        TracerSnapshot { name: self.name.clone(), time, positions: self.positions.clone() }
    }

    fn restore(&mut self, snapshot: &TracerSnapshot) -> LithosResult<()> {
        if snapshot.name != self.name {
            return Err(LithosError::Restart(format!(
                "tracer snapshot '{}' loaded into set '{}'",
                snapshot.name, self.name
            )));
        }
        self.positions = snapshot.positions.clone();
        Ok(())
    }
}
