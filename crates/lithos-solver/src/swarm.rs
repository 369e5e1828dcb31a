//! Particle swarm: SoA buffers for the Lagrangian history fields.
//!
//! Every array has one entry per particle, in the same order:
//! ```text
//! positions:       [p0, p1, p2, ...]
//! material:        [m0, m1, m2, ...]
//! plastic_strain:  [e0, e1, e2, ...]
//! ...
//! ```
//! Population control and advection reorder, drop or duplicate particles
//! through a [`Remap`], which keeps the arrays aligned.

use lithos_io::{FieldSnapshot, SwarmSnapshot};
use lithos_types::{Dimension, LithosError, LithosResult, MaterialId, Scalar, SymTensor};

/// Swarm variable names used in checkpoints.
pub const MATERIAL_FIELD: &str = "material";
pub const PLASTIC_STRAIN_FIELD: &str = "plastic_strain";
pub const MELT_FIELD: &str = "melt";
pub const PREVIOUS_STRESS_FIELD: &str = "previous_stress";
pub const PARTICLE_TIME_FIELD: &str = "particle_time";

/// New particle layout after repopulation or ownership update.
///
/// Particle `i` of the new swarm sits at `positions[i]` and inherits the
/// history of old particle `sources[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Remap {
    pub sources: Vec<usize>,
    pub positions: Vec<[Scalar; 3]>,
}

impl Remap {
    /// Keeps the particles for which `keep` holds, in order.
    pub fn retain(positions: &[[Scalar; 3]], keep: impl Fn(&[Scalar; 3]) -> bool) -> Self {
        let sources: Vec<usize> = (0..positions.len()).filter(|&i| keep(&positions[i])).collect();
        let positions = sources.iter().map(|&i| positions[i]).collect();
        Self { sources, positions }
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// True when the remap leaves the swarm untouched.
    pub fn is_identity(&self, old_positions: &[[Scalar; 3]]) -> bool {
        self.sources.len() == old_positions.len()
            && self.sources.iter().enumerate().all(|(i, &s)| i == s)
            && self.positions == old_positions
    }
}

/// Lagrangian particle swarm.
#[derive(Debug, Clone, PartialEq)]
pub struct Swarm {
    pub dim: Dimension,
    pub positions: Vec<[Scalar; 3]>,
    pub material: Vec<MaterialId>,
    pub plastic_strain: Vec<Scalar>,
    pub melt: Vec<Scalar>,
    pub previous_stress: Vec<SymTensor>,
    /// Model time each particle has been carried for.
    pub time: Vec<Scalar>,
}

impl Swarm {
    /// Swarm at `positions`, all background material with zeroed history.
    pub fn new(dim: Dimension, positions: Vec<[Scalar; 3]>) -> Self {
        let n = positions.len();
        Self {
            dim,
            positions,
            material: vec![MaterialId::BACKGROUND; n],
            plastic_strain: vec![0.0; n],
            melt: vec![0.0; n],
            previous_stress: vec![SymTensor::ZERO; n],
            time: vec![0.0; n],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Rebuilds every array from a remap.
    pub fn apply_remap(&mut self, remap: &Remap) -> LithosResult<()> {
        let n = self.len();
        if remap.sources.len() != remap.positions.len() {
            return Err(LithosError::InvariantViolation(format!(
                "remap has {} sources for {} positions",
                remap.sources.len(),
                remap.positions.len()
            )));
        }
        if let Some(&bad) = remap.sources.iter().find(|&&s| s >= n) {
            return Err(LithosError::InvariantViolation(format!("remap source {bad} out of range ({n} particles)")));
        }
        let src = &remap.sources;
        self.material = src.iter().map(|&s| self.material[s]).collect();
        self.plastic_strain = src.iter().map(|&s| self.plastic_strain[s]).collect();
        self.melt = src.iter().map(|&s| self.melt[s]).collect();
        self.previous_stress = src.iter().map(|&s| self.previous_stress[s]).collect();
        self.time = src.iter().map(|&s| self.time[s]).collect();
        self.positions = remap.positions.clone();
        Ok(())
    }

    /// Particle count per material, indexed by material id.
    pub fn material_census(&self) -> Vec<(MaterialId, usize)> {
        let mut counts: Vec<(MaterialId, usize)> = Vec::new();
        for &m in &self.material {
            match counts.iter_mut().find(|(id, _)| *id == m) {
                Some((_, c)) => *c += 1,
                None => counts.push((m, 1)),
            }
        }
        counts.sort_by_key(|(id, _)| *id);
        counts
    }

    /// Position payload for a checkpoint.
    pub fn snapshot(&self, time: Scalar, step: u64) -> SwarmSnapshot {
        SwarmSnapshot { time, step, dim: self.dim, positions: self.positions.clone() }
    }

    /// History variables as checkpoint fields.
    pub fn variables(&self, time: Scalar) -> Vec<FieldSnapshot> {
        let comps = self.dim.components();
        let stress: Vec<Scalar> =
            self.previous_stress.iter().flat_map(|s| s.components(self.dim).to_vec()).collect();
        vec![
            FieldSnapshot::scalar(MATERIAL_FIELD, time, self.material.iter().map(|m| m.0 as Scalar).collect()),
            FieldSnapshot::scalar(PLASTIC_STRAIN_FIELD, time, self.plastic_strain.clone()),
            FieldSnapshot::scalar(MELT_FIELD, time, self.melt.clone()),
            FieldSnapshot { name: PREVIOUS_STRESS_FIELD.into(), time, components: comps, values: stress },
            FieldSnapshot::scalar(PARTICLE_TIME_FIELD, time, self.time.clone()),
        ]
    }

    /// Swarm rebuilt from a checkpoint payload; variables start zeroed.
    pub fn from_snapshot(snapshot: &SwarmSnapshot) -> Self {
        Self::new(snapshot.dim, snapshot.positions.clone())
    }

    /// Restores one history variable from a checkpoint field.
    ///
    /// Returns `false` for names that are not swarm variables.
    pub fn restore_variable(&mut self, field: &FieldSnapshot) -> LithosResult<bool> {
        let n = self.len();
        match field.name.as_str() {
            MATERIAL_FIELD => {
                field.check_len(n)?;
                self.material = field.values.iter().map(|&v| MaterialId(v.round().max(0.0) as u32)).collect();
            }
            PLASTIC_STRAIN_FIELD => {
                field.check_len(n)?;
                self.plastic_strain = field.values.clone();
            }
            MELT_FIELD => {
                field.check_len(n)?;
                self.melt = field.values.clone();
            }
            PARTICLE_TIME_FIELD => {
                field.check_len(n)?;
                self.time = field.values.clone();
            }
            PREVIOUS_STRESS_FIELD => {
                field.check_len(n)?;
                let comps = field.components;
                if comps != self.dim.components() {
                    return Err(LithosError::Restart(format!(
                        "previous stress has {comps} components, expected {}",
                        self.dim.components()
                    )));
                }
                self.previous_stress = field
                    .values
                    .chunks_exact(comps)
                    .map(|c| {
                        let mut t = [0.0; 6];
                        t[..comps].copy_from_slice(c);
                        SymTensor(t)
                    })
                    .collect();
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Checks that all arrays have the particle count.
    pub fn validate(&self) -> LithosResult<()> {
        let n = self.len();
        let lens = [
            self.material.len(),
            self.plastic_strain.len(),
            self.melt.len(),
            self.previous_stress.len(),
            self.time.len(),
        ];
        if lens.iter().any(|&l| l != n) {
            return Err(LithosError::InvariantViolation(format!("swarm arrays {lens:?} do not match {n} particles")));
        }
        Ok(())
    }
}
