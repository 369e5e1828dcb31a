//! Checkpoint payloads.
//!
//! Every payload is serialized with `bincode` and carries the model time
//! at which it was taken.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use lithos_mesh::CartesianMesh;
use lithos_types::{Dimension, LithosError, LithosResult, Scalar};

/// Binary encoding shared by all payloads.
pub trait Snapshot: Serialize + DeserializeOwned {
    fn to_bytes(&self) -> LithosResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| LithosError::Serialization(format!("snapshot encode failed: {e}")))
    }

    fn from_bytes(data: &[u8]) -> LithosResult<Self> {
        bincode::deserialize(data).map_err(|e| LithosError::Serialization(format!("snapshot decode failed: {e}")))
    }
}

/// Mesh geometry, possibly deformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshSnapshot {
    pub time: f64,
    pub mesh: CartesianMesh,
}

/// Particle positions plus the model clock.
///
/// Restart takes the model time from this payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwarmSnapshot {
    pub time: f64,
    pub step: u64,
    pub dim: Dimension,
    pub positions: Vec<[Scalar; 3]>,
}

impl SwarmSnapshot {
    pub fn particle_count(&self) -> usize {
        self.positions.len()
    }
}

/// A named field with `components` values per entry, flattened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSnapshot {
    pub name: String,
    pub time: f64,
    pub components: usize,
    pub values: Vec<Scalar>,
}

impl FieldSnapshot {
    pub fn scalar(name: impl Into<String>, time: f64, values: Vec<Scalar>) -> Self {
        Self { name: name.into(), time, components: 1, values }
    }

    /// Number of entries (values / components).
    pub fn len(&self) -> usize {
        if self.components == 0 {
            0
        } else {
            self.values.len() / self.components
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks that the value count is a multiple of `components` and
    /// matches `expected` entries.
    pub fn check_len(&self, expected: usize) -> LithosResult<()> {
        if self.components == 0 || self.values.len() != expected * self.components {
            return Err(LithosError::InvariantViolation(format!(
                "field '{}' holds {} values, expected {} x {}",
                self.name,
                self.values.len(),
                expected,
                self.components
            )));
        }
        Ok(())
    }
}

/// Passive tracer positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracerSnapshot {
    pub name: String,
    pub time: f64,
    pub positions: Vec<[Scalar; 3]>,
}

impl Snapshot for MeshSnapshot {}
impl Snapshot for SwarmSnapshot {}
impl Snapshot for FieldSnapshot {}
impl Snapshot for TracerSnapshot {}
