//! Strongly-typed identifiers for simulation entities.
//!
//! Newtype wrappers prevent accidental mixing of particle indices
//! with material indices.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::BACKGROUND_MATERIAL;

/// Index into the particle (swarm) arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticleId(pub u32);

/// Material index carried by every particle.
///
/// Index 0 is the background material (the model itself).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct MaterialId(pub u32);

impl ParticleId {
    /// Returns the raw index as `usize` for array indexing.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl MaterialId {
    /// The background material.
    pub const BACKGROUND: MaterialId = MaterialId(BACKGROUND_MATERIAL);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns true for the reserved background index.
    #[inline]
    pub fn is_background(self) -> bool {
        self == Self::BACKGROUND
    }
}

impl fmt::Display for MaterialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for ParticleId {
    fn from(val: u32) -> Self {
        Self(val)
    }
}

impl From<u32> for MaterialId {
    fn from(val: u32) -> Self {
        Self(val)
    }
}
