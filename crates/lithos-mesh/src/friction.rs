//! Frictional boundary layers.
//!
//! A frictional boundary is a band of given thickness along a wall in
//! which plastic materials use the boundary's friction coefficient instead
//! of their own.

use serde::{Deserialize, Serialize};

use lithos_types::Scalar;

use crate::mesh::{CartesianMesh, Wall};

/// Friction coefficients along selected walls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrictionBoundaries {
    /// Walls carrying a frictional layer, with their coefficient.
    pub walls: Vec<(Wall, Scalar)>,
    /// Layer thickness measured inward from the wall.
    pub thickness: Scalar,
}

impl FrictionBoundaries {
    pub fn new(thickness: Scalar) -> Self {
        Self { walls: Vec::new(), thickness }
    }

    /// Default layer of two elements along the finest axis.
    pub fn for_mesh(mesh: &CartesianMesh) -> Self {
        Self::new(2.0 * mesh.min_spacing())
    }

    pub fn with_wall(mut self, wall: Wall, friction: Scalar) -> Self {
        self.walls.push((wall, friction));
        self
    }

    /// Friction coefficient at `p`; the first listed wall wins where
    /// layers overlap.
    pub fn friction_at(&self, mesh: &CartesianMesh, p: &[Scalar; 3]) -> Option<Scalar> {
        self.walls.iter().find_map(|&(wall, friction)| {
            let (axis, upper) = wall.axis(mesh.dim);
            if axis >= mesh.dim.axes() {
                return None;
            }
            let d = if upper { mesh.max_coord[axis] - p[axis] } else { p[axis] - mesh.min_coord[axis] };
            (d <= self.thickness).then_some(friction)
        })
    }

    /// 1 inside a frictional layer, 0 elsewhere.
    pub fn mask(&self, mesh: &CartesianMesh, p: &[Scalar; 3]) -> Scalar {
        if self.friction_at(mesh, p).is_some() {
            1.0
        } else {
            0.0
        }
    }
}
