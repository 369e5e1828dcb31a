//! Structured Cartesian mesh.
//!
//! Nodes are numbered with `x` fastest, then `y`, then `z`. Node
//! coordinates are stored per axis:
//! - `pos_x: [x0, x1, x2, ...]`
//! - `pos_y: [y0, y1, y2, ...]`
//! - `pos_z: [z0, z1, z2, ...]` (all zero in 2-D)
//!
//! The coordinates may be deformed by a mesh advector; element lookup
//! always uses the original regular grid.

use serde::{Deserialize, Serialize};

use lithos_types::{Dimension, LithosError, LithosResult, Scalar};

/// Domain boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Wall {
    Left,
    Right,
    Bottom,
    Top,
    Back,
    Front,
}

impl Wall {
    /// Walls present in `dim`, in a fixed order.
    pub fn all(dim: Dimension) -> &'static [Wall] {
        match dim {
            Dimension::Two => &[Wall::Left, Wall::Right, Wall::Bottom, Wall::Top],
            Dimension::Three => &[Wall::Left, Wall::Right, Wall::Bottom, Wall::Top, Wall::Back, Wall::Front],
        }
    }

    /// Axis normal to the wall and whether it is the upper side.
    ///
    /// The vertical axis is `y` in 2-D and `z` in 3-D; `Back`/`Front` are
    /// the `y` walls in 3-D.
    pub fn axis(self, dim: Dimension) -> (usize, bool) {
        let vertical = dim.axes() - 1;
        match self {
            Wall::Left => (0, false),
            Wall::Right => (0, true),
            Wall::Bottom => (vertical, false),
            Wall::Top => (vertical, true),
            Wall::Back => (1, false),
            Wall::Front => (1, true),
        }
    }
}

/// Regular Cartesian mesh of `Q1` elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartesianMesh {
    pub dim: Dimension,
    pub min_coord: [Scalar; 3],
    pub max_coord: [Scalar; 3],
    /// Elements per axis; unused trailing axes are 1.
    pub resolution: [usize; 3],

    pub pos_x: Vec<Scalar>,
    pub pos_y: Vec<Scalar>,
    pub pos_z: Vec<Scalar>,
}

impl CartesianMesh {
    /// Builds the mesh and its node coordinates.
    pub fn new(
        dim: Dimension,
        min_coord: [Scalar; 3],
        max_coord: [Scalar; 3],
        resolution: [usize; 3],
    ) -> LithosResult<Self> {
        let mut res = resolution;
        for axis in 0..3 {
            if axis >= dim.axes() {
                res[axis] = 1;
                continue;
            }
            if res[axis] == 0 {
                return Err(LithosError::InvalidMesh(format!("zero elements along axis {axis}")));
            }
            if !(max_coord[axis] > min_coord[axis]) {
                return Err(LithosError::InvalidMesh(format!(
                    "empty extent along axis {axis}: [{}, {}]",
                    min_coord[axis], max_coord[axis]
                )));
            }
        }

        let mut mesh = Self {
            dim,
            min_coord,
            max_coord,
            resolution: res,
            pos_x: Vec::new(),
            pos_y: Vec::new(),
            pos_z: Vec::new(),
        };

        let [nx, ny, nz] = mesh.nodes_per_axis();
        let n = nx * ny * nz;
        mesh.pos_x.reserve(n);
        mesh.pos_y.reserve(n);
        mesh.pos_z.reserve(n);
        let h = mesh.spacing();
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    mesh.pos_x.push(min_coord[0] + i as Scalar * h[0]);
                    mesh.pos_y.push(min_coord[1] + j as Scalar * h[1]);
                    let z = if dim == Dimension::Three { min_coord[2] + k as Scalar * h[2] } else { 0.0 };
                    mesh.pos_z.push(z);
                }
            }
        }
        Ok(mesh)
    }

    /// 2-D convenience constructor.
    pub fn new_2d(min: [Scalar; 2], max: [Scalar; 2], resolution: [usize; 2]) -> LithosResult<Self> {
        Self::new(
            Dimension::Two,
            [min[0], min[1], 0.0],
            [max[0], max[1], 0.0],
            [resolution[0], resolution[1], 1],
        )
    }

    /// Nodes per axis (1 along unused axes).
    pub fn nodes_per_axis(&self) -> [usize; 3] {
        let mut n = [1; 3];
        for (axis, count) in n.iter_mut().enumerate().take(self.dim.axes()) {
            *count = self.resolution[axis] + 1;
        }
        n
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.pos_x.len()
    }

    #[inline]
    pub fn element_count(&self) -> usize {
        self.resolution.iter().product()
    }

    /// Element edge length per axis on the regular grid.
    pub fn spacing(&self) -> [Scalar; 3] {
        let mut h = [0.0; 3];
        for (axis, hi) in h.iter_mut().enumerate().take(self.dim.axes()) {
            *hi = (self.max_coord[axis] - self.min_coord[axis]) / self.resolution[axis] as Scalar;
        }
        h
    }

    /// Smallest element edge length.
    pub fn min_spacing(&self) -> Scalar {
        self.spacing()[..self.dim.axes()].iter().copied().fold(Scalar::INFINITY, Scalar::min)
    }

    #[inline]
    pub fn node(&self, i: usize) -> [Scalar; 3] {
        [self.pos_x[i], self.pos_y[i], self.pos_z[i]]
    }

    #[inline]
    pub fn set_node(&mut self, i: usize, p: [Scalar; 3]) {
        self.pos_x[i] = p[0];
        self.pos_y[i] = p[1];
        self.pos_z[i] = p[2];
    }

    /// Whether the point lies in the closed domain box.
    pub fn contains(&self, p: &[Scalar; 3]) -> bool {
        (0..self.dim.axes()).all(|a| self.min_coord[a] <= p[a] && p[a] <= self.max_coord[a])
    }

    /// Element owning the point, or `None` outside the domain.
    ///
    /// Points on an interior face belong to the upper element; points on
    /// the upper wall belong to the last element.
    pub fn element_containing(&self, p: &[Scalar; 3]) -> Option<usize> {
        if !self.contains(p) {
            return None;
        }
        let h = self.spacing();
        let mut cell = [0usize; 3];
        for axis in 0..self.dim.axes() {
            let c = ((p[axis] - self.min_coord[axis]) / h[axis]).floor() as usize;
            cell[axis] = c.min(self.resolution[axis] - 1);
        }
        let [nx, ny, _] = self.resolution;
        Some(cell[0] + nx * (cell[1] + ny * cell[2]))
    }

    /// Lower corner of an element on the regular grid.
    pub fn element_origin(&self, element: usize) -> [Scalar; 3] {
        let [nx, ny, _] = self.resolution;
        let cell = [element % nx, (element / nx) % ny, element / (nx * ny)];
        let h = self.spacing();
        let mut o = [0.0; 3];
        for axis in 0..self.dim.axes() {
            o[axis] = self.min_coord[axis] + cell[axis] as Scalar * h[axis];
        }
        o
    }

    /// Node indices on a wall, ascending.
    pub fn wall_nodes(&self, wall: Wall) -> Vec<usize> {
        let (axis, upper) = wall.axis(self.dim);
        let n = self.nodes_per_axis();
        let target = if upper { n[axis] - 1 } else { 0 };
        let mut out = Vec::new();
        for k in 0..n[2] {
            for j in 0..n[1] {
                for i in 0..n[0] {
                    if [i, j, k][axis] == target {
                        out.push(i + n[0] * (j + n[1] * k));
                    }
                }
            }
        }
        out
    }

    /// Checks SoA consistency.
    pub fn validate(&self) -> LithosResult<()> {
        let n = self.pos_x.len();
        if self.pos_y.len() != n || self.pos_z.len() != n {
            return Err(LithosError::InvalidMesh("node coordinate arrays have inconsistent lengths".into()));
        }
        let expected: usize = self.nodes_per_axis().iter().product();
        if n != expected {
            return Err(LithosError::InvalidMesh(format!(
                "node count ({n}) != expected ({expected}) for resolution {:?}",
                self.resolution
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_numbering_is_x_fastest() {
        let m = CartesianMesh::new_2d([0.0, 0.0], [2.0, 1.0], [2, 1]).unwrap();
        assert_eq!(m.node(1), [1.0, 0.0, 0.0]);
        assert_eq!(m.node(3), [0.0, 1.0, 0.0]);
    }

    #[test]
    fn upper_wall_points_belong_to_last_element() {
        let m = CartesianMesh::new_2d([0.0, 0.0], [2.0, 2.0], [2, 2]).unwrap();
        assert_eq!(m.element_containing(&[2.0, 2.0, 0.0]), Some(3));
        assert_eq!(m.element_containing(&[2.1, 0.0, 0.0]), None);
    }
}
