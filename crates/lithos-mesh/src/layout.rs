//! Deterministic particle layouts.

use lithos_types::Scalar;

use crate::mesh::CartesianMesh;

/// Fills every element with `per_cell` particles.
///
/// Particles sit on the smallest regular sub-lattice with at least
/// `per_cell` points per element (`k^dim >= per_cell`); the first
/// `per_cell` lattice points are kept. Output is ordered by element.
pub fn per_cell_layout(mesh: &CartesianMesh, per_cell: usize) -> Vec<[Scalar; 3]> {
    let axes = mesh.dim.axes();
    let mut k = 1usize;
    while k.pow(axes as u32) < per_cell {
        k += 1;
    }
    let h = mesh.spacing();
    let mut out = Vec::with_capacity(mesh.element_count() * per_cell);
    for e in 0..mesh.element_count() {
        let origin = mesh.element_origin(e);
        for n in 0..per_cell {
            let mut idx = n;
            let mut p = [0.0; 3];
            for axis in 0..axes {
                let c = idx % k;
                idx /= k;
                p[axis] = origin[axis] + (c as Scalar + 0.5) / k as Scalar * h[axis];
            }
            out.push(p);
        }
    }
    out
}
