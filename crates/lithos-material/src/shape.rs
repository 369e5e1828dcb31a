//! Geometric predicates used to paint the material field at construction.

use serde::{Deserialize, Serialize};

use lithos_types::{Dimension, MaterialId, Scalar};

/// Region of the domain.
///
/// The vertical axis is `y` in 2-D and `z` in 3-D. Polygons are 2-D only
/// and test the `(x, y)` projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    /// Horizontal slab `bottom <= vertical <= top`.
    Layer { top: Scalar, bottom: Scalar },
    /// Axis-aligned box (closed).
    Box { min: [Scalar; 3], max: [Scalar; 3] },
    /// Disk in 2-D, sphere in 3-D.
    Disk { centre: [Scalar; 3], radius: Scalar },
    /// Simple polygon, even-odd rule.
    Polygon { vertices: Vec<[Scalar; 2]> },
    /// Points with `normal · (p - origin) <= 0`.
    HalfSpace { normal: [Scalar; 3], origin: [Scalar; 3] },
    Union { shapes: Vec<Shape> },
    Intersection { shapes: Vec<Shape> },
}

impl Shape {
    pub fn layer(top: Scalar, bottom: Scalar) -> Self {
        Shape::Layer { top, bottom }
    }

    /// Tests whether `position` lies inside the region.
    pub fn contains(&self, position: &[Scalar; 3], dim: Dimension) -> bool {
        let axes = dim.axes();
        match self {
            Shape::Layer { top, bottom } => {
                let v = position[axes - 1];
                *bottom <= v && v <= *top
            }
            Shape::Box { min, max } => (0..axes).all(|i| min[i] <= position[i] && position[i] <= max[i]),
            Shape::Disk { centre, radius } => {
                let d2: Scalar = (0..axes).map(|i| (position[i] - centre[i]).powi(2)).sum();
                d2 <= radius * radius
            }
            Shape::Polygon { vertices } => point_in_polygon(vertices, position[0], position[1]),
            Shape::HalfSpace { normal, origin } => {
                let s: Scalar = (0..axes).map(|i| normal[i] * (position[i] - origin[i])).sum();
                s <= 0.0
            }
            Shape::Union { shapes } => shapes.iter().any(|s| s.contains(position, dim)),
            Shape::Intersection { shapes } => shapes.iter().all(|s| s.contains(position, dim)),
        }
    }

    /// Assigns `material` to every position inside the region.
    ///
    /// Returns the number of entries repainted.
    pub fn paint(
        &self,
        positions: &[[Scalar; 3]],
        material_field: &mut [MaterialId],
        material: MaterialId,
        dim: Dimension,
    ) -> usize {
        let mut painted = 0;
        for (pos, slot) in positions.iter().zip(material_field.iter_mut()) {
            if self.contains(pos, dim) {
                *slot = material;
                painted += 1;
            }
        }
        painted
    }
}

fn point_in_polygon(vertices: &[[Scalar; 2]], x: Scalar, y: Scalar) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let [xi, yi] = vertices[i];
        let [xj, yj] = vertices[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}
