//! Symmetric rank-2 tensors in Voigt layout.
//!
//! Components are always stored in a fixed six-slot array so per-particle
//! buffers have a uniform stride. Only the first [`Dimension::components`]
//! slots are meaningful:
//!
//! ```text
//! 2-D: [xx, yy, xy, 0, 0, 0]
//! 3-D: [xx, yy, zz, xy, xz, yz]
//! ```

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

use crate::scalar::Scalar;

/// Spatial dimension of the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    /// Plane-strain models.
    Two,
    /// Full 3-D models.
    Three,
}

impl Dimension {
    /// Number of spatial axes.
    #[inline]
    pub fn axes(self) -> usize {
        match self {
            Dimension::Two => 2,
            Dimension::Three => 3,
        }
    }

    /// Number of independent symmetric-tensor components (3 or 6).
    #[inline]
    pub fn components(self) -> usize {
        match self {
            Dimension::Two => 3,
            Dimension::Three => 6,
        }
    }

    /// Number of diagonal components.
    #[inline]
    fn diagonal(self) -> usize {
        self.axes()
    }
}

/// A symmetric tensor in Voigt notation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SymTensor(pub [Scalar; 6]);

impl SymTensor {
    /// The zero tensor.
    pub const ZERO: SymTensor = SymTensor([0.0; 6]);

    /// Builds a 2-D tensor from its three independent components.
    pub fn new_2d(xx: Scalar, yy: Scalar, xy: Scalar) -> Self {
        Self([xx, yy, xy, 0.0, 0.0, 0.0])
    }

    /// Builds a 3-D tensor from its six independent components.
    pub fn new_3d(xx: Scalar, yy: Scalar, zz: Scalar, xy: Scalar, xz: Scalar, yz: Scalar) -> Self {
        Self([xx, yy, zz, xy, xz, yz])
    }

    /// Second invariant `sqrt(0.5 * A:A)`.
    pub fn second_invariant(&self, dim: Dimension) -> Scalar {
        let n = dim.components();
        let d = dim.diagonal();
        let mut acc = 0.0;
        for (k, c) in self.0.iter().take(n).enumerate() {
            if k < d {
                acc += 0.5 * c * c;
            } else {
                acc += c * c;
            }
        }
        acc.sqrt()
    }

    /// Component slice that is meaningful for `dim`.
    pub fn components(&self, dim: Dimension) -> &[Scalar] {
        &self.0[..dim.components()]
    }

    /// Returns `self * (1 - phi) + other * phi`.
    pub fn relax_towards(&self, other: &SymTensor, phi: Scalar) -> SymTensor {
        let mut out = [0.0; 6];
        for (k, o) in out.iter_mut().enumerate() {
            *o = self.0[k] * (1.0 - phi) + other.0[k] * phi;
        }
        SymTensor(out)
    }
}

impl Add for SymTensor {
    type Output = SymTensor;

    fn add(self, rhs: SymTensor) -> SymTensor {
        let mut out = self.0;
        for (o, r) in out.iter_mut().zip(rhs.0.iter()) {
            *o += r;
        }
        SymTensor(out)
    }
}

impl Sub for SymTensor {
    type Output = SymTensor;

    fn sub(self, rhs: SymTensor) -> SymTensor {
        let mut out = self.0;
        for (o, r) in out.iter_mut().zip(rhs.0.iter()) {
            *o -= r;
        }
        SymTensor(out)
    }
}

impl Mul<Scalar> for SymTensor {
    type Output = SymTensor;

    fn mul(self, rhs: Scalar) -> SymTensor {
        SymTensor(self.0.map(|c| c * rhs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_invariant_pure_shear_2d() {
        let t = SymTensor::new_2d(0.0, 0.0, 2.0);
        assert!((t.second_invariant(Dimension::Two) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn trailing_slots_ignored_in_2d() {
        let t = SymTensor([1.0, -1.0, 0.0, 9.0, 9.0, 9.0]);
        assert!((t.second_invariant(Dimension::Two) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn relax_endpoints() {
        let a = SymTensor::new_2d(1.0, 2.0, 3.0);
        let b = SymTensor::new_2d(5.0, 6.0, 7.0);
        assert_eq!(a.relax_towards(&b, 0.0), a);
        assert_eq!(a.relax_towards(&b, 1.0), b);
    }
}
