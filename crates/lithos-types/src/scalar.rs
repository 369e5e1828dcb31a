//! Scalar type alias for the simulation.
//!
//! Geodynamic quantities span more than forty orders of magnitude
//! (viscosities near 1e25 Pa·s, strain rates near 1e-20 1/s), so the
//! engine runs in double precision throughout.

/// The floating-point type used throughout the simulation.
pub type Scalar = f64;
