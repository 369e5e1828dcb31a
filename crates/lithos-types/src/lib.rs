//! # lithos-types
//!
//! Shared types, identifiers, error types, and numerical constants
//! for the lithos geodynamics engine.
//!
//! This crate has zero domain logic: it defines the vocabulary
//! that all other lithos crates share.

pub mod constants;
pub mod error;
pub mod ids;
pub mod scalar;
pub mod tensor;
pub mod units;

pub use error::{LithosError, LithosResult};
pub use ids::{MaterialId, ParticleId};
pub use scalar::Scalar;
pub use tensor::{Dimension, SymTensor};
pub use units::Scaling;
