//! Error types for the lithos engine.
//!
//! All crates return `LithosResult<T>` from fallible operations.

use thiserror::Error;

use crate::ids::MaterialId;

/// Unified error type for the lithos engine.
#[derive(Debug, Error)]
pub enum LithosError {
    /// A material declares a capability whose prerequisite is missing
    /// (e.g. elasticity without viscosity).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Lookup of a material index that is not registered.
    #[error("Material {0} not found")]
    MaterialNotFound(MaterialId),

    /// An explicit material index collides with a registered one.
    #[error("Material index {0} is already in use")]
    DuplicateMaterial(MaterialId),

    /// A constitutive handler needs a field the model does not carry.
    #[error("Material {material} requires the {field} field, which is not available")]
    MissingField {
        material: MaterialId,
        field: &'static str,
    },

    /// A particle dispatches to a material without the requested property.
    #[error("{property} undefined for material {material}")]
    UndefinedProperty {
        material: MaterialId,
        property: &'static str,
    },

    /// Mesh description is inconsistent.
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    /// Restart could not be performed.
    #[error("Restart error: {0}")]
    Restart(String),

    /// Configuration value is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Solver failed to converge.
    #[error("Solver did not converge after {iterations} iterations (residual: {residual:.2e})")]
    SolverDivergence {
        iterations: u32,
        residual: f64,
    },

    /// A simulation invariant was violated (e.g., mismatched array lengths).
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

/// Convenience alias for `Result<T, LithosError>`.
pub type LithosResult<T> = Result<T, LithosError>;
