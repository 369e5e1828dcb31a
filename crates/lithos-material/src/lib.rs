//! # lithos-material
//!
//! Material descriptors, their constitutive laws, and the material registry.
//!
//! ## Design
//!
//! Each constitutive capability of a [`Material`] is an `Option` over a
//! closed set of law variants (`None` = the material does not declare the
//! capability). Consumers ask [`Material::has`] before dispatching, so there
//! is no open-ended attribute lookup anywhere in the engine.
//!
//! Laws are evaluated against a [`PointState`]: the per-particle snapshot of
//! pressure, temperature, strain rate and history fields.
//!
//! The [`MaterialRegistry`] keeps the live materials in insertion order with
//! unique indices; index 0 is always the background material.

pub mod density;
pub mod elasticity;
pub mod material;
pub mod melt;
pub mod phase;
pub mod plasticity;
pub mod point;
pub mod presets;
pub mod registry;
pub mod shape;
pub mod viscosity;

pub use density::DensityLaw;
pub use elasticity::Elasticity;
pub use material::{Capability, Material};
pub use melt::{MeltModel, MeltWeakening, SolidusCurve};
pub use phase::{PhaseChange, PhaseTrigger};
pub use plasticity::{DruckerPrager, PlasticityLaw};
pub use point::PointState;
pub use presets::MaterialLibrary;
pub use registry::MaterialRegistry;
pub use shape::Shape;
pub use viscosity::{ViscosityLaw, ViscousCreep};
