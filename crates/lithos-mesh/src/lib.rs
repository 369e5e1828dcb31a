//! # lithos-mesh
//!
//! Structured Cartesian mesh with Structure-of-Arrays node storage.
//!
//! ## Key Types
//!
//! - [`CartesianMesh`]: Domain extents, element resolution, node
//!   coordinates and wall index sets.
//! - [`Wall`]: The domain boundaries (`Left`, `Right`, `Bottom`, `Top`,
//!   and `Back`, `Front` in 3-D).
//! - [`FrictionBoundaries`]: Thin frictional layers along the walls.
//! - Particle layouts for swarm initialisation.

pub mod friction;
pub mod layout;
pub mod mesh;

pub use friction::FrictionBoundaries;
pub use layout::per_cell_layout;
pub use mesh::{CartesianMesh, Wall};
