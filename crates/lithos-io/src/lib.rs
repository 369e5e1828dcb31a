//! # lithos-io
//!
//! The persistence boundary of a run.
//!
//! - [`contract`]: `run_for` arguments ([`RunParams`]) and the run summary.
//! - [`validator`]: early rejection of inconsistent run parameters.
//! - [`layout`]: checkpoint file naming and restart step resolution.
//! - [`snapshot`]: bincode payloads for mesh, swarm, fields and tracers.
//! - [`store`]: the [`CheckpointStore`] seam with in-memory and directory
//!   implementations.
//! - [`xdmf`]: XDMF index documents referencing the payloads.
//! - [`barrier`]: the [`Rendezvous`] seam used around every persistence
//!   operation.

pub mod barrier;
pub mod contract;
pub mod layout;
pub mod snapshot;
pub mod store;
pub mod validator;
pub mod xdmf;

pub use barrier::{LocalGroup, Rendezvous, SingleProcess};
pub use contract::{CheckpointRecord, CheckpointSchedule, RestartRequest, RunParams, RunSummary};
pub use layout::CheckpointLayout;
pub use snapshot::{FieldSnapshot, MeshSnapshot, Snapshot, SwarmSnapshot, TracerSnapshot};
pub use store::{CheckpointStore, DirectoryStore, MemoryStore};
