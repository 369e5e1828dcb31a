//! # lithos-telemetry
//!
//! Event bus for run telemetry. The stepping loop emits structured events
//! (step boundaries, solve convergence, selected timestep and its governing
//! bound, checkpoints, restarts) that are consumed by pluggable sinks.

pub mod bus;
pub mod events;
pub mod sinks;

pub use bus::EventBus;
pub use events::{EventKind, SimulationEvent};
pub use sinks::{EventLog, EventSink, JsonLinesSink, TracingSink, VecSink};
