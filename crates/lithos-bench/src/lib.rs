//! # lithos-bench
//!
//! Benchmark suite for the lithos stepping loop.
//!
//! Provides 3 procedural scenarios built on the reference collaborators,
//! metric collection from the run's event stream, and CSV/JSON export for
//! regression tracking.

pub mod metrics;
pub mod runner;
pub mod scenarios;

pub use metrics::BenchmarkMetrics;
pub use runner::BenchmarkRunner;
pub use scenarios::{Scenario, ScenarioKind};
