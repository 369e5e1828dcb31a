//! Benchmark runner: builds a scenario, steps it and collects metrics.

use std::time::Instant;

use lithos_material::MaterialLibrary;
use lithos_telemetry::{EventBus, EventKind, VecSink};
use lithos_types::LithosResult;

use crate::metrics::BenchmarkMetrics;
use crate::scenarios::{Scenario, ScenarioKind};

/// Runs benchmark scenarios and collects metrics.
pub struct BenchmarkRunner;

impl BenchmarkRunner {
    /// Run a single scenario against the built-in material presets.
    pub fn run(scenario: &Scenario) -> LithosResult<BenchmarkMetrics> {
        Self::run_with(scenario, &MaterialLibrary::with_defaults())
    }

    /// Run a single scenario, resolving layer names in `library`.
    pub fn run_with(scenario: &Scenario, library: &MaterialLibrary) -> LithosResult<BenchmarkMetrics> {
        let sink = VecSink::new();
        let log = sink.log();
        let mut model = scenario.build(library)?.with_events(EventBus::with_sink(Box::new(sink)));

        let total_start = Instant::now();
        let summary = model.run_for(&scenario.run)?;
        let total_wall_time = total_start.elapsed().as_secs_f64();

        let mut step_times = Vec::new();
        let mut iterations = Vec::new();
        for event in log.snapshot() {
            match event.kind {
                EventKind::StepEnd { wall_time, .. } => step_times.push(wall_time),
                EventKind::Solve { iterations: n, .. } => iterations.push(n),
                _ => {}
            }
        }

        let composer = model.composer();
        let breakdown = composer.viscosity_breakdown()?;
        let yielding = breakdown.iter().filter(|b| b.is_yielding()).count();
        let yielding_fraction = if breakdown.is_empty() { 0.0 } else { yielding as f64 / breakdown.len() as f64 };
        let mean_log10_viscosity = if breakdown.is_empty() {
            0.0
        } else {
            breakdown.iter().map(|b| b.effective.log10()).sum::<f64>() / breakdown.len() as f64
        };
        let max_plastic_strain = model.swarm.plastic_strain.iter().copied().fold(0.0, f64::max);

        let avg_step = if step_times.is_empty() {
            0.0
        } else {
            step_times.iter().sum::<f64>() / step_times.len() as f64
        };
        let min_step = if step_times.is_empty() { 0.0 } else { step_times.iter().copied().fold(f64::MAX, f64::min) };
        let max_step = step_times.iter().copied().fold(0.0, f64::max);
        let avg_iterations = if iterations.is_empty() {
            0.0
        } else {
            iterations.iter().map(|&n| n as f64).sum::<f64>() / iterations.len() as f64
        };

        let metrics = BenchmarkMetrics {
            scenario: scenario.kind.name().to_string(),
            particle_count: summary.particle_count,
            element_count: model.mesh.element_count(),
            timesteps: summary.steps,
            model_time: summary.time,
            total_wall_time,
            avg_step_time: avg_step,
            min_step_time: min_step,
            max_step_time: max_step,
            avg_iterations,
            checkpoints: summary.checkpoints.len(),
            yielding_fraction,
            max_plastic_strain,
            mean_log10_viscosity,
        };
        tracing::info!(
            scenario = %metrics.scenario,
            steps = metrics.timesteps,
            wall_time = metrics.total_wall_time,
            yielding = metrics.yielding_fraction,
            "benchmark finished"
        );
        Ok(metrics)
    }

    /// Run every scenario, optionally overriding the run length.
    pub fn run_all(steps: Option<u64>) -> LithosResult<Vec<BenchmarkMetrics>> {
        let library = MaterialLibrary::with_defaults();
        let mut results = Vec::new();
        for &kind in ScenarioKind::all() {
            let mut scenario = Scenario::from_kind(kind);
            if let Some(n) = steps {
                scenario = scenario.with_steps(n);
            }
            results.push(Self::run_with(&scenario, &library)?);
        }
        Ok(results)
    }
}
