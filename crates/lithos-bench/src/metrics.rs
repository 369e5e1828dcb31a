//! Benchmark metrics collected from a scenario run.

use serde::{Deserialize, Serialize};

/// Metrics collected from a benchmark scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkMetrics {
    pub scenario: String,
    pub particle_count: usize,
    pub element_count: usize,
    /// Number of timesteps executed.
    pub timesteps: u64,
    /// Model time reached (s).
    pub model_time: f64,
    /// Total wall-clock time (seconds).
    pub total_wall_time: f64,
    /// Average wall-clock time per timestep (seconds).
    pub avg_step_time: f64,
    pub min_step_time: f64,
    pub max_step_time: f64,
    /// Average non-linear iterations per solve.
    pub avg_iterations: f64,
    /// Checkpoints written, the initial one included.
    pub checkpoints: usize,
    /// Share of particles on the yield surface at the end of the run.
    pub yielding_fraction: f64,
    pub max_plastic_strain: f64,
    /// Mean of log10 effective viscosity over the swarm.
    pub mean_log10_viscosity: f64,
}

impl BenchmarkMetrics {
    pub fn to_csv_header() -> String {
        "scenario,particle_count,element_count,timesteps,model_time_s,total_wall_time_s,avg_step_ms,min_step_ms,max_step_ms,avg_iterations,checkpoints,yielding_fraction,max_plastic_strain,mean_log10_viscosity".to_string()
    }

    /// Format this metrics instance as a CSV data row.
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{:.6e},{:.6},{:.4},{:.4},{:.4},{:.1},{},{:.4},{:.6e},{:.3}",
            self.scenario,
            self.particle_count,
            self.element_count,
            self.timesteps,
            self.model_time,
            self.total_wall_time,
            self.avg_step_time * 1000.0,
            self.min_step_time * 1000.0,
            self.max_step_time * 1000.0,
            self.avg_iterations,
            self.checkpoints,
            self.yielding_fraction,
            self.max_plastic_strain,
            self.mean_log10_viscosity,
        )
    }

    /// Format multiple metrics as a complete CSV string.
    pub fn to_csv(metrics: &[BenchmarkMetrics]) -> String {
        let mut csv = Self::to_csv_header();
        for m in metrics {
            csv.push('\n');
            csv.push_str(&m.to_csv_row());
        }
        csv
    }
}
