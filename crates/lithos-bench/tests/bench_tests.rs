//! Integration tests for lithos-bench.

use lithos_bench::metrics::BenchmarkMetrics;
use lithos_bench::runner::BenchmarkRunner;
use lithos_bench::scenarios::{Scenario, ScenarioKind};
use lithos_material::MaterialLibrary;
use lithos_types::LithosError;

// ─── Scenario Tests ───────────────────────────────────────────

#[test]
fn shear_box_setup() {
    let s = Scenario::shear_box();
    assert_eq!(s.kind, ScenarioKind::ShearBox);
    assert_eq!(s.mesh().unwrap().element_count(), 64);
    let model = s.build(&MaterialLibrary::with_defaults()).unwrap();
    // 4 particles per cell in the debug configuration
    assert_eq!(model.particle_count(), 256);
    assert_eq!(model.swarm.material_census().len(), 1);
}

#[test]
fn rift_paints_three_layers() {
    let s = Scenario::rift();
    let model = s.build(&MaterialLibrary::with_defaults()).unwrap();
    assert_eq!(model.particle_count(), 480);
    assert_eq!(model.swarm.material_census().len(), 3);
}

#[test]
fn unknown_preset_is_configuration_error() {
    let mut s = Scenario::elastic_relaxation();
    s.layers[0].0 = "granite".into();
    let err = s.build(&MaterialLibrary::with_defaults()).err().unwrap();
    assert!(matches!(err, LithosError::Configuration(_)));
}

#[test]
fn all_scenarios() {
    assert_eq!(ScenarioKind::all().len(), 3);
    for &kind in ScenarioKind::all() {
        assert_eq!(ScenarioKind::from_name(kind.name()), Some(kind));
        assert_eq!(Scenario::from_kind(kind).kind, kind);
    }
    assert_eq!(ScenarioKind::from_name("subduction"), None);
}

#[test]
fn with_steps_keeps_schedule() {
    let s = Scenario::shear_box().with_steps(2);
    assert_eq!(s.run.nstep, Some(2));
    assert!(s.run.checkpoints_requested());

    let s = Scenario::elastic_relaxation().with_steps(3);
    assert_eq!(s.run.duration, None);
    assert_eq!(s.run.nstep, Some(3));
}

// ─── Runner Tests ─────────────────────────────────────────────

#[test]
fn run_shear_box() {
    let scenario = Scenario::shear_box().with_steps(2);
    let metrics = BenchmarkRunner::run(&scenario).unwrap();

    assert_eq!(metrics.scenario, "shear_box");
    assert_eq!(metrics.timesteps, 2);
    assert_eq!(metrics.element_count, 64);
    assert!(metrics.model_time > 0.0);
    assert!(metrics.avg_iterations >= 1.0);
    // Only the initial checkpoint; the next one is due at step 5.
    assert_eq!(metrics.checkpoints, 1);
    assert!(metrics.min_step_time <= metrics.max_step_time);
}

#[test]
fn run_all_scenarios() {
    let results = BenchmarkRunner::run_all(Some(2)).unwrap();
    assert_eq!(results.len(), 3);
    for (metrics, &kind) in results.iter().zip(ScenarioKind::all()) {
        assert_eq!(metrics.scenario, kind.name());
        assert_eq!(metrics.timesteps, 2);
        assert!(metrics.total_wall_time >= 0.0);
        assert!((0.0..=1.0).contains(&metrics.yielding_fraction));
        assert!(metrics.mean_log10_viscosity >= 19.0 - 1e-9);
        assert!(metrics.mean_log10_viscosity <= 25.0 + 1e-9);
    }
}

// ─── Metrics Tests ────────────────────────────────────────────

fn sample() -> BenchmarkMetrics {
    BenchmarkMetrics {
        scenario: "test".into(),
        particle_count: 256,
        element_count: 64,
        timesteps: 10,
        model_time: 3.15e13,
        total_wall_time: 1.5,
        avg_step_time: 0.015,
        min_step_time: 0.01,
        max_step_time: 0.02,
        avg_iterations: 3.0,
        checkpoints: 3,
        yielding_fraction: 0.25,
        max_plastic_strain: 0.01,
        mean_log10_viscosity: 21.5,
    }
}

#[test]
fn metrics_csv_output() {
    let csv = BenchmarkMetrics::to_csv(&[sample()]);
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("scenario,particle_count"));
    assert!(lines[1].starts_with("test,256,64,10,"));
    assert_eq!(lines[0].split(',').count(), lines[1].split(',').count());
}

#[test]
fn metrics_json_round_trip() {
    let json = serde_json::to_string(&sample()).unwrap();
    let back: BenchmarkMetrics = serde_json::from_str(&json).unwrap();
    assert_eq!(back.scenario, "test");
    assert_eq!(back.checkpoints, 3);
    assert_eq!(back.yielding_fraction, 0.25);
}
