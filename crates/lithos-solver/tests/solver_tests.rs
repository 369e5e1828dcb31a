//! Integration tests for lithos-solver.

use lithos_io::{CheckpointStore, LocalGroup, MemoryStore, RestartRequest, RunParams};
use lithos_material::{
    DensityLaw, DruckerPrager, Elasticity, Material, MeltModel, MeltWeakening, PhaseChange, PhaseTrigger, PlasticityLaw, Shape,
    SolidusCurve, ViscosityLaw,
};
use lithos_mesh::{CartesianMesh, FrictionBoundaries, Wall};
use lithos_telemetry::{EventBus, EventKind, VecSink};
use lithos_types::{LithosError, MaterialId, Scalar};

use lithos_solver::stub::{CellRefill, ConductiveGeotherm, Flow, MidpointAdvector, PrescribedFlow};
use lithos_solver::{Model, ModelConfig, PassiveTracers, SurfaceProcess, Swarm, TimestepBound, TracerSet};

fn mesh() -> CartesianMesh {
    CartesianMesh::new_2d([0.0, 0.0], [4.0, 2.0], [4, 2]).unwrap()
}

fn mantle() -> Material {
    Material::new("mantle").with_density(DensityLaw::constant(3300.0)).with_viscosity(ViscosityLaw::constant(1e21))
}

fn build(background: Material, flow: Flow) -> Model {
    Model::new(
        ModelConfig::debug(),
        mesh(),
        background,
        Box::new(PrescribedFlow::new(flow)),
        Box::new(MidpointAdvector),
        Box::new(CellRefill::default()),
    )
    .unwrap()
    .with_store(Box::new(MemoryStore::new()))
}

fn at_rest() -> Flow {
    Flow::Uniform { velocity: [0.0; 3] }
}

fn drifting() -> Flow {
    Flow::Uniform { velocity: [1e-3, 0.0, 0.0] }
}

fn close(a: Scalar, b: Scalar) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

// ─── Construction ─────────────────────────────────────────────

#[test]
fn model_populates_every_cell() {
    let model = build(mantle(), at_rest());
    // debug config: 4 particles per 2-D cell, 8 cells
    assert_eq!(model.particle_count(), 32);
    assert!(!model.solution_exists());
    assert!(model.swarm.material.iter().all(|m| m.is_background()));
}

#[test]
fn add_material_paints_its_shape() {
    let mut model = build(mantle(), at_rest());
    let crust = Material::new("crust")
        .with_density(DensityLaw::constant(2700.0))
        .with_viscosity(ViscosityLaw::constant(1e23))
        .with_shape(Shape::layer(2.0, 1.0));
    let id = model.add_material(crust, None).unwrap();
    assert_eq!(id, MaterialId(1));

    for (p, m) in model.swarm.positions.iter().zip(&model.swarm.material) {
        assert_eq!(*m == id, p[1] >= 1.0);
    }
    let density = model.composer().density().unwrap();
    for (p, rho) in model.swarm.positions.iter().zip(density) {
        assert_eq!(rho, if p[1] >= 1.0 { 2700.0 } else { 3300.0 });
    }
}

#[test]
fn invalid_config_is_rejected() {
    let config = ModelConfig { min_viscosity: 1e26, ..ModelConfig::debug() };
    let result = Model::new(
        config,
        mesh(),
        mantle(),
        Box::new(PrescribedFlow::new(at_rest())),
        Box::new(MidpointAdvector),
        Box::new(CellRefill::default()),
    );
    assert!(matches!(result, Err(LithosError::InvalidConfig(_))));
}

// ─── Rheology Composition ─────────────────────────────────────

#[test]
fn plastic_only_material_yields_at_half_stress_over_rate() {
    let crust = Material::new("crust")
        .with_density(DensityLaw::constant(2700.0))
        .with_plasticity(PlasticityLaw::von_mises(1e7));
    let mut model = build(crust, Flow::SimpleShear { rate: 2e-14, origin: 0.0 });
    model.solve().unwrap();
    assert!(model.solution_exists());

    let c = model.composer();
    for eta in c.viscosity().unwrap() {
        assert!(close(eta, 5e20), "eta = {eta}");
    }
    for y in c.yielding().unwrap() {
        assert!(close(y, 1e-14), "yielding = {y}");
    }
}

#[test]
fn viscous_material_does_not_yield() {
    let mut model = build(mantle(), Flow::SimpleShear { rate: 2e-14, origin: 0.0 });
    model.solve().unwrap();
    assert!(model.composer().yielding().unwrap().iter().all(|&y| y == 0.0));
}

#[test]
fn clamped_stiff_material_counts_as_yielding() {
    let stiff = Material::new("stiff")
        .with_density(DensityLaw::constant(3300.0))
        .with_viscosity(ViscosityLaw::constant(1e26))
        .with_plasticity(PlasticityLaw::von_mises(1e20));
    let mut model = build(stiff, Flow::SimpleShear { rate: 2e-14, origin: 0.0 });
    model.solve().unwrap();

    let c = model.composer();
    for b in c.viscosity_breakdown().unwrap() {
        assert_eq!(b.background, 1e26);
        assert_eq!(b.effective, 1e25);
        assert!(b.is_yielding());
    }
    for y in c.yielding().unwrap() {
        assert!(close(y, 1e-14), "yielding = {y}");
    }
}

#[test]
fn effective_viscosity_never_exceeds_either_branch() {
    for (yield_stress, plastic_governs) in [(1e7, true), (1e9, false)] {
        let rock = mantle().with_plasticity(PlasticityLaw::von_mises(yield_stress));
        let mut model = build(rock, Flow::SimpleShear { rate: 2e-14, origin: 0.0 });
        model.solve().unwrap();

        let plastic = 0.5 * yield_stress / 1e-14;
        for b in model.composer().viscosity_breakdown().unwrap() {
            assert_eq!(b.background, 1e21);
            assert!(b.unclamped <= b.background.min(plastic));
            assert!(close(b.unclamped, b.background.min(plastic)));
            assert!((1e19..=1e25).contains(&b.effective));
            assert_eq!(b.is_yielding(), plastic_governs);
        }
    }
}

#[test]
fn frictional_layer_only_weakens_masked_particles() {
    let crust = Material::new("crust")
        .with_density(DensityLaw::constant(2700.0))
        .with_plasticity(PlasticityLaw::DruckerPrager(DruckerPrager::new(1e7, 0.0)));
    let friction = FrictionBoundaries::new(0.5).with_wall(Wall::Top, 1.0);
    let mut model =
        build(crust, Flow::SimpleShear { rate: 2e-14, origin: 0.0 }).with_friction(friction.clone());
    model.solve().unwrap();

    let eta = model.composer().viscosity().unwrap();
    let interior = 0.5 * 1e7 / 1e-14;
    let layer = interior * std::f64::consts::FRAC_PI_4.cos();
    let (mut masked, mut unmasked) = (0, 0);
    for (p, v) in model.swarm.positions.iter().zip(&eta) {
        if friction.mask(&model.mesh, p) == 1.0 {
            masked += 1;
            assert!(close(*v, layer), "masked eta = {v}");
        } else {
            unmasked += 1;
            assert!(close(*v, interior), "interior eta = {v}");
        }
    }
    assert!(masked > 0 && unmasked > 0);
}

#[test]
fn stress_history_relaxes_towards_current_stress() {
    // mu dt_e = 1e21, so the visco-elastic viscosity is 5e20.
    let elastic = mantle().with_elasticity(Elasticity::new(1e10, 1e11));
    let mut model = build(elastic, Flow::SimpleShear { rate: 2e-14, origin: 0.0 });
    model.solve().unwrap();

    // phi = 2.5e10 / 1e11; current stress 2 * 5e20 * 1e-14.
    model.advance(2.5e10).unwrap();
    for s in &model.swarm.previous_stress {
        assert!(close(s.0[2], 0.25 * 1e7), "first relaxation = {}", s.0[2]);
    }

    model.solve().unwrap();
    model.advance(2.5e10).unwrap();
    let current = 1e7 + 2.5e6 * 0.5;
    let expected = 2.5e6 * 0.75 + current * 0.25;
    for s in &model.swarm.previous_stress {
        assert!(close(s.0[2], expected), "second relaxation = {}", s.0[2]);
        assert_eq!(s.0[0], 0.0);
    }
}

#[test]
fn viscosity_is_clamped_to_bounds() {
    let stiff = Material::new("stiff").with_density(DensityLaw::constant(3300.0)).with_viscosity(ViscosityLaw::constant(1e30));
    let model = build(stiff, at_rest());
    assert!(model.composer().viscosity().unwrap().iter().all(|&eta| eta == 1e25));

    let weak = Material::new("weak").with_density(DensityLaw::constant(3300.0)).with_viscosity(ViscosityLaw::constant(1e10));
    let model = build(weak, at_rest());
    assert!(model.composer().viscosity().unwrap().iter().all(|&eta| eta == 1e19));
}

#[test]
fn elastic_material_without_viscosity_is_a_configuration_error() {
    let mut model = build(mantle(), at_rest());
    let slab = Material::new("slab")
        .with_density(DensityLaw::constant(3300.0))
        .with_elasticity(Elasticity::new(3e10, 1e4))
        .with_shape(Shape::layer(2.0, 1.0));
    model.add_material(slab, None).unwrap();
    assert!(matches!(model.composer().viscosity(), Err(LithosError::Configuration(_))));
}

#[test]
fn melt_weakening_interpolates_between_breakpoints() {
    let molten = mantle().with_melt_weakening(MeltWeakening::new(0.01, 0.1, 0.3));
    let mut model = build(molten, at_rest());
    model.swarm.melt[0] = 0.2;
    model.swarm.melt[1] = 0.5;
    let eta = model.composer().viscosity().unwrap();
    assert!(close(eta[0], 1e21 * 0.505));
    assert!(close(eta[1], 1e19));
    assert!(close(eta[2], 1e21));
}

#[test]
fn degenerate_melt_weakening_is_rejected() {
    let mut model = build(mantle(), at_rest());
    let bad = mantle().with_melt_weakening(MeltWeakening::new(0.1, 0.3, 0.3)).with_shape(Shape::layer(2.0, 1.0));
    model.add_material(bad, None).unwrap();
    assert!(matches!(model.composer().viscosity(), Err(LithosError::Configuration(_))));
}

#[test]
fn lithostatic_pressure_follows_depth() {
    let mut model = Model::new(
        ModelConfig::debug(),
        mesh(),
        mantle(),
        Box::new(PrescribedFlow::new(at_rest()).with_lithostatic_pressure()),
        Box::new(MidpointAdvector),
        Box::new(CellRefill::default()),
    )
    .unwrap();
    model.solve().unwrap();
    let g = model.config.gravity;
    for (p, pressure) in model.swarm.positions.iter().zip(&model.solution.pressure) {
        assert!(close(*pressure, 3300.0 * g * (2.0 - p[1])));
    }
}

// ─── State Advance ────────────────────────────────────────────

#[test]
fn healing_never_drives_plastic_strain_negative() {
    let mut model = build(mantle().with_healing_rate(1.0), at_rest());
    model.swarm.plastic_strain[0] = 0.5;
    model.swarm.plastic_strain[1] = 0.05;
    model.advance(0.1).unwrap();
    assert!(close(model.swarm.plastic_strain[0], 0.4));
    assert_eq!(model.swarm.plastic_strain[1], 0.0);
    assert_eq!(model.swarm.plastic_strain[2], 0.0);
}

#[test]
fn plastic_strain_accumulates_where_yielding() {
    let crust = Material::new("crust")
        .with_density(DensityLaw::constant(2700.0))
        .with_plasticity(PlasticityLaw::von_mises(1e7));
    let mut model = build(crust, Flow::SimpleShear { rate: 2e-14, origin: 0.0 });
    model.solve().unwrap();
    model.advance(1e12).unwrap();
    for e in &model.swarm.plastic_strain {
        assert!(close(*e, 1e-2), "plastic strain = {e}");
    }
}

#[test]
fn particle_time_advances_with_dt() {
    let mut model = build(mantle(), at_rest());
    model.advance(2.5).unwrap();
    model.advance(0.5).unwrap();
    assert!(model.swarm.time.iter().all(|&t| close(t, 3.0)));
}

#[test]
fn advance_rejects_non_positive_dt() {
    let mut model = build(mantle(), at_rest());
    assert!(model.advance(0.0).is_err());
    assert!(model.advance(f64::NAN).is_err());
}

#[test]
fn phase_changes_cascade_within_one_call() {
    let to_b = PhaseChange::new(PhaseTrigger::PlasticStrainAbove { strain: 0.1 }, MaterialId(1));
    let to_c = PhaseChange::new(PhaseTrigger::PlasticStrainAbove { strain: 0.1 }, MaterialId(2));
    let mut model = build(mantle().with_phase_change(to_b), at_rest());
    model.add_material(mantle().with_phase_change(to_c), None).unwrap();
    model.add_material(mantle(), None).unwrap();

    for (i, e) in model.swarm.plastic_strain.iter_mut().enumerate() {
        *e = if i % 2 == 0 { 0.5 } else { 0.0 };
    }
    model.advance(1.0).unwrap();
    for (i, m) in model.swarm.material.iter().enumerate() {
        let expected = if i % 2 == 0 { MaterialId(2) } else { MaterialId::BACKGROUND };
        assert_eq!(*m, expected, "particle {i}");
    }
}

#[test]
fn phase_change_to_unknown_material_fails() {
    let to_nowhere = PhaseChange::new(PhaseTrigger::PlasticStrainAbove { strain: -1.0 }, MaterialId(7));
    let mut model = build(mantle().with_phase_change(to_nowhere), at_rest());
    assert!(matches!(model.advance(1.0), Err(LithosError::MaterialNotFound(MaterialId(7)))));
}

fn melting() -> MeltModel {
    MeltModel::new(SolidusCurve::constant(1000.0), SolidusCurve::constant(1400.0))
}

fn hot_model() -> Model {
    let m = mesh();
    let geotherm = ConductiveGeotherm::new(&m, 0.0, 1600.0);
    let mut model = build(mantle().with_melt(melting()), at_rest()).with_thermal(Box::new(geotherm));
    model.init_model().unwrap();
    model
}

#[test]
fn melt_fraction_follows_the_geotherm() {
    let mut model = hot_model();
    assert!(model.swarm.melt.iter().all(|&f| f == 0.0));
    model.advance(1.0).unwrap();

    let temperature = model.solution.temperature.clone().unwrap();
    let mut molten = 0;
    for (f, t) in model.swarm.melt.iter().zip(&temperature) {
        assert!(close(*f, melting().melt_fraction(0.0, *t)));
        assert!(*f <= 0.3);
        if *f > 0.0 {
            molten += 1;
            assert!(*t > 1000.0 && *t < 1400.0);
        }
    }
    assert!(molten > 0);
}

#[test]
fn melt_material_without_temperature_is_missing_a_field() {
    let model = build(mantle().with_melt(melting()), at_rest());
    assert!(matches!(model.composer().melt_fraction(), Err(LithosError::MissingField { field: "temperature", .. })));
}

// ─── Stepping Loop ────────────────────────────────────────────

#[test]
fn run_without_duration_or_steps_does_nothing() {
    let mut model = build(mantle(), at_rest());
    let summary = model.run_for(&RunParams::default()).unwrap();
    assert_eq!(summary.steps, 0);
    assert_eq!(summary.time, 0.0);
    assert!(summary.checkpoints.is_empty());
}

#[test]
fn model_at_rest_without_bounds_cannot_step() {
    let mut model = build(mantle(), at_rest());
    assert!(matches!(model.run_for(&RunParams::for_steps(1)), Err(LithosError::InvariantViolation(_))));
}

#[test]
fn interval_checkpoints_land_on_targets() {
    let mut model = build(mantle(), at_rest());
    let summary = model.run_for(&RunParams::for_duration(3500.0).checkpoint_every(1000.0)).unwrap();

    assert_eq!(summary.steps, 4);
    assert_eq!(summary.time, 3500.0);
    let times: Vec<f64> = summary.checkpoints.iter().map(|c| c.time).collect();
    assert_eq!(times, vec![0.0, 1000.0, 2000.0, 3000.0]);
    let ids: Vec<u64> = summary.checkpoints.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![0, 1, 2, 3]);
}

#[test]
fn swarm_is_written_every_stride_checkpoints() {
    let mut model = build(mantle(), at_rest());
    let params = RunParams::for_duration(3500.0).checkpoint_every(1000.0).with_swarm_stride(2);
    let summary = model.run_for(&params).unwrap();
    let swarm: Vec<bool> = summary.checkpoints.iter().map(|c| c.swarm).collect();
    assert_eq!(swarm, vec![true, false, true, false]);
    assert!(model.store().exists("swarm-2.h5"));
    assert!(!model.store().exists("swarm-3.h5"));
    assert!(model.store().exists("viscosity-3.h5"));
}

#[test]
fn listed_checkpoint_times_bound_the_timestep() {
    let mut model = build(mantle(), at_rest());
    let params = RunParams::for_duration(1000.0).with_checkpoint_times(vec![600.0, 250.0]);
    let summary = model.run_for(&params).unwrap();
    // Only the initial checkpoint is written; the listed times cut the steps.
    let times: Vec<f64> = summary.checkpoints.iter().map(|c| c.time).collect();
    assert_eq!(times, vec![0.0]);
    assert_eq!(summary.steps, 3);
    assert_eq!(model.clock.checkpoint_id, 0);
}

#[test]
fn listed_checkpoint_times_leave_the_interval_cadence_alone() {
    let mut model = build(mantle(), at_rest());
    let params = RunParams::for_duration(3500.0).checkpoint_every(1000.0).with_checkpoint_times(vec![1500.0]);
    let summary = model.run_for(&params).unwrap();
    assert_eq!(summary.steps, 5);
    let written: Vec<(u64, f64)> = summary.checkpoints.iter().map(|c| (c.id, c.time)).collect();
    assert_eq!(written, vec![(0, 0.0), (1, 1000.0), (2, 2000.0), (3, 3000.0)]);
}

#[test]
fn elastic_observation_time_bounds_the_timestep() {
    let sink = VecSink::new();
    let log = sink.log();
    let elastic = mantle().with_elasticity(Elasticity::new(1e10, 300.0));
    let mut model = build(elastic, at_rest()).with_events(EventBus::with_sink(Box::new(sink)));
    let summary = model.run_for(&RunParams::for_duration(1000.0)).unwrap();

    assert_eq!(summary.steps, 10);
    assert_eq!(summary.time, 1000.0);
    let bounds: Vec<(f64, String)> = log
        .snapshot()
        .into_iter()
        .filter_map(|e| match e.kind {
            EventKind::Timestep { dt, bound } => Some((dt, bound)),
            _ => None,
        })
        .collect();
    assert_eq!(bounds.len(), 10);
    assert!(bounds.iter().all(|(dt, _)| close(*dt, 100.0)));
    assert!(bounds[..9].iter().all(|(_, b)| *b == TimestepBound::ElasticRelaxation.to_string()));
    assert_eq!(bounds[9].1, TimestepBound::RunEnd.to_string());
}

#[test]
fn timestep_never_exceeds_ceiling() {
    let sink = VecSink::new();
    let log = sink.log();
    let mut model = build(mantle(), drifting()).with_events(EventBus::with_sink(Box::new(sink)));
    let summary = model.run_for(&RunParams::for_duration(3500.0).with_max_dt(300.0)).unwrap();

    assert_eq!(summary.steps, 12);
    assert_eq!(summary.time, 3500.0);
    let bounds: Vec<(f64, String)> = log
        .snapshot()
        .into_iter()
        .filter_map(|e| match e.kind {
            EventKind::Timestep { dt, bound } => Some((dt, bound)),
            _ => None,
        })
        .collect();
    assert_eq!(bounds.len(), 12);
    assert!(bounds.iter().all(|(dt, _)| *dt <= 300.0));
    assert_eq!(bounds[0].1, TimestepBound::UserCeiling.to_string());
    assert_eq!(bounds[11].1, TimestepBound::RunEnd.to_string());
}

#[test]
fn steps_run_emits_one_solve_per_iteration() {
    let sink = VecSink::new();
    let log = sink.log();
    let mut model = build(mantle(), drifting()).with_events(EventBus::with_sink(Box::new(sink)));
    let summary = model.run_for(&RunParams::for_steps(3)).unwrap();

    assert_eq!(summary.steps, 3);
    assert_eq!(model.clock.step, 3);
    assert_eq!(log.count("step_begin"), 3);
    assert_eq!(log.count("step_end"), 3);
    assert_eq!(log.count("solve"), 3);
    assert_eq!(log.count("checkpoint"), 0);

    let initial: Vec<bool> = log
        .snapshot()
        .into_iter()
        .filter_map(|e| match e.kind {
            EventKind::Solve { initial, .. } => Some(initial),
            _ => None,
        })
        .collect();
    assert_eq!(initial, vec![true, false, false]);
}

#[test]
fn escaped_particles_are_replaced() {
    let mut model = build(mantle(), Flow::Uniform { velocity: [1e-3, 0.0, 0.0] });
    model.run_for(&RunParams::for_duration(3000.0)).unwrap();
    let mesh = model.mesh.clone();
    assert!(model.swarm.positions.iter().all(|p| mesh.contains(p)));
    let mut occupied = vec![false; mesh.element_count()];
    for p in &model.swarm.positions {
        if let Some(e) = mesh.element_containing(p) {
            occupied[e] = true;
        }
    }
    assert!(occupied.iter().all(|&o| o));
}

#[test]
fn tracers_follow_the_flow() {
    let tracers = PassiveTracers::line("surface", [0.5, 1.0, 0.0], [1.5, 1.0, 0.0], 3);
    let mut model = build(mantle(), drifting()).with_tracers(Box::new(tracers));
    model.run_for(&RunParams::for_duration(1000.0)).unwrap();
    let snapshot = model.tracers()[0].snapshot(model.clock.time);
    assert_eq!(snapshot.positions.len(), 3);
    assert!(close(snapshot.positions[0][0], 1.5));
    assert!(close(snapshot.positions[2][0], 2.5));
}

// ─── Checkpoint / Restart ─────────────────────────────────────

#[test]
fn restart_restores_swarm_and_clock() {
    let store = MemoryStore::new();
    let crust = || {
        Material::new("crust")
            .with_density(DensityLaw::constant(2700.0))
            .with_viscosity(ViscosityLaw::constant(1e23))
            .with_shape(Shape::layer(2.0, 1.5))
    };

    let mut first = build(mantle(), at_rest()).with_store(Box::new(store.clone()));
    first.add_material(crust(), None).unwrap();
    first.swarm.plastic_strain[0] = 0.3;
    first.run_for(&RunParams::for_duration(3500.0).checkpoint_every(1000.0)).unwrap();

    let mut second = build(mantle(), at_rest()).with_store(Box::new(store.clone()));
    second.add_material(crust(), None).unwrap();
    assert_eq!(second.restart(&RestartRequest::last()).unwrap(), Some(3));

    assert_eq!(second.clock.time, 3000.0);
    assert_eq!(second.clock.step, 3);
    assert_eq!(second.clock.checkpoint_id, 3);
    assert!(!second.solution_exists());
    assert_eq!(second.particle_count(), first.particle_count());
    assert_eq!(second.swarm.material, first.swarm.material);
    assert_eq!(second.swarm.plastic_strain[0], 0.3);
}

#[test]
fn restart_at_explicit_step() {
    let store = MemoryStore::new();
    let mut first = build(mantle(), at_rest()).with_store(Box::new(store.clone()));
    first.run_for(&RunParams::for_duration(3500.0).checkpoint_every(1000.0)).unwrap();

    let mut second = build(mantle(), at_rest()).with_store(Box::new(store.clone()));
    assert_eq!(second.restart(&RestartRequest::at(1)).unwrap(), Some(1));
    assert_eq!(second.clock.time, 1000.0);

    assert!(matches!(second.restart(&RestartRequest::at(9)), Err(LithosError::Restart(_))));
}

#[test]
fn restart_at_checkpoint_without_swarm_fails() {
    let store = MemoryStore::new();
    let mut first = build(mantle(), at_rest()).with_store(Box::new(store.clone()));
    first.run_for(&RunParams::for_duration(2500.0).checkpoint_every(1000.0)).unwrap();
    store.remove_where(|name| name == "swarm-2.h5");

    let mut second = build(mantle(), at_rest()).with_store(Box::new(store.clone()));
    assert!(matches!(second.restart(&RestartRequest::at(2)), Err(LithosError::Restart(_))));
}

#[test]
fn last_restart_skips_checkpoints_without_swarm() {
    let store = MemoryStore::new();
    let mut first = build(mantle(), at_rest()).with_store(Box::new(store.clone()));
    let params = RunParams::for_duration(3500.0).checkpoint_every(1000.0).with_swarm_stride(2);
    first.run_for(&params).unwrap();
    assert!(store.exists("viscosity-3.h5"));
    assert!(!store.exists("swarm-3.h5"));

    let mut second = build(mantle(), at_rest()).with_store(Box::new(store.clone()));
    assert_eq!(second.restart(&RestartRequest::last()).unwrap(), Some(2));
    assert_eq!(second.clock.time, 2000.0);
    assert_eq!(second.clock.step, 2);

    // One back from the end among restartable checkpoints is 0.
    let mut third = build(mantle(), at_rest()).with_store(Box::new(store.clone()));
    assert_eq!(third.restart(&RestartRequest::at(-2)).unwrap(), Some(0));
}

#[test]
fn resumed_run_matches_uninterrupted_run() {
    let store = MemoryStore::new();
    let mut first = build(mantle(), at_rest()).with_store(Box::new(store.clone()));
    first.swarm.plastic_strain[5] = 0.2;
    first.run_for(&RunParams::for_duration(2000.0).checkpoint_every(1000.0)).unwrap();

    let mut resumed = build(mantle(), at_rest()).with_store(Box::new(store.clone()));
    let params = RunParams::for_duration(1500.0).checkpoint_every(1000.0).restart_from(RestartRequest::last());
    let tail = resumed.run_for(&params).unwrap();
    assert_eq!(tail.restarted_from, Some(2));

    let mut straight = build(mantle(), at_rest());
    straight.swarm.plastic_strain[5] = 0.2;
    let whole = straight.run_for(&RunParams::for_duration(3500.0).checkpoint_every(1000.0)).unwrap();

    assert_eq!(tail.time, whole.time);
    assert_eq!(resumed.clock.time, 3500.0);
    assert_eq!(resumed.clock.step, straight.clock.step);
    assert_eq!(resumed.clock.checkpoint_id, straight.clock.checkpoint_id);
    assert_eq!(resumed.particle_count(), straight.particle_count());
    assert_eq!(resumed.swarm.plastic_strain, straight.swarm.plastic_strain);
    let last = |s: &lithos_io::RunSummary| s.checkpoints.last().map(|c| (c.id, c.time));
    assert_eq!(last(&tail), last(&whole));
}

#[test]
fn restart_from_missing_directory_starts_fresh() {
    let tmp = tempfile::tempdir().unwrap();
    let mut model = build(mantle(), at_rest());
    let request = RestartRequest::last().in_dir(tmp.path().join("nothing-here"));
    assert_eq!(model.restart(&request).unwrap(), None);
    assert_eq!(model.clock.time, 0.0);
}

#[test]
fn run_resumes_from_directory_checkpoint() {
    let tmp = tempfile::tempdir().unwrap();
    let mut first = build(mantle(), at_rest()).with_store(Box::new(lithos_io::DirectoryStore::new(tmp.path())));
    first.run_for(&RunParams::for_duration(3500.0).checkpoint_every(1000.0)).unwrap();
    assert!(tmp.path().join("mesh.h5").is_file());
    assert!(tmp.path().join("XDMF.fields.00003.xmf").is_file());

    let mut second = build(mantle(), at_rest());
    let params = RunParams::for_duration(500.0).restart_from(RestartRequest::last().in_dir(tmp.path()));
    let summary = second.run_for(&params).unwrap();
    assert_eq!(summary.restarted_from, Some(3));
    assert_eq!(summary.time, 3500.0);
    assert_eq!(summary.steps, 1);
}

#[test]
fn restart_reloads_temperature() {
    let store = MemoryStore::new();
    let m = mesh();
    let mut first = hot_model().with_store(Box::new(store.clone()));
    first.run_for(&RunParams::for_duration(2000.0).checkpoint_every(1000.0)).unwrap();
    assert!(store.exists("temperature-2.h5"));

    let cold = ConductiveGeotherm::new(&m, 0.0, 100.0);
    let mut second = build(mantle().with_melt(melting()), at_rest())
        .with_store(Box::new(store.clone()))
        .with_thermal(Box::new(cold));
    second.restart(&RestartRequest::last()).unwrap();
    assert_eq!(second.solution.temperature, first.solution.temperature);
}

struct LaggingSurface;

impl SurfaceProcess for LaggingSurface {
    fn solve(&mut self, _swarm: &mut Swarm, _dt: f64) -> lithos_types::LithosResult<()> {
        Ok(())
    }

    fn model_time(&self) -> Option<f64> {
        Some(0.0)
    }
}

#[test]
fn restart_rejects_out_of_sync_surface_process() {
    let store = MemoryStore::new();
    let mut first = build(mantle(), at_rest()).with_store(Box::new(store.clone()));
    first.run_for(&RunParams::for_duration(2000.0).checkpoint_every(1000.0)).unwrap();

    let mut second =
        build(mantle(), at_rest()).with_store(Box::new(store.clone())).with_surface_process(Box::new(LaggingSurface));
    assert!(matches!(second.restart(&RestartRequest::last()), Err(LithosError::Restart(_))));
}

#[test]
fn workers_checkpoint_together() {
    let groups = LocalGroup::new(2);
    let counts: Vec<usize> = std::thread::scope(|s| {
        let handles: Vec<_> = groups
            .into_iter()
            .map(|group| {
                s.spawn(move || {
                    let mut model = build(mantle(), at_rest()).with_rendezvous(Box::new(group));
                    let summary = model.run_for(&RunParams::for_duration(2000.0).checkpoint_every(1000.0)).unwrap();
                    summary.checkpoints.len()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(counts, vec![3, 3]);
}

// ─── Configuration ────────────────────────────────────────────

#[test]
fn config_from_partial_toml() {
    let config: ModelConfig = toml::from_str(
        r#"
        name = "rift"
        cfl = 0.25
        min_viscosity = 1e18
        advection_diffusion = "slcn"

        [population]
        particles_per_cell_2d = 9
        "#,
    )
    .unwrap();
    assert_eq!(config.name, "rift");
    assert_eq!(config.cfl, 0.25);
    assert_eq!(config.max_viscosity, 1e25);
    assert_eq!(config.population.particles_per_cell_2d, 9);
    assert!(!config.advection_diffusion.limits_timestep());
    config.validate().unwrap();
}

#[test]
fn config_json_round_trip() {
    let config = ModelConfig::high_quality();
    let json = serde_json::to_string(&config).unwrap();
    let back: ModelConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);
}
