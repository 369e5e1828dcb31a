//! Integration tests for lithos-material.

use lithos_material::{
    Capability, DensityLaw, DruckerPrager, Elasticity, Material, MaterialLibrary, MaterialRegistry,
    MeltWeakening, PhaseChange, PhaseTrigger, PlasticityLaw, PointState, Shape, ViscosityLaw,
};
use lithos_types::{Dimension, LithosError, MaterialId};

// ─── Registry Tests ──────────────────────────────────────────

#[test]
fn background_always_has_index_zero() {
    let mut bg = Material::new("Model");
    bg.index = MaterialId(7);
    let reg = MaterialRegistry::new(bg);
    assert_eq!(reg.background().index, MaterialId::BACKGROUND);
    assert_eq!(reg.len(), 1);
}

#[test]
fn auto_indices_are_sequential_and_unique() {
    let mut reg = MaterialRegistry::default();
    let a = reg.add(Material::new("a"), None).unwrap();
    let b = reg.add(Material::new("b"), None).unwrap();
    assert_eq!(a, MaterialId(1));
    assert_eq!(b, MaterialId(2));
    let names: Vec<&str> = reg.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Model", "a", "b"]);
}

#[test]
fn explicit_index_collision_is_rejected() {
    let mut reg = MaterialRegistry::default();
    reg.add(Material::new("a"), Some(MaterialId(5))).unwrap();
    let err = reg.add(Material::new("b"), Some(MaterialId(5))).unwrap_err();
    assert!(matches!(err, LithosError::DuplicateMaterial(MaterialId(5))));
    // Auto index skips past explicit ones.
    assert_eq!(reg.add(Material::new("c"), None).unwrap(), MaterialId(6));
}

#[test]
fn lookup_of_missing_index_fails() {
    let reg = MaterialRegistry::default();
    assert!(matches!(reg.get(MaterialId(3)), Err(LithosError::MaterialNotFound(MaterialId(3)))));
}

#[test]
fn thermal_properties_inherit_from_background() {
    let bg = Material::new("Model").with_diffusivity(2e-6).with_heating(1000.0, 1e-6);
    let mut reg = MaterialRegistry::new(bg);
    let id = reg.add(Material::new("crust").with_diffusivity(1e-6), None).unwrap();
    let m = reg.get(id).unwrap();
    assert_eq!(m.diffusivity, Some(1e-6));
    assert_eq!(m.capacity, Some(1000.0));
    assert_eq!(m.radiogenic_heat_production, Some(1e-6));
}

#[test]
fn capability_queries() {
    let mut reg = MaterialRegistry::default();
    assert!(!reg.any(Capability::Elasticity));
    reg.add(
        Material::new("elastic")
            .with_viscosity(ViscosityLaw::constant(1e21))
            .with_elasticity(Elasticity::new(1e10, 1e10)),
        None,
    )
    .unwrap();
    assert!(reg.any(Capability::Elasticity));
    assert!(!reg.any(Capability::Melt));
}

// ─── Validation Tests ────────────────────────────────────────

#[test]
fn elasticity_without_viscosity_is_a_configuration_error() {
    let m = Material::new("bad").with_elasticity(Elasticity::new(1e10, 1e10));
    assert!(matches!(m.validate(), Err(LithosError::Configuration(_))));
}

#[test]
fn stress_limiter_without_plasticity_is_a_configuration_error() {
    let m = Material::new("bad").with_viscosity(ViscosityLaw::constant(1e21)).with_stress_limiter(1e8);
    assert!(matches!(m.validate(), Err(LithosError::Configuration(_))));
}

#[test]
fn presets_are_valid() {
    let lib = MaterialLibrary::with_defaults();
    for name in lib.names() {
        assert!(lib.get(name).unwrap().validate().is_ok(), "{name}");
    }
}

// ─── Law Tests ───────────────────────────────────────────────

#[test]
fn melt_weakening_is_continuous_at_breakpoints() {
    let w = MeltWeakening::new(1e-2, 0.1, 0.3);
    assert!((w.multiplier(0.1) - 1.0).abs() < 1e-12);
    assert!((w.multiplier(0.3) - 1e-2).abs() < 1e-12);
    assert!((w.multiplier(0.1 - 1e-12) - 1.0).abs() < 1e-9);
    assert!((w.multiplier(0.3 + 1e-12) - 1e-2).abs() < 1e-9);
    // Monotonic between.
    let mut prev = w.multiplier(0.0);
    for i in 1..=40 {
        let m = w.multiplier(i as f64 * 0.01);
        assert!(m <= prev + 1e-15);
        prev = m;
    }
}

#[test]
fn linear_density_depends_on_temperature() {
    let law = DensityLaw::linear(3300.0);
    let cold = PointState { temperature: Some(273.15), ..Default::default() };
    let hot = PointState { temperature: Some(1273.15), ..Default::default() };
    let rho_cold = law.evaluate(MaterialId(1), &cold).unwrap();
    let rho_hot = law.evaluate(MaterialId(1), &hot).unwrap();
    assert!((rho_cold - 3300.0).abs() < 1e-9);
    assert!((rho_hot - 3300.0 * (1.0 - 3e-5 * 1000.0)).abs() < 1e-9);
}

#[test]
fn drucker_prager_3d_exceeds_2d_for_positive_friction() {
    let dp = DruckerPrager::new(10e6, 0.6);
    let y2 = dp.yield_stress(Dimension::Two, 1e8, 0.0);
    let y3 = dp.yield_stress(Dimension::Three, 1e8, 0.0);
    assert!(y2 > 0.0 && y3 > 0.0);
    assert!((y2 - y3).abs() > 1.0);
}

#[test]
fn phase_trigger_region() {
    let change = PhaseChange::new(
        PhaseTrigger::Region { shape: Shape::layer(0.0, -10.0) },
        MaterialId(2),
    );
    let inside = PointState { position: [0.0, -5.0, 0.0], ..Default::default() };
    let outside = PointState { position: [0.0, 5.0, 0.0], ..Default::default() };
    assert!(change.trigger.fires(&inside, Dimension::Two));
    assert!(!change.trigger.fires(&outside, Dimension::Two));
}

#[test]
fn temperature_trigger_never_fires_without_temperature() {
    let t = PhaseTrigger::TemperatureAbove { temperature: 0.0 };
    assert!(!t.fires(&PointState::default(), Dimension::Two));
}

// ─── Serialization Tests ─────────────────────────────────────

#[test]
fn material_from_toml() {
    let src = r#"
        name = "crust"
        healing_rate = 1e-15

        [density]
        type = "linear"
        reference_density = 2700.0

        [viscosity]
        type = "constant"
        viscosity = 1e22

        [plasticity]
        type = "von_mises"
        yield_stress = 1e8

        [shape]
        type = "layer"
        top = 0.0
        bottom = -30e3
    "#;
    let m: Material = toml::from_str(src).unwrap();
    assert_eq!(m.name, "crust");
    assert!(m.has(Capability::Density));
    assert!(m.has(Capability::Healing));
    assert_eq!(m.plasticity, Some(PlasticityLaw::von_mises(1e8)));
    assert!(matches!(m.shape, Some(Shape::Layer { .. })));
    assert!(m.validate().is_ok());
}

#[test]
fn material_json_preserves_laws() {
    let m = Material::new("x")
        .with_viscosity(ViscosityLaw::constant(1e21))
        .with_plasticity(PlasticityLaw::DruckerPrager(DruckerPrager::new(1e7, 0.5)));
    let json = serde_json::to_string(&m).unwrap();
    let back: Material = serde_json::from_str(&json).unwrap();
    assert_eq!(back, m);
}
