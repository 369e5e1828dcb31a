//! Integration tests for lithos-types.

use lithos_types::constants::{DEFAULT_STRAIN_RATE, STRAIN_RATE_FLOOR};
use lithos_types::{Dimension, LithosError, MaterialId, ParticleId, Scaling, SymTensor};

// ─── ID Tests ──────────────────────────────────────────────────

#[test]
fn particle_id_index() {
    let id = ParticleId(42);
    assert_eq!(id.index(), 42);
}

#[test]
fn background_material_is_zero() {
    assert_eq!(MaterialId::BACKGROUND, MaterialId(0));
    assert!(MaterialId(0).is_background());
    assert!(!MaterialId(3).is_background());
}

#[test]
fn ids_are_serializable() {
    let id = MaterialId(7);
    let json = serde_json::to_string(&id).unwrap();
    let deserialized: MaterialId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, deserialized);
}

// ─── Error Tests ──────────────────────────────────────────────

#[test]
fn error_display() {
    let err = LithosError::Configuration("viscosity undefined for elastic material crust".into());
    assert!(err.to_string().contains("viscosity undefined"));
}

#[test]
fn missing_field_display_names_material() {
    let err = LithosError::MissingField { material: MaterialId(2), field: "temperature" };
    let msg = err.to_string();
    assert!(msg.contains("#2"));
    assert!(msg.contains("temperature"));
}

#[test]
fn io_error_converts() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err: LithosError = io.into();
    assert!(matches!(err, LithosError::Io(_)));
}

// ─── Constant Tests ───────────────────────────────────────────

#[test]
fn strain_rate_floor_is_distinct_from_default() {
    assert!(STRAIN_RATE_FLOOR < DEFAULT_STRAIN_RATE);
    assert_eq!(STRAIN_RATE_FLOOR, 1e-20);
}

// ─── Tensor Tests ─────────────────────────────────────────────

#[test]
fn stress_component_counts() {
    assert_eq!(Dimension::Two.components(), 3);
    assert_eq!(Dimension::Three.components(), 6);
    assert_eq!(SymTensor::ZERO.components(Dimension::Three).len(), 6);
}

#[test]
fn second_invariant_3d_uniaxial() {
    let t = SymTensor::new_3d(2.0, 0.0, 0.0, 0.0, 0.0, 0.0);
    let expected = (0.5f64 * 4.0).sqrt();
    assert!((t.second_invariant(Dimension::Three) - expected).abs() < 1e-12);
}

#[test]
fn tensor_arithmetic() {
    let a = SymTensor::new_2d(1.0, 2.0, 3.0);
    let b = a * 2.0;
    assert_eq!(b, SymTensor::new_2d(2.0, 4.0, 6.0));
    assert_eq!(b - a, a);
    assert_eq!(a + a, b);
}

// ─── Scaling Tests ────────────────────────────────────────────

#[test]
fn identity_scaling_passes_through() {
    let s = Scaling::identity();
    assert_eq!(s.nd(123.0, lithos_types::units::Dimensions::VISCOSITY), 123.0);
}

#[test]
fn invalid_scaling_rejected() {
    let s = Scaling { length: 0.0, ..Scaling::identity() };
    assert!(s.validate().is_err());
}
