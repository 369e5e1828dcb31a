//! Physical constants and simulation defaults.

use crate::scalar::Scalar;

/// Hard floor applied to strain-rate invariants before dividing by them.
///
/// A numerical guard only. Not to be confused with [`DEFAULT_STRAIN_RATE`].
pub const STRAIN_RATE_FLOOR: Scalar = 1.0e-20;

/// Strain-rate invariant assumed before any velocity solution exists (1/s).
pub const DEFAULT_STRAIN_RATE: Scalar = 1.0e-15;

/// Universal gas constant (J/(mol·K)).
pub const GAS_CONSTANT: Scalar = 8.314_462_618;

/// Gravitational acceleration (m/s²).
pub const GRAVITY: Scalar = 9.81;

/// Default Courant number used by the timestep selector.
pub const DEFAULT_CFL: Scalar = 0.5;

/// Default lower viscosity bound (Pa·s).
pub const DEFAULT_MIN_VISCOSITY: Scalar = 1.0e19;

/// Default upper viscosity bound (Pa·s).
pub const DEFAULT_MAX_VISCOSITY: Scalar = 1.0e25;

/// Default thermal diffusivity (m²/s).
pub const DEFAULT_DIFFUSIVITY: Scalar = 1.0e-6;

/// Fraction of the smallest elastic observation time allowed as a timestep.
pub const ELASTIC_DT_FRACTION: Scalar = 1.0 / 3.0;

/// Maximum accepted time mismatch between independently checkpointed
/// subsystems on restart (model time units).
pub const RESTART_TIME_TOLERANCE: Scalar = 1.0;

/// Relative tolerance used when testing whether the clock reached a
/// scheduled checkpoint time.
pub const CHECKPOINT_TIME_RTOL: Scalar = 1.0e-12;

/// Material index reserved for the background (the model itself).
pub const BACKGROUND_MATERIAL: u32 = 0;
