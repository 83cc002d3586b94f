//! Shared scalar type and numeric constants used throughout the kernel.
//!
//! The kernel always operates in a single consistent user unit (millimeters
//! or inches, chosen once per [`crate::model::PlanInput`]); there is no
//! per-build f32/f64 switch, since nothing here interfaces with an
//! f32-only renderer.

/// Our scalar type.
pub type Real = f64;

/// Base tolerance for geometric degeneracy checks, before scaling by the
/// bounding-box size (see [`crate::config::KernelConfig::eps`]).
pub const BASE_EPSILON: Real = 1e-9;

// Pi
/// Archimedes' constant (π)
pub const PI: Real = core::f64::consts::PI;

// Frac Pi 2
/// π/2
pub const FRAC_PI_2: Real = core::f64::consts::FRAC_PI_2;

// Tau
/// The full circle constant (τ)
pub const TAU: Real = core::f64::consts::TAU;

// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
// Unit conversion
// ~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~~
/// Millimeters per inch, used to convert stats between [`crate::model::Units`] systems.
pub const MM_PER_INCH: Real = 25.4;
