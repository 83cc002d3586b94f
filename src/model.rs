//! External configuration surface: `PlanInput`,
//! `PlanOutput`, and the small enums they carry. These are the only types
//! an external collaborator (HTTP layer, file upload handler, preset
//! storage) needs to construct or read.

use serde::{Deserialize, Serialize};

use crate::float_types::Real;
use crate::geometry::LoopSet;
use crate::machine::MachineProfile;
use crate::motion::Motion;
use crate::overlay::Overlay;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Units {
    Mm,
    Inch,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Strategy {
    #[default]
    Spiral,
    Lanes,
}

/// Closed configuration record for a single [`crate::planner::plan`] call.
/// Every tolerance and default is explicit here or derived
/// once into a [`crate::config::KernelConfig`] — nothing is read from a
/// module-level constant or environment.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlanInput {
    pub loops: LoopSet,
    pub units: Units,
    pub tool_d: Real,
    pub stepover: Real,
    pub target_stepover: Option<Real>,
    pub stepdown_mm: Real,
    pub z_rough: Real,
    pub safe_z: Real,
    pub margin: Real,
    pub strategy: Strategy,
    pub climb: bool,
    pub smoothing: Real,
    pub corner_radius_min: Real,
    pub use_trochoids: bool,
    pub trochoid_radius: Real,
    pub trochoid_radius_min: Real,
    pub trochoid_pitch: Real,
    pub slowdown_feed_pct: Real,
    pub feed_xy: Real,
    pub feed_z: Real,
    pub machine_profile: Option<MachineProfile>,
}

impl PlanInput {
    /// `target_stepover` defaults to `stepover`.
    pub fn effective_target_stepover(&self) -> Real {
        self.target_stepover.unwrap_or(self.stepover)
    }
}

/// Per-constraint histogram of cutting-motion counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CapsHistogram {
    pub feed_cap: usize,
    pub accel: usize,
    pub jerk: usize,
    pub none: usize,
}

impl CapsHistogram {
    pub fn total(&self) -> usize {
        self.feed_cap + self.accel + self.jerk + self.none
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PlanStats {
    pub length_mm: Real,
    pub time_s: Real,
    pub move_count: usize,
    pub area_mm2: Real,
    pub volume_mm3: Real,
    pub caps_histogram: CapsHistogram,
}

/// The complete result of a [`crate::planner::plan`] call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlanOutput {
    pub motions: Vec<Motion>,
    pub stats: PlanStats,
    pub overlays: Vec<Overlay>,
}
