//! Derived, once-computed configuration: every tolerance and default is an
//! explicit value rather than a module-level constant.
//! [`KernelConfig`] is computed once at the top of
//! [`crate::planner::plan`] and threaded by reference into every
//! downstream component; nothing here is read from a global.

use crate::float_types::{BASE_EPSILON, Real};
use crate::machine::MachineProfile;
use crate::model::PlanInput;

#[derive(Clone, Debug)]
pub struct KernelConfig {
    /// Degeneracy tolerance: `BASE_EPSILON * max(bbox dimension)`.
    pub eps: Real,
    /// Absolute radial stepover in user units (`stepover` fraction × `tool_d`).
    pub stepover_mm: Real,
    /// Absolute target stepover for the adaptive modulator.
    pub target_stepover_mm: Real,
    /// Sampler target chord length.
    pub target_chord: Real,
    /// Number of Z depth layers.
    pub depth_layers: usize,
    /// Machine profile in effect (explicit or defaulted).
    pub machine: MachineProfile,
}

impl KernelConfig {
    pub fn derive(input: &PlanInput, bbox_max_dim: Real) -> KernelConfig {
        let eps = BASE_EPSILON * bbox_max_dim.max(1.0);
        let stepover_mm = input.stepover * input.tool_d;
        let target_stepover_mm = input.effective_target_stepover() * input.tool_d;
        let target_chord = (stepover_mm * 0.5).min(input.tool_d * 0.25);
        let depth_layers = (input.z_rough.abs() / input.stepdown_mm).ceil().max(1.0) as usize;
        let machine = input
            .machine_profile
            .unwrap_or_else(|| MachineProfile::defaults_for(input.feed_xy, input.feed_z));
        KernelConfig {
            eps,
            stepover_mm,
            target_stepover_mm,
            target_chord,
            depth_layers,
            machine,
        }
    }
}
