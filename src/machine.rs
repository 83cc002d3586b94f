//! Machine profile input. The kernel reads `limits`; the
//! other fields are advisory and passed through untouched.

use serde::{Deserialize, Serialize};

use crate::float_types::Real;

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Limits {
    pub feed_xy: Real,
    pub feed_z: Real,
    pub rapid: Real,
    pub accel: Real,
    pub jerk: Real,
    pub corner_tol: Real,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Axes {
    pub travel: Real,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Spindle {
    pub min_rpm: Real,
    pub max_rpm: Real,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MachineProfile {
    pub limits: Limits,
    pub axes: Axes,
    pub spindle: Spindle,
    pub safe_z_default: Real,
    pub post_id_default: u32,
}

impl MachineProfile {
    /// Default profile used when [`crate::model::PlanInput::machine_profile`]
    /// is absent: accel/jerk default to (800 mm/s², 2000 mm/s³),
    /// feed caps taken from the requested cutting feeds (so the estimator
    /// never artificially caps an unconfigured machine).
    pub fn defaults_for(feed_xy: Real, feed_z: Real) -> MachineProfile {
        MachineProfile {
            limits: Limits {
                feed_xy,
                feed_z,
                rapid: feed_xy.max(feed_z) * 4.0,
                accel: 800.0,
                jerk: 2000.0,
                corner_tol: 0.02,
            },
            axes: Axes { travel: 1_000.0 },
            spindle: Spindle {
                min_rpm: 1_000.0,
                max_rpm: 24_000.0,
            },
            safe_z_default: 10.0,
            post_id_default: 0,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let l = &self.limits;
        if l.feed_xy <= 0.0 || l.feed_z <= 0.0 || l.rapid <= 0.0 {
            return Err("feed limits must be positive".into());
        }
        if l.accel <= 0.0 || l.jerk <= 0.0 {
            return Err("accel and jerk limits must be positive".into());
        }
        Ok(())
    }
}
