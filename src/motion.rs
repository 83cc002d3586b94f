//! Motion primitives and the linker that sequences them. `Motion` is a
//! tagged enum per move kind rather than an `is_rapid` flag plus an
//! untyped scalar field.

use serde::{Deserialize, Serialize};

use crate::float_types::Real;
use crate::geometry::Point;

/// Which physical limit bounded a cutting move's feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindingConstraint {
    FeedCap,
    Accel,
    Jerk,
    None,
}

/// Per-move metadata attached by the estimator; absent
/// (`None` fields) until [`crate::estimator`] has run.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct MotionMeta {
    pub binding_constraint: Option<BindingConstraint>,
    /// Override feed as a percentage of the requested cutting feed, set by
    /// the adaptive stepover modulator on tight-engagement segments
    /// `None` means "use the full programmed feed".
    pub feed_pct: Option<Real>,
    /// Estimated traversal time in seconds, set by the estimator.
    pub time_s: Option<Real>,
}

impl MotionMeta {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A single G-code-equivalent move. `Rapid` is G0, `Linear`
/// is G1, `Arc` is G2/G3 with `ccw` selecting the direction. The kernel is
/// 2.5D: `to` is the XY endpoint and `z` the depth-layer (or retract)
/// height it runs at, so a pure plunge/retract is a move whose `to` repeats
/// the previous XY position with a different `z`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Motion {
    Rapid {
        to: Point,
        z: Real,
        meta: MotionMeta,
    },
    Linear {
        to: Point,
        z: Real,
        feed: Real,
        meta: MotionMeta,
    },
    Arc {
        to: Point,
        z: Real,
        center: Point,
        ccw: bool,
        feed: Real,
        meta: MotionMeta,
    },
}

impl Motion {
    pub fn end(&self) -> Point {
        match self {
            Motion::Rapid { to, .. } | Motion::Linear { to, .. } | Motion::Arc { to, .. } => *to,
        }
    }

    pub fn z(&self) -> Real {
        match self {
            Motion::Rapid { z, .. } | Motion::Linear { z, .. } | Motion::Arc { z, .. } => *z,
        }
    }

    pub fn is_rapid(&self) -> bool {
        matches!(self, Motion::Rapid { .. })
    }

    pub fn meta(&self) -> &MotionMeta {
        match self {
            Motion::Rapid { meta, .. } | Motion::Linear { meta, .. } | Motion::Arc { meta, .. } => meta,
        }
    }

    pub fn meta_mut(&mut self) -> &mut MotionMeta {
        match self {
            Motion::Rapid { meta, .. } | Motion::Linear { meta, .. } | Motion::Arc { meta, .. } => meta,
        }
    }

    /// Programmed feed for the move; rapids report the machine's rapid
    /// rate is unknown at this layer, so `None`.
    pub fn feed(&self) -> Option<Real> {
        match self {
            Motion::Rapid { .. } => None,
            Motion::Linear { feed, .. } | Motion::Arc { feed, .. } => Some(*feed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_motion_reports_its_endpoint() {
        let m = Motion::Linear {
            to: Point::new(3.0, 4.0),
            z: -2.0,
            feed: 600.0,
            meta: MotionMeta::new(),
        };
        assert_eq!(m.end(), Point::new(3.0, 4.0));
        assert_eq!(m.z(), -2.0);
        assert!(!m.is_rapid());
        assert_eq!(m.feed(), Some(600.0));
    }

    #[test]
    fn rapid_has_no_feed() {
        let m = Motion::Rapid {
            to: Point::new(0.0, 0.0),
            z: 10.0,
            meta: MotionMeta::new(),
        };
        assert!(m.is_rapid());
        assert_eq!(m.feed(), None);
    }
}
