//! Diagnostic overlays: annotations alongside
//! the motion list describing *why* the planner did something, for a
//! viewer to draw over the toolpath. Purely informational — the planner
//! never reads these back.

use serde::{Deserialize, Serialize};

use crate::float_types::Real;
use crate::geometry::Point;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Overlay {
    /// A corner fillet was inserted at `at` with the given radius.
    Fillet { at: Point, radius: Real },
    /// A tight-radius region remains below `corner_radius_min` after
    /// filleting/trochoiding, flagged for operator attention.
    TightRadius { at: Point, radius: Real },
    /// The adaptive stepover modulator reduced feed to `feed_pct` percent
    /// of programmed feed at `at`.
    Slowdown { at: Point, feed_pct: Real },
    /// A trochoidal relief arc was inserted centered at `at`.
    TrochoidCenter { at: Point, radius: Real },
}

impl Overlay {
    pub fn at(&self) -> Point {
        match self {
            Overlay::Fillet { at, .. }
            | Overlay::TightRadius { at, .. }
            | Overlay::Slowdown { at, .. }
            | Overlay::TrochoidCenter { at, .. } => *at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_reports_its_location() {
        let o = Overlay::Fillet {
            at: Point::new(1.0, 2.0),
            radius: 0.5,
        };
        assert_eq!(o.at(), Point::new(1.0, 2.0));
    }
}
