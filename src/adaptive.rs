//! Adaptive stepover modulation: slows the feed in a window
//! around each ring-to-ring bridge where the stitched curve is locally more
//! convoluted than the nominal stepover would predict — concave corners and
//! island-hugging bridges increase tool engagement there even though the
//! offset distance stayed constant.
//!
//! The window is `3 * stepover_mm` of arc length, centered on the bridge
//! point, matching the [`crate::stitch`] bridge index the window is keyed
//! off of.

use crate::float_types::Real;
use crate::geometry::Point;
use crate::overlay::Overlay;
use crate::stitch::Spiral;

/// Per-point feed override (`None` = full programmed feed) and the
/// [`Overlay::Slowdown`] markers describing where and why.
pub struct Modulation {
    pub feed_pct: Vec<Option<Real>>,
    pub overlays: Vec<Overlay>,
}

/// Compute feed overrides for `spiral`. `stepover_mm` is the nominal
/// radial stepover; `target_stepover_mm` is the stepover the adaptive
/// controller is trying to hold (`target_stepover`, defaults
/// to `stepover`). A window is flagged when its perimeter-to-chord ratio
/// exceeds what a straight run at the nominal stepover would produce by
/// more than the stepover/target-stepover headroom.
pub fn modulate(spiral: &Spiral, stepover_mm: Real, target_stepover_mm: Real, slowdown_feed_pct: Real) -> Modulation {
    let n = spiral.points.len();
    let mut feed_pct = vec![None; n];
    let mut overlays = Vec::new();

    if n < 2 || stepover_mm <= 0.0 {
        return Modulation { feed_pct, overlays };
    }

    let window_len = stepover_mm * 3.0;
    let engagement_threshold = (stepover_mm / target_stepover_mm.max(1e-9)).max(1.0);

    for &bridge in &spiral.bridges {
        let (lo, hi) = window_bounds(&spiral.points, bridge, window_len);
        let arc_len = arc_length(&spiral.points[lo..=hi]);
        let chord_len = (spiral.points[hi] - spiral.points[lo]).norm().max(1e-9);
        let ratio = arc_len / chord_len;

        if ratio > engagement_threshold {
            let at = spiral.points[bridge];
            overlays.push(Overlay::Slowdown {
                at,
                feed_pct: slowdown_feed_pct,
            });
            for f in feed_pct.iter_mut().take(hi + 1).skip(lo) {
                *f = Some(match *f {
                    Some(existing) => existing.min(slowdown_feed_pct),
                    None => slowdown_feed_pct,
                });
            }
        }
    }

    Modulation { feed_pct, overlays }
}

/// Indices `[lo, hi]` spanning `window_len` of arc length centered on
/// `center`, clamped to the point array's bounds.
fn window_bounds(points: &[Point], center: usize, window_len: Real) -> (usize, usize) {
    let half = window_len * 0.5;

    let mut lo = center;
    let mut acc = 0.0;
    while lo > 0 && acc < half {
        acc += (points[lo] - points[lo - 1]).norm();
        lo -= 1;
    }

    let mut hi = center;
    let mut acc = 0.0;
    while hi + 1 < points.len() && acc < half {
        acc += (points[hi + 1] - points[hi]).norm();
        hi += 1;
    }

    (lo, hi)
}

fn arc_length(points: &[Point]) -> Real {
    points.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point as P;

    fn zigzag_spiral() -> Spiral {
        // A sharp back-and-forth path around a single bridge at index 4,
        // giving a high perimeter/chord ratio in the bridge window.
        let points = vec![
            P::new(0.0, 0.0),
            P::new(1.0, 0.0),
            P::new(2.0, 0.0),
            P::new(3.0, 0.0),
            P::new(3.5, 1.0), // bridge
            P::new(4.0, 0.0),
            P::new(5.0, 0.0),
            P::new(6.0, 0.0),
            P::new(7.0, 0.0),
        ];
        Spiral {
            points,
            depth: 0,
            bridges: vec![4],
        }
    }

    #[test]
    fn high_engagement_bridge_slows_down() {
        let spiral = zigzag_spiral();
        let m = modulate(&spiral, 1.0, 1.0, 40.0);
        assert_eq!(m.overlays.len(), 1);
        assert!(m.feed_pct[4].is_some());
    }

    #[test]
    fn straight_run_has_no_slowdown() {
        let points = vec![
            P::new(0.0, 0.0),
            P::new(1.0, 0.0),
            P::new(2.0, 0.0),
            P::new(3.0, 0.0),
            P::new(4.0, 0.0),
        ];
        let spiral = Spiral {
            points,
            depth: 0,
            bridges: vec![2],
        };
        let m = modulate(&spiral, 1.0, 1.0, 40.0);
        assert!(m.overlays.is_empty());
        assert!(m.feed_pct.iter().all(|f| f.is_none()));
    }
}
