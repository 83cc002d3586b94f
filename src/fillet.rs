//! Corner filleting: sharp convex vertices whose discrete
//! curvature implies a tighter radius than `corner_radius_min` are replaced
//! by a tangent circular arc of exactly `corner_radius_min`, recorded as a
//! [`Overlay::Fillet`]. Reflex vertices (concave, from the tool's point of
//! view) and near-collinear vertices are left untouched — rounding them
//! would change the cut geometry rather than just smoothing a sharp turn.
//!
//! Operates on an already-stitched, open polyline (one continuous spiral),
//! not a closed ring: only interior vertices are candidates, since the
//! polyline's own start/end are where a rapid/plunge bracket attaches, not
//! a cut corner.

use crate::float_types::Real;
use crate::geometry::{Point, PathElement};
use crate::overlay::Overlay;

/// Walk `points` (an open polyline) and replace each sharp convex interior
/// vertex with a tangent arc of radius `corner_radius_min`. Returns the
/// curve as a sequence of [`PathElement::Line`]/[`PathElement::Arc`]
/// segments, paired with one [`Overlay::Fillet`] per corner touched.
/// `ccw` is the polyline's nominal traversal direction (climb vs.
/// conventional), used to tell convex turns from reflex ones.
pub fn fillet_polyline(points: &[Point], ccw: bool, corner_radius_min: Real) -> (Vec<PathElement>, Vec<Overlay>) {
    let n = points.len();
    let mut overlays = Vec::new();
    if n < 3 || corner_radius_min <= 0.0 {
        return (as_lines(points), overlays);
    }

    let mut out: Vec<PathElement> = Vec::with_capacity(n);
    let mut cursor = points[0];

    for i in 1..n - 1 {
        let a = points[i - 1];
        let b = points[i];
        let c = points[i + 1];

        match corner_fillet(a, b, c, corner_radius_min, ccw) {
            Some(fc) if edge_long_enough(cursor, b, fc.tangent_len) && edge_long_enough(b, c, fc.tangent_len) => {
                out.push(PathElement::Line { p0: cursor, p1: fc.t1 });
                out.push(PathElement::Arc {
                    center: fc.center,
                    radius: corner_radius_min,
                    start_angle: fc.start_angle,
                    end_angle: fc.end_angle,
                    ccw: fc.ccw,
                });
                overlays.push(Overlay::Fillet { at: b, radius: corner_radius_min });
                cursor = fc.t2;
            },
            _ => {
                out.push(PathElement::Line { p0: cursor, p1: b });
                cursor = b;
            },
        }
    }
    out.push(PathElement::Line { p0: cursor, p1: points[n - 1] });

    (out, overlays)
}

fn as_lines(points: &[Point]) -> Vec<PathElement> {
    points
        .windows(2)
        .map(|w| PathElement::Line { p0: w[0], p1: w[1] })
        .collect()
}

fn edge_long_enough(p0: Point, p1: Point, needed: Real) -> bool {
    (p1 - p0).norm() > needed * 2.0
}

struct FilletCorner {
    t1: Point,
    t2: Point,
    center: Point,
    start_angle: Real,
    end_angle: Real,
    ccw: bool,
    tangent_len: Real,
}

/// Construct the tangent-arc fillet at vertex `b` between incoming edge
/// `a->b` and outgoing edge `b->c`, if `b` is a convex corner (relative to
/// the polyline's traversal direction `path_ccw`) tighter than `radius`.
/// Returns `None` for reflex or already-gentle corners.
fn corner_fillet(a: Point, b: Point, c: Point, radius: Real, path_ccw: bool) -> Option<FilletCorner> {
    let d1 = (b - a).try_normalize(1e-12)?;
    let d2 = (c - b).try_normalize(1e-12)?;

    let turn = d1.x * d2.y - d1.y * d2.x; // sin(turn angle), signed
    let convex = if path_ccw { turn > 1e-9 } else { turn < -1e-9 };
    if !convex {
        return None;
    }

    // interior angle between the reversed incoming ray and the outgoing ray
    let cos_interior = (-d1).dot(&d2).clamp(-1.0, 1.0);
    let interior = cos_interior.acos();
    if interior >= crate::float_types::PI - 1e-6 || interior <= 1e-6 {
        return None; // straight or fully folded back, nothing to fillet
    }
    let half = interior * 0.5;
    let tangent_len = radius / half.tan();
    let center_dist = radius / half.sin();

    let bisector = (-d1 + d2).try_normalize(1e-12)?;
    let center = b + bisector * center_dist;

    let t1 = b - d1 * tangent_len;
    let t2 = b + d2 * tangent_len;

    let start_angle = (t1 - center).y.atan2((t1 - center).x);
    let end_angle = (t2 - center).y.atan2((t2 - center).x);
    let sweep_ccw = path_ccw; // convex corner in a CCW traversal fillets with a CCW arc

    Some(FilletCorner {
        t1,
        t2,
        center,
        start_angle,
        end_angle,
        ccw: sweep_ccw,
        tangent_len,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point as P;

    fn sharp_square(side: Real) -> Vec<Point> {
        vec![
            P::new(0.0, 0.0),
            P::new(side, 0.0),
            P::new(side, side),
            P::new(0.0, side),
            P::new(0.0, 0.0),
        ]
    }

    #[test]
    fn sharp_right_angle_corners_get_filleted() {
        let pts = sharp_square(40.0);
        let (elements, overlays) = fillet_polyline(&pts, true, 2.0);
        // interior vertices: (side,0), (side,side), (0,side) -- 3 candidates
        // on an open chain (the shared start/end vertex isn't a candidate).
        assert_eq!(overlays.len(), 3);
        assert!(elements.iter().any(|e| matches!(e, PathElement::Arc { .. })));
    }

    #[test]
    fn radius_larger_than_half_edge_skips_fillet() {
        let pts = sharp_square(2.0);
        let (elements, overlays) = fillet_polyline(&pts, true, 5.0);
        assert!(overlays.is_empty());
        assert!(elements.iter().all(|e| matches!(e, PathElement::Line { .. })));
    }

    #[test]
    fn reflex_corner_is_left_alone() {
        // An L-shape has one reflex vertex at (10,10).
        let pts = vec![
            P::new(0.0, 0.0),
            P::new(20.0, 0.0),
            P::new(20.0, 10.0),
            P::new(10.0, 10.0),
            P::new(10.0, 20.0),
            P::new(0.0, 20.0),
        ];
        let (_elements, overlays) = fillet_polyline(&pts, true, 1.0);
        // Convex interior corners get filleted; the reflex corner at
        // (10,10) and the two open-chain endpoints do not.
        assert!(overlays.iter().all(|o| o.at() != P::new(10.0, 10.0)));
        assert_eq!(overlays.len(), 3);
    }

    #[test]
    fn short_polyline_is_left_as_lines() {
        let pts = vec![P::new(0.0, 0.0), P::new(1.0, 0.0)];
        let (elements, overlays) = fillet_polyline(&pts, true, 1.0);
        assert!(overlays.is_empty());
        assert_eq!(elements.len(), 1);
    }
}
