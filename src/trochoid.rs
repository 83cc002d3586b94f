//! Trochoidal relief: at vertices of the filleted curve whose
//! local curvature implies a radius tighter than `trochoid_radius_min`, a
//! small circular relief loop replaces the tight sub-path so the tool
//! never has to turn tighter than the relief radius there. When trochoids
//! are disabled, or the configured relief radius still doesn't clear the
//! floor, the hotspot is instead flagged with [`Overlay::TightRadius`] for
//! the operator, and the sub-path is left untouched.

use crate::float_types::{PI, Real, TAU};
use crate::geometry::{PathElement, Point, Vector, discrete_curvature};
use crate::overlay::Overlay;

pub struct TrochoidResult {
    pub elements: Vec<PathElement>,
    pub overlays: Vec<Overlay>,
}

/// Scan `elements` (an open, already-filleted curve) for curvature
/// hotspots at `Line`-`Line` joins and splice in relief loops or flag
/// them, per the module docs. Arc elements (already-smoothed fillets) are
/// passed through untouched, since they can't be a curvature hotspot.
#[allow(clippy::too_many_arguments)]
pub fn insert_trochoids(
    elements: &[PathElement],
    use_trochoids: bool,
    trochoid_radius: Real,
    trochoid_radius_min: Real,
    trochoid_pitch: Real,
    corner_radius_min: Real,
) -> TrochoidResult {
    let mut out = Vec::with_capacity(elements.len());
    let mut overlays = Vec::new();
    let mut last_relief_center: Option<Point> = None;

    let mut i = 0;
    while i < elements.len() {
        if let Some((a, b, c)) = line_line_join(elements, i) {
            let k = discrete_curvature(a, b, c);
            let radius = if k > 0.0 { 1.0 / k } else { Real::INFINITY };

            if k > 0.0 && radius < trochoid_radius_min {
                if !use_trochoids {
                    overlays.push(Overlay::TightRadius { at: b, radius });
                    out.push(elements[i].clone());
                    i += 1;
                    continue;
                }

                let (relief, center) = relief_loop(a, b, c, trochoid_radius, trochoid_pitch, &mut last_relief_center);
                out.extend(relief);
                overlays.push(Overlay::TrochoidCenter { at: center, radius: trochoid_radius });
                if trochoid_radius < corner_radius_min {
                    overlays.push(Overlay::TightRadius { at: b, radius: trochoid_radius });
                }
                // The run this hotspot belonged to is replaced by the two
                // lines either side of the loop, consuming both the
                // incoming and outgoing Line elements that shared `b`.
                i += 2;
                continue;
            }
        }
        out.push(elements[i].clone());
        i += 1;
    }

    TrochoidResult { elements: out, overlays }
}

/// If `elements[i]` and `elements[i+1]` are two `Line`s sharing an
/// endpoint, return the `(a, b, c)` triple for curvature testing at that
/// shared vertex `b`.
fn line_line_join(elements: &[PathElement], i: usize) -> Option<(Point, Point, Point)> {
    if i + 1 >= elements.len() {
        return None;
    }
    match (&elements[i], &elements[i + 1]) {
        (PathElement::Line { p0: a, p1: b }, PathElement::Line { p0: b2, p1: c }) if (*b - *b2).norm() < 1e-9 => {
            Some((*a, *b, *c))
        },
        _ => None,
    }
}

/// Replace the tight `a -> b -> c` sub-path with a line into the relief
/// circle, a full-circle loop (as two half-circle arcs, so the move has a
/// distinct start/end point for G2/G3), and a line back out to `c`. The
/// hotspot vertex `b` is visited exactly once, as the circle's tangent
/// point, instead of being retained as a sharp waypoint either side of the
/// loop.
///
/// Successive hotspots in a run are advanced by `trochoid_pitch` along the
/// local tangent direction so their relief loops don't stack on top of
/// each other.
fn relief_loop(
    a: Point,
    b: Point,
    c: Point,
    radius: Real,
    pitch: Real,
    last_center: &mut Option<Point>,
) -> (Vec<PathElement>, Point) {
    let mut center = relief_center(a, b, c, radius);
    let advance = (c - b).try_normalize(1e-12).unwrap_or(Vector::new(1.0, 0.0));
    if let Some(prev) = *last_center {
        if (center - prev).norm() < pitch {
            center = prev + advance * pitch;
        }
    }
    *last_center = Some(center);

    // `b` need not sit exactly on this (possibly pitch-advanced) circle;
    // enter/exit at the point on the circle nearest to `b` instead.
    let to_b = (b - center).try_normalize(1e-12).unwrap_or(Vector::new(1.0, 0.0));
    let entry = center + to_b * radius;
    let entry_angle = to_b.y.atan2(to_b.x);

    let elements = vec![
        PathElement::Line { p0: a, p1: entry },
        PathElement::Arc {
            center,
            radius,
            start_angle: entry_angle,
            end_angle: entry_angle + PI,
            ccw: true,
        },
        PathElement::Arc {
            center,
            radius,
            start_angle: entry_angle + PI,
            end_angle: entry_angle + TAU,
            ccw: true,
        },
        PathElement::Line { p0: entry, p1: c },
    ];
    (elements, center)
}

/// Center of the relief circle: offset from the hotspot vertex along the
/// outward bisector of the incoming/outgoing directions, by `radius`.
fn relief_center(a: Point, b: Point, c: Point, radius: Real) -> Point {
    let d1 = (b - a).try_normalize(1e-12).unwrap_or(Vector::new(1.0, 0.0));
    let d2 = (c - b).try_normalize(1e-12).unwrap_or(Vector::new(1.0, 0.0));
    let bisector = (d1 + d2).try_normalize(1e-12).unwrap_or(Vector::new(0.0, 1.0));
    // Perpendicular to the path's average direction, pointing away from the
    // turn, is a safer relief direction than the turn's own bisector: it
    // keeps the loop clear of the just-cut material on the inside.
    let outward = Vector::new(-bisector.y, bisector.x);
    b + outward * radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point as P;

    fn as_lines(points: &[Point]) -> Vec<PathElement> {
        points
            .windows(2)
            .map(|w| PathElement::Line { p0: w[0], p1: w[1] })
            .collect()
    }

    fn sharp_corner_elements() -> Vec<PathElement> {
        as_lines(&[
            P::new(0.0, 0.0),
            P::new(10.0, 0.0),
            P::new(10.0, 0.2), // very tight turn
            P::new(0.0, 0.2),
        ])
    }

    #[test]
    fn tight_corner_with_trochoids_enabled_gets_a_relief_loop() {
        let elements = sharp_corner_elements();
        let r = insert_trochoids(&elements, true, 1.0, 5.0, 0.5, 1.0);
        assert!(r.elements.iter().any(|e| matches!(e, PathElement::Arc { .. })));
        assert!(r
            .overlays
            .iter()
            .any(|o| matches!(o, Overlay::TrochoidCenter { .. })));
        // The original sharp vertex no longer appears as a Line-Line join.
        assert!((0..r.elements.len()).all(|i| line_line_join(&r.elements, i).is_none()));
    }

    #[test]
    fn tight_corner_with_trochoids_disabled_is_flagged_not_modified() {
        let elements = sharp_corner_elements();
        let r = insert_trochoids(&elements, false, 1.0, 5.0, 0.5, 1.0);
        assert_eq!(r.elements.len(), elements.len());
        assert!(r.elements.iter().all(|e| matches!(e, PathElement::Line { .. })));
        assert!(r
            .overlays
            .iter()
            .any(|o| matches!(o, Overlay::TightRadius { .. })));
    }

    #[test]
    fn gentle_path_is_untouched() {
        let elements = as_lines(&[
            P::new(0.0, 0.0),
            P::new(10.0, 0.0),
            P::new(20.0, 0.0),
            P::new(30.0, 0.0),
        ]);
        let r = insert_trochoids(&elements, true, 1.0, 5.0, 0.5, 1.0);
        assert_eq!(r.elements.len(), elements.len());
        assert!(r.overlays.is_empty());
    }

    #[test]
    fn successive_hotspots_advance_by_pitch() {
        // Two tight zigzag turns in a row so two relief loops are inserted
        // back to back; their centers must not coincide.
        let elements = as_lines(&[
            P::new(0.0, 0.0),
            P::new(10.0, 0.0),
            P::new(10.0, 0.2),
            P::new(10.2, 0.0),
            P::new(10.2, 0.2),
            P::new(20.0, 0.2),
        ]);
        let r = insert_trochoids(&elements, true, 0.3, 5.0, 0.6, 0.1);
        let centers: Vec<Point> = r
            .overlays
            .iter()
            .filter_map(|o| match o {
                Overlay::TrochoidCenter { at, .. } => Some(*at),
                _ => None,
            })
            .collect();
        if centers.len() == 2 {
            assert!((centers[0] - centers[1]).norm() >= 0.6 - 1e-6);
        }
    }
}
