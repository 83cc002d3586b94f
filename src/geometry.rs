//! Geometry primitives: points, closed polylines (`Loop`), the outer+islands
//! `LoopSet`, offset `Ring`s, and path elements (§4.1 of the spec).
//!
//! All tolerances are expressed in the caller's user unit; degeneracy checks
//! share a single `eps` derived from the input's bounding box (see
//! [`crate::config::KernelConfig`]).

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::float_types::Real;

pub type Point = Point2<Real>;
pub type Vector = Vector2<Real>;

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bbox {
    pub min: Point,
    pub max: Point,
}

impl Bbox {
    pub fn of_points(points: &[Point]) -> Option<Bbox> {
        let mut it = points.iter();
        let first = *it.next()?;
        let mut bb = Bbox {
            min: first,
            max: first,
        };
        for p in it {
            bb.min.x = bb.min.x.min(p.x);
            bb.min.y = bb.min.y.min(p.y);
            bb.max.x = bb.max.x.max(p.x);
            bb.max.y = bb.max.y.max(p.y);
        }
        Some(bb)
    }

    pub fn width(&self) -> Real {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> Real {
        self.max.y - self.min.y
    }

    pub fn max_dimension(&self) -> Real {
        self.width().max(self.height())
    }

    pub fn union(&self, other: &Bbox) -> Bbox {
        Bbox {
            min: Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            max: Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        }
    }
}

/// Errors raised by the geometry primitives; mapped to
/// [`crate::error::PlanError::BadInput`] at the planner façade.
#[derive(Debug, Clone, PartialEq)]
pub enum GeomError {
    TooFewPoints { found: usize },
    ZeroArea,
    SelfIntersecting,
    NonFinite,
}

impl core::fmt::Display for GeomError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            GeomError::TooFewPoints { found: _ } => {
                write!(f, "fewer than 3 distinct points")
            },
            GeomError::ZeroArea => write!(f, "loop has zero signed area"),
            GeomError::SelfIntersecting => write!(f, "loop self-intersects"),
            GeomError::NonFinite => write!(f, "loop contains a non-finite coordinate"),
        }
    }
}

/// A closed polyline: last point implicitly connects back to the first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Loop {
    pub points: Vec<Point>,
}

impl Loop {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Validate: >= 3 distinct points, finite, non-zero
    /// area, non-self-intersecting.
    pub fn validate(&self, eps: Real) -> Result<(), GeomError> {
        if self.points.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(GeomError::NonFinite);
        }
        let distinct = dedup_consecutive(&self.points, eps);
        if distinct.len() < 3 {
            return Err(GeomError::TooFewPoints {
                found: distinct.len(),
            });
        }
        if signed_area(&distinct).abs() <= eps * eps {
            return Err(GeomError::ZeroArea);
        }
        if self_intersects(&distinct, eps) {
            return Err(GeomError::SelfIntersecting);
        }
        Ok(())
    }

    /// Shoelace signed area; positive for CCW orientation.
    pub fn signed_area(&self) -> Real {
        signed_area(&self.points)
    }

    pub fn is_ccw(&self) -> bool {
        self.signed_area() > 0.0
    }

    /// Total length of the closed polyline (oriented perimeter magnitude).
    pub fn perimeter(&self) -> Real {
        oriented_perimeter(&self.points).abs()
    }

    pub fn reversed(&self) -> Loop {
        let mut pts = self.points.clone();
        pts.reverse();
        Loop::new(pts)
    }

    /// Force CCW orientation (the outer boundary's convention).
    pub fn to_ccw(&self) -> Loop {
        if self.is_ccw() {
            self.clone()
        } else {
            self.reversed()
        }
    }

    /// Force CW orientation (island loops' convention).
    pub fn to_cw(&self) -> Loop {
        if self.is_ccw() {
            self.reversed()
        } else {
            self.clone()
        }
    }

    pub fn bbox(&self) -> Option<Bbox> {
        Bbox::of_points(&self.points)
    }

    /// Even-odd ray-casting point-in-polygon test, robust to the usual
    /// horizontal-ray edge cases (vertex-on-ray).
    pub fn contains_point(&self, p: Point) -> bool {
        point_in_polygon(&self.points, p)
    }

    /// Discrete curvature at vertex `i`: inverse of the circumradius of the
    /// three neighboring points `(i-1, i, i+1)`, clamped to avoid blow-up on
    /// near-collinear triples. Returns 0.0 for a straight (or degenerate)
    /// triple.
    pub fn curvature_at(&self, i: usize) -> Real {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let a = self.points[(i + n - 1) % n];
        let b = self.points[i % n];
        let c = self.points[(i + 1) % n];
        discrete_curvature(a, b, c)
    }
}

/// Discrete curvature (1/R) of the circle through `a,b,c`, clamped to a
/// large-but-finite value instead of diverging on near-collinear points.
pub fn discrete_curvature(a: Point, b: Point, c: Point) -> Real {
    let ab = (b - a).norm();
    let bc = (c - b).norm();
    let ca = (a - c).norm();
    if ab <= 0.0 || bc <= 0.0 || ca <= 0.0 {
        return 0.0;
    }
    // Twice the signed area of the triangle via the cross product.
    let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
    let area2 = cross.abs();
    if area2 <= 1e-15 {
        return 0.0;
    }
    // R = (ab * bc * ca) / (2 * area)
    let r = (ab * bc * ca) / area2;
    if r <= 1e-12 {
        return 1e12;
    }
    (1.0 / r).min(1e12)
}

/// One outer loop plus zero or more islands, all mutually non-intersecting,
/// islands strictly inside the outer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoopSet {
    pub outer: Loop,
    pub islands: Vec<Loop>,
}

impl LoopSet {
    pub fn new(outer: Loop, islands: Vec<Loop>) -> Self {
        Self { outer, islands }
    }

    pub fn normalized(&self) -> LoopSet {
        LoopSet {
            outer: self.outer.to_ccw(),
            islands: self.islands.iter().map(Loop::to_cw).collect(),
        }
    }

    pub fn bbox(&self) -> Option<Bbox> {
        let mut bb = self.outer.bbox()?;
        for isl in &self.islands {
            if let Some(ib) = isl.bbox() {
                bb = bb.union(&ib);
            }
        }
        Some(bb)
    }
}

/// A closed polyline produced by inward-offsetting a [`LoopSet`]; carries
/// the offset distance and depth-layer index it was generated for.
#[derive(Clone, Debug)]
pub struct Ring {
    pub points: Vec<Point>,
    pub offset: Real,
    pub depth: usize,
}

impl Ring {
    pub fn signed_area(&self) -> Real {
        signed_area(&self.points)
    }

    pub fn perimeter(&self) -> Real {
        oriented_perimeter(&self.points).abs()
    }

    pub fn is_ccw(&self) -> bool {
        self.signed_area() > 0.0
    }

    pub fn reversed(&self) -> Ring {
        let mut pts = self.points.clone();
        pts.reverse();
        Ring {
            points: pts,
            offset: self.offset,
            depth: self.depth,
        }
    }
}

/// A single motion-geometry primitive prior to linking (§3 "Path element").
#[derive(Clone, Debug)]
pub enum PathElement {
    Line {
        p0: Point,
        p1: Point,
    },
    Arc {
        center: Point,
        radius: Real,
        start_angle: Real,
        end_angle: Real,
        ccw: bool,
    },
    Rapid {
        p0: Point,
        p1: Point,
    },
}

impl PathElement {
    pub fn start(&self) -> Point {
        match self {
            PathElement::Line { p0, .. } | PathElement::Rapid { p0, .. } => *p0,
            PathElement::Arc {
                center,
                radius,
                start_angle,
                ..
            } => center + Vector::new(radius * start_angle.cos(), radius * start_angle.sin()),
        }
    }

    pub fn end(&self) -> Point {
        match self {
            PathElement::Line { p1, .. } | PathElement::Rapid { p1, .. } => *p1,
            PathElement::Arc {
                center,
                radius,
                end_angle,
                ..
            } => center + Vector::new(radius * end_angle.cos(), radius * end_angle.sin()),
        }
    }

    /// Geometric length of the element (arc length for `Arc`).
    pub fn length(&self) -> Real {
        match self {
            PathElement::Line { p0, p1 } | PathElement::Rapid { p0, p1 } => (p1 - p0).norm(),
            PathElement::Arc {
                radius,
                start_angle,
                end_angle,
                ccw,
                ..
            } => radius * arc_sweep(*start_angle, *end_angle, *ccw),
        }
    }
}

/// Positive sweep angle (radians) traveled from `start_angle` to `end_angle`
/// in the given direction.
pub fn arc_sweep(start_angle: Real, end_angle: Real, ccw: bool) -> Real {
    let mut d = end_angle - start_angle;
    if ccw {
        while d < 0.0 {
            d += crate::float_types::TAU;
        }
    } else {
        while d > 0.0 {
            d -= crate::float_types::TAU;
        }
        d = -d;
    }
    d
}

/// Sample an arc into line segments such that the sagitta (chord deviation)
/// never exceeds `chord_tol`.
pub fn sample_arc(
    center: Point,
    radius: Real,
    start_angle: Real,
    end_angle: Real,
    ccw: bool,
    chord_tol: Real,
) -> Vec<Point> {
    let sweep = arc_sweep(start_angle, end_angle, ccw).max(0.0);
    if radius <= 0.0 || sweep <= 0.0 {
        return vec![
            center + Vector::new(radius * start_angle.cos(), radius * start_angle.sin()),
        ];
    }
    // max angular step such that R*(1 - cos(step/2)) <= chord_tol
    let tol = chord_tol.max(1e-9).min(radius * 0.999);
    let half_step = (1.0 - tol / radius).clamp(-1.0, 1.0).acos();
    let step = (2.0 * half_step).max(1e-3);
    let n = (sweep / step).ceil().max(1.0) as usize;
    let signed_step = if ccw { sweep / n as Real } else { -sweep / n as Real };
    (0..=n)
        .map(|i| {
            let a = start_angle + signed_step * i as Real;
            center + Vector::new(radius * a.cos(), radius * a.sin())
        })
        .collect()
}

/// Shoelace signed area of a closed polyline (implicit closing edge).
pub fn signed_area(points: &[Point]) -> Real {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    sum * 0.5
}

/// Perimeter with sign matching traversal direction (positive length, this
/// just sums segment lengths around the implicit closing edge).
pub fn oriented_perimeter(points: &[Point]) -> Real {
    let n = points.len();
    if n < 2 {
        return 0.0;
    }
    let mut total = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        total += (b - a).norm();
    }
    total
}

/// Even-odd ray-casting point-in-polygon test along +x.
pub fn point_in_polygon(points: &[Point], p: Point) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let pi = points[i];
        let pj = points[j];
        let crosses = (pi.y > p.y) != (pj.y > p.y);
        if crosses {
            let x_at_y =
                (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y + if pj.y == pi.y { 1e-30 } else { 0.0 }) + pi.x;
            if p.x < x_at_y {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Remove consecutive duplicate points (within `eps`), including the
/// implicit wrap-around edge.
pub fn dedup_consecutive(points: &[Point], eps: Real) -> Vec<Point> {
    if points.is_empty() {
        return Vec::new();
    }
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        if out.last().map(|&q| (p - q).norm() <= eps).unwrap_or(false) {
            continue;
        }
        out.push(p);
    }
    if out.len() > 1 && (out[0] - out[out.len() - 1]).norm() <= eps {
        out.pop();
    }
    out
}

/// Does segment `(p1,p2)` properly intersect `(p3,p4)`? Shared endpoints are
/// not considered intersections (adjacent polyline edges share a vertex).
fn segments_intersect(p1: Point, p2: Point, p3: Point, p4: Point, eps: Real) -> bool {
    let d1 = cross(p4 - p3, p1 - p3);
    let d2 = cross(p4 - p3, p2 - p3);
    let d3 = cross(p2 - p1, p3 - p1);
    let d4 = cross(p2 - p1, p4 - p1);

    if ((d1 > eps && d2 < -eps) || (d1 < -eps && d2 > eps))
        && ((d3 > eps && d4 < -eps) || (d3 < -eps && d4 > eps))
    {
        return true;
    }
    false
}

fn cross(a: Vector, b: Vector) -> Real {
    a.x * b.y - a.y * b.x
}

/// O(n^2) self-intersection test over non-adjacent edges; adequate for the
/// modest vertex counts of CAM boundary loops.
pub fn self_intersects(points: &[Point], eps: Real) -> bool {
    let n = points.len();
    if n < 4 {
        return false;
    }
    for i in 0..n {
        let a1 = points[i];
        let a2 = points[(i + 1) % n];
        for j in (i + 1)..n {
            // Skip edges sharing a vertex with edge i.
            if j == i || (j + 1) % n == i || (i + 1) % n == j {
                continue;
            }
            let b1 = points[j];
            let b2 = points[(j + 1) % n];
            if segments_intersect(a1, a2, b1, b2, eps) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::float_types::PI;

    fn p(x: Real, y: Real) -> Point {
        Point::new(x, y)
    }

    fn square() -> Loop {
        Loop::new(vec![p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0), p(0.0, 10.0)])
    }

    #[test]
    fn square_is_ccw_with_area_100() {
        let sq = square();
        assert!(sq.is_ccw());
        assert!((sq.signed_area() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn perimeter_of_square_is_40() {
        assert!((square().perimeter() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn point_in_polygon_basic() {
        let sq = square();
        assert!(sq.contains_point(p(5.0, 5.0)));
        assert!(!sq.contains_point(p(15.0, 5.0)));
        assert!(!sq.contains_point(p(-1.0, 5.0)));
    }

    #[test]
    fn degenerate_loop_rejected() {
        let l = Loop::new(vec![p(0.0, 0.0), p(100.0, 0.0), p(100.0, 0.0)]);
        let err = l.validate(1e-9).unwrap_err();
        assert_eq!(err, GeomError::TooFewPoints { found: 2 });
    }

    #[test]
    fn self_intersecting_bowtie_rejected() {
        let l = Loop::new(vec![p(0.0, 0.0), p(10.0, 10.0), p(10.0, 0.0), p(0.0, 10.0)]);
        assert_eq!(l.validate(1e-9).unwrap_err(), GeomError::SelfIntersecting);
    }

    #[test]
    fn curvature_of_straight_line_is_zero() {
        assert_eq!(discrete_curvature(p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0)), 0.0);
    }

    #[test]
    fn curvature_of_right_angle_unit_triangle() {
        // a=(1,0), b=(0,0), c=(0,1): circumradius of this right triangle is
        // half the hypotenuse = sqrt(2)/2.
        let k = discrete_curvature(p(1.0, 0.0), p(0.0, 0.0), p(0.0, 1.0));
        let expected = 1.0 / (2.0_f64.sqrt() / 2.0);
        assert!((k - expected).abs() < 1e-6);
    }

    #[test]
    fn arc_sample_respects_chord_tolerance() {
        let pts = sample_arc(p(0.0, 0.0), 10.0, 0.0, PI, true, 0.01);
        assert!(pts.len() >= 3);
        // Check sagitta of the widest step stays within tolerance.
        for w in pts.windows(2) {
            let mid = nalgebra::center(&w[0], &w[1]);
            let d = (mid - p(0.0, 0.0)).norm();
            assert!(10.0 - d <= 0.01 + 1e-6);
        }
    }
}
