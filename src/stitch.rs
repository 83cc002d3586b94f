//! Spiral stitching: joins the nested rings produced by
//! [`crate::offset::fill`] into one continuous cutting curve per depth
//! layer, rather than cutting each ring separately and retracting between
//! them. Rings belonging to physically separate regions (split apart by an
//! island that bridges all the way across the pocket) are kept as distinct
//! spirals that the motion linker retracts between.

use crate::float_types::Real;
use crate::geometry::{Point, Ring};

/// One continuous cutting curve, already ordered start-to-end, for a
/// single depth layer. Multiple [`Spiral`]s in the same depth layer are
/// disjoint and require a retract/plunge between them.
#[derive(Clone, Debug)]
pub struct Spiral {
    pub points: Vec<Point>,
    pub depth: usize,
    /// Indices into `points` where traversal bridges from one ring to the
    /// next (every ring boundary after the first); consumed by
    /// [`crate::adaptive`] to center its engagement-ratio window.
    pub bridges: Vec<usize>,
}

/// Union-find over ring indices, used to cluster rings into disjoint
/// physical regions via mutual containment.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        DisjointSet {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[ra] = rb;
        }
    }
}

/// Join every ring in `rings` (the flattened ring stack for one depth
/// layer, across all radial passes) into one or more continuous spirals.
///
/// Step 1: cluster rings into disjoint regions by mutual containment.
/// Step 2: within each region, order rings inner-to-outer by enclosed area.
/// Step 3: bridge consecutive rings via their nearest vertex pair.
pub fn stitch(rings: &[Ring], climb: bool, depth: usize) -> Vec<Spiral> {
    let n = rings.len();
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        let mut points = oriented_points(&rings[0], climb);
        if let Some(&first) = points.first() {
            points.push(first); // close the loop, matching bridge_chain's convention
        }
        return vec![Spiral {
            points,
            depth,
            bridges: Vec::new(),
        }];
    }

    let mut dsu = DisjointSet::new(n);
    for i in 0..n {
        for j in (i + 1)..n {
            if nests(&rings[i], &rings[j]) || nests(&rings[j], &rings[i]) {
                dsu.union(i, j);
            }
        }
    }

    let mut clusters: std::collections::BTreeMap<usize, Vec<usize>> = std::collections::BTreeMap::new();
    for i in 0..n {
        let root = dsu.find(i);
        clusters.entry(root).or_default().push(i);
    }

    clusters
        .into_values()
        .map(|mut idxs| {
            idxs.sort_by(|&a, &b| {
                rings[a]
                    .signed_area()
                    .abs()
                    .partial_cmp(&rings[b].signed_area().abs())
                    .unwrap()
            });
            let ordered: Vec<Ring> = idxs.into_iter().map(|i| rings[i].clone()).collect();
            let (points, bridges) = bridge_chain(&ordered, climb);
            Spiral { points, depth, bridges }
        })
        .collect()
}

/// `strategy = Lanes` alternative to [`stitch`]: every ring in `rings`
/// stays its own closed, individually-retracted loop rather than being
/// bridged into one continuous spiral (the `Lanes` variant).
/// Ordering and orientation still follow `climb`, matching `stitch`'s
/// per-ring convention so fillet/adaptive-stepover tagging behaves
/// identically either way.
pub fn lanes(rings: &[Ring], climb: bool, depth: usize) -> Vec<Spiral> {
    rings
        .iter()
        .map(|ring| {
            let mut points = oriented_points(ring, climb);
            if let Some(&first) = points.first() {
                points.push(first);
            }
            Spiral {
                points,
                depth,
                bridges: Vec::new(),
            }
        })
        .collect()
}

/// Does `outer` enclose `inner`'s representative vertex? Used only to build
/// the disjointness clustering, not for a full polygon-containment proof.
fn nests(outer: &Ring, inner: &Ring) -> bool {
    if inner.points.is_empty() {
        return false;
    }
    crate::geometry::point_in_polygon(&outer.points, inner.points[0])
}

fn oriented_points(ring: &Ring, climb: bool) -> Vec<Point> {
    // Climb milling traverses rings clockwise, conventional milling
    // traverses them counter-clockwise.
    let want_ccw = !climb;
    if ring.is_ccw() == want_ccw {
        ring.points.clone()
    } else {
        ring.reversed().points
    }
}

/// Chain `ordered` (innermost first) into one polyline, entering each ring
/// at the vertex nearest the previous ring's exit point.
fn bridge_chain(ordered: &[Ring], climb: bool) -> (Vec<Point>, Vec<usize>) {
    let mut out: Vec<Point> = Vec::new();
    let mut bridges: Vec<usize> = Vec::new();
    let mut cursor: Option<Point> = None;

    for ring in ordered {
        let pts = oriented_points(ring, climb);
        if pts.is_empty() {
            continue;
        }
        let entry = match cursor {
            None => 0,
            Some(c) => nearest_index(&pts, c),
        };
        let rotated = rotate(&pts, entry);
        if cursor.is_some() {
            bridges.push(out.len());
        }
        out.extend(rotated.iter().copied());
        out.push(rotated[0]); // close the loop before bridging onward
        cursor = Some(rotated[0]);
    }

    (out, bridges)
}

fn nearest_index(pts: &[Point], target: Point) -> usize {
    pts.iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            (**a - target)
                .norm()
                .partial_cmp(&(**b - target).norm())
                .unwrap()
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn rotate(pts: &[Point], start: usize) -> Vec<Point> {
    let n = pts.len();
    (0..n).map(|i| pts[(start + i) % n]).collect()
}

/// Total traversed length of a spiral, summing consecutive point
/// distances (not a closed-loop perimeter: spirals are open chains).
pub fn spiral_length(spiral: &Spiral) -> Real {
    spiral
        .points
        .windows(2)
        .map(|w| (w[1] - w[0]).norm())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point as P;

    fn square(side: Real, cx: Real, cy: Real) -> Ring {
        Ring {
            points: vec![
                P::new(cx - side / 2.0, cy - side / 2.0),
                P::new(cx + side / 2.0, cy - side / 2.0),
                P::new(cx + side / 2.0, cy + side / 2.0),
                P::new(cx - side / 2.0, cy + side / 2.0),
            ],
            offset: 1.0,
            depth: 0,
        }
    }

    #[test]
    fn single_ring_passes_through_unchanged_count() {
        let r = square(10.0, 0.0, 0.0);
        let spirals = stitch(&[r], false, 0);
        assert_eq!(spirals.len(), 1);
        assert_eq!(spirals[0].points.len(), 5); // 4 + closing repeat
    }

    #[test]
    fn nested_rings_bridge_into_one_spiral() {
        let inner = square(10.0, 0.0, 0.0);
        let outer = square(30.0, 0.0, 0.0);
        let spirals = stitch(&[outer, inner], false, 0);
        assert_eq!(spirals.len(), 1);
        assert!(spirals[0].points.len() >= 8);
    }

    #[test]
    fn disjoint_lobes_stay_as_separate_spirals() {
        let lobe_a = square(10.0, 0.0, 0.0);
        let lobe_b = square(10.0, 100.0, 0.0);
        let spirals = stitch(&[lobe_a, lobe_b], false, 0);
        assert_eq!(spirals.len(), 2);
    }
}
