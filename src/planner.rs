//! The planner façade: `plan()` runs the strict pipeline
//! VALIDATE -> OFFSET -> SHAPE -> LINK -> ESTIMATE -> ASSEMBLE -> DONE.
//! Every stage is a separate module; this file only sequences them and
//! carries the crate's public entry point.

use log::debug;

use crate::adaptive;
use crate::config::KernelConfig;
use crate::error::PlanError;
use crate::estimator;
use crate::fillet;
use crate::geometry::{Bbox, PathElement, Point, Ring};
use crate::model::{CapsHistogram, PlanInput, PlanOutput, PlanStats};
use crate::motion::{Motion, MotionMeta};
use crate::offset::{self, GeoOffsetEngine, JoinKind};
use crate::overlay::Overlay;
use crate::sampler;
use crate::stitch;
use crate::float_types::Real;

/// Hard ceiling on radial offset passes per depth layer; reaching it
/// without collapse indicates a misconfigured stepover rather than a
/// legitimately huge pocket, so it ends the pass rather than erroring.
const MAX_RADIAL_PASSES: usize = 5_000;

/// Plan a full adaptive pocketing toolpath for one closed planar loop set.
/// See the module docs for the pipeline shape.
pub fn plan(input: PlanInput) -> Result<PlanOutput, PlanError> {
    validate(&input)?;
    debug!("plan: validated input, tool_d={}, stepover={}", input.tool_d, input.stepover);

    let bbox = input
        .loops
        .bbox()
        .ok_or_else(|| PlanError::bad_input("loops", "outer loop has no points"))?;
    let config = KernelConfig::derive(&input, bbox.max_dimension());
    config
        .machine
        .validate()
        .map_err(PlanError::profile_mismatch)?;

    let passes = offset::fill(
        &GeoOffsetEngine,
        &input.loops,
        input.tool_d,
        config.stepover_mm,
        input.margin,
        MAX_RADIAL_PASSES,
        JoinKind::Round,
        2.0,
        0,
    )?;
    debug!("plan: offset produced {} radial passes", passes.len());
    if passes.is_empty() {
        return Err(PlanError::infeasible(
            "pocket collapsed on the first offset pass; reduce tool diameter or margin",
        ));
    }

    let mut motions: Vec<Motion> = Vec::new();
    let mut overlays: Vec<Overlay> = Vec::new();

    for depth_idx in 0..config.depth_layers {
        let z_layer = layer_z(&input, depth_idx, config.depth_layers);

        let rings_this_layer: Vec<Ring> = passes
            .iter()
            .flat_map(|pass| pass.iter().cloned())
            .map(|r| Ring {
                depth: depth_idx,
                ..r
            })
            .collect();

        let shaped = shape_layer(&rings_this_layer, &input, &config, &mut overlays);
        link_layer(&shaped, z_layer, &input, &mut motions);
    }
    debug!("plan: linked {} depth layers into {} motions", config.depth_layers, motions.len());

    estimator::estimate_all(&mut motions, &config.machine);

    let stats = assemble_stats(&motions, &input);
    debug!("plan: done, {:.1} mm total length, {:.1}s estimated", stats.length_mm, stats.time_s);

    Ok(PlanOutput {
        motions,
        stats,
        overlays,
    })
}

/// Resample, stitch, adaptively slow down, fillet, and trochoid-relieve
/// one depth layer's flattened ring stack. Returns the finished curve for
/// each spiral as a sequence of path elements paired with a per-element
/// feed override.
fn shape_layer(
    rings: &[Ring],
    input: &PlanInput,
    config: &KernelConfig,
    overlays: &mut Vec<Overlay>,
) -> Vec<(Vec<PathElement>, Vec<Option<Real>>)> {
    let rounded: Vec<Ring> = rings
        .iter()
        .map(|r| sampler::resample_ring(r, config.target_chord, input.corner_radius_min))
        .collect();

    let depth = rings.first().map(|r| r.depth).unwrap_or(0);
    let spirals = match input.strategy {
        crate::model::Strategy::Spiral => stitch::stitch(&rounded, input.climb, depth),
        crate::model::Strategy::Lanes => stitch::lanes(&rounded, input.climb, depth),
    };

    let path_ccw = !input.climb;

    spirals
        .into_iter()
        .map(|spiral| {
            let modulation = adaptive::modulate(
                &spiral,
                config.stepover_mm,
                config.target_stepover_mm,
                input.slowdown_feed_pct,
            );
            overlays.extend(modulation.overlays);

            let (filleted, fillet_overlays) =
                fillet::fillet_polyline(&spiral.points, path_ccw, input.corner_radius_min);
            overlays.extend(fillet_overlays);

            let trochoid_result = crate::trochoid::insert_trochoids(
                &filleted,
                input.use_trochoids,
                input.trochoid_radius,
                input.trochoid_radius_min,
                input.trochoid_pitch,
                input.corner_radius_min,
            );
            overlays.extend(trochoid_result.overlays);

            let feeds = trochoid_result
                .elements
                .iter()
                .map(|e| nearest_feed(&spiral.points, &modulation.feed_pct, e.end()))
                .collect();

            (trochoid_result.elements, feeds)
        })
        .collect()
}

/// Find the feed override of whichever original spiral point is closest to
/// `p`; used to carry feed overrides across the fillet/trochoid stages,
/// which both change the element count and can move points off their
/// original positions (fillet tangent points, trochoid relief loops).
fn nearest_feed(original: &[Point], feeds: &[Option<Real>], p: Point) -> Option<Real> {
    original
        .iter()
        .zip(feeds.iter())
        .min_by(|(a, _), (b, _)| (**a - p).norm().partial_cmp(&(**b - p).norm()).unwrap())
        .and_then(|(_, f)| *f)
}

/// Convert one depth layer's shaped spirals into rapid/plunge/cut/retract
/// motions. Disjoint spirals each get their own
/// rapid-to/plunge/retract bracket; `PathElement::Arc` segments (inserted
/// fillets and trochoid relief loops) become `Motion::Arc` rather than
/// being rasterized to line segments.
fn link_layer(
    spirals: &[(Vec<PathElement>, Vec<Option<Real>>)],
    z_layer: Real,
    input: &PlanInput,
    motions: &mut Vec<Motion>,
) {
    for (elements, feeds) in spirals {
        if elements.is_empty() {
            continue;
        }

        let start = elements[0].start();
        motions.push(Motion::Rapid {
            to: start,
            z: input.safe_z,
            meta: MotionMeta::new(),
        });
        motions.push(Motion::Linear {
            to: start,
            z: z_layer,
            feed: input.feed_z,
            meta: MotionMeta::new(),
        });

        for (element, feed_pct) in elements.iter().zip(feeds.iter()) {
            let feed = match feed_pct {
                Some(pct) => input.feed_xy * (pct / 100.0),
                None => input.feed_xy,
            };
            let mut meta = MotionMeta::new();
            meta.feed_pct = *feed_pct;
            motions.push(match element {
                PathElement::Line { p1, .. } | PathElement::Rapid { p1, .. } => Motion::Linear {
                    to: *p1,
                    z: z_layer,
                    feed,
                    meta,
                },
                PathElement::Arc { center, ccw, .. } => Motion::Arc {
                    to: element.end(),
                    z: z_layer,
                    center: *center,
                    ccw: *ccw,
                    feed,
                    meta,
                },
            });
        }

        motions.push(Motion::Rapid {
            to: elements.last().unwrap().end(),
            z: input.safe_z,
            meta: MotionMeta::new(),
        });
    }
}

/// Z height for depth layer `idx` of `total` (0-indexed), stepping down by
/// `stepdown_mm` but never past `z_rough`.
fn layer_z(input: &PlanInput, idx: usize, total: usize) -> Real {
    let sign = if input.z_rough < 0.0 { -1.0 } else { 1.0 };
    let target = input.z_rough.abs();
    let step = ((idx + 1) as Real) * input.stepdown_mm;
    if idx + 1 == total {
        input.z_rough
    } else {
        sign * step.min(target)
    }
}

fn assemble_stats(motions: &[Motion], input: &PlanInput) -> PlanStats {
    let mut length_mm = 0.0;
    let mut time_s = 0.0;
    let mut histogram = CapsHistogram::default();
    let mut prev: Option<(Point, Real)> = None;

    for m in motions {
        let end = m.end();
        let z = m.z();
        if let Some((prev_xy, prev_z)) = prev {
            let xy_len = (end - prev_xy).norm();
            let dz = z - prev_z;
            length_mm += (xy_len * xy_len + dz * dz).sqrt();
        }
        time_s += m.meta().time_s.unwrap_or(0.0);
        if !m.is_rapid() {
            match m.meta().binding_constraint {
                Some(crate::motion::BindingConstraint::FeedCap) => histogram.feed_cap += 1,
                Some(crate::motion::BindingConstraint::Accel) => histogram.accel += 1,
                Some(crate::motion::BindingConstraint::Jerk) => histogram.jerk += 1,
                Some(crate::motion::BindingConstraint::None) | None => histogram.none += 1,
            }
        }
        prev = Some((end, z));
    }

    let area_mm2 = input.loops.outer.signed_area().abs()
        - input.loops.islands.iter().map(|l| l.signed_area().abs()).sum::<Real>();
    let volume_mm3 = area_mm2.max(0.0) * input.z_rough.abs();

    PlanStats {
        length_mm,
        time_s,
        move_count: motions.len(),
        area_mm2: area_mm2.max(0.0),
        volume_mm3,
        caps_histogram: histogram,
    }
}

/// Input validation. Every rejection is a `BadInput`,
/// `Infeasible`, or `ProfileMismatch` variant; there is no partial success.
fn validate(input: &PlanInput) -> Result<(), PlanError> {
    let bbox = input
        .loops
        .bbox()
        .ok_or_else(|| PlanError::bad_input("loops.outer", "no points"))?;
    let eps = crate::float_types::BASE_EPSILON * bbox.max_dimension().max(1.0);

    input
        .loops
        .outer
        .validate(eps)
        .map_err(|e| PlanError::from_geom("loops[0]", e))?;
    for (i, island) in input.loops.islands.iter().enumerate() {
        island
            .validate(eps)
            .map_err(|e| PlanError::from_geom(format!("loops.islands[{i}]"), e))?;
    }

    for (i, island) in input.loops.islands.iter().enumerate() {
        if island.points.iter().any(|p| !input.loops.outer.contains_point(*p)) {
            return Err(PlanError::bad_input(
                format!("loops.islands[{i}]"),
                "island must lie strictly inside the outer boundary",
            ));
        }
        if touches_boundary(island, &input.loops.outer, eps) {
            return Err(PlanError::bad_input(
                format!("loops.islands[{i}]"),
                "island touches the outer boundary; islands must be strictly interior",
            ));
        }
    }
    for i in 0..input.loops.islands.len() {
        for j in (i + 1)..input.loops.islands.len() {
            if islands_overlap(&input.loops.islands[i], &input.loops.islands[j]) {
                return Err(PlanError::bad_input(
                    format!("loops.islands[{i}],[{j}]"),
                    "islands must not overlap each other",
                ));
            }
        }
    }

    if input.tool_d <= 0.0 {
        return Err(PlanError::bad_input("tool_d", "must be positive"));
    }
    if input.stepover <= 0.0 || input.stepover > 1.0 {
        return Err(PlanError::bad_input("stepover", "must be in (0, 1]"));
    }
    if let Some(ts) = input.target_stepover {
        if ts <= 0.0 || ts > 1.0 {
            return Err(PlanError::bad_input("target_stepover", "must be in (0, 1]"));
        }
    }
    if input.stepdown_mm <= 0.0 {
        return Err(PlanError::bad_input("stepdown_mm", "must be positive"));
    }
    if input.margin < 0.0 {
        return Err(PlanError::bad_input("margin", "must be non-negative"));
    }
    if input.corner_radius_min < 0.0 {
        return Err(PlanError::bad_input("corner_radius_min", "must be non-negative"));
    }
    if input.feed_xy <= 0.0 || input.feed_z <= 0.0 {
        return Err(PlanError::bad_input("feed_xy/feed_z", "must be positive"));
    }
    if input.safe_z <= 0.0 {
        return Err(PlanError::bad_input("safe_z", "must be positive"));
    }
    if input.use_trochoids {
        if input.trochoid_radius <= 0.0 || input.trochoid_pitch <= 0.0 {
            return Err(PlanError::bad_input(
                "trochoid_radius/trochoid_pitch",
                "must be positive when trochoids are enabled",
            ));
        }
        if input.trochoid_radius > input.trochoid_radius_min {
            return Err(PlanError::infeasible(
                "trochoid_radius must not exceed trochoid_radius_min, or relief loops can't clear the hotspot",
            ));
        }
    }

    let min_fit = input.margin * 2.0 + input.tool_d;
    if min_fit >= bbox.width().min(bbox.height()) {
        return Err(PlanError::infeasible(
            "tool and margin do not fit inside the outer boundary's smaller dimension",
        ));
    }

    Ok(())
}

fn touches_boundary(island: &crate::geometry::Loop, outer: &crate::geometry::Loop, eps: Real) -> bool {
    for p in &island.points {
        for i in 0..outer.points.len() {
            let a = outer.points[i];
            let b = outer.points[(i + 1) % outer.points.len()];
            if point_segment_distance(*p, a, b) <= eps {
                return true;
            }
        }
    }
    false
}

fn point_segment_distance(p: Point, a: Point, b: Point) -> Real {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 <= 1e-18 {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

fn islands_overlap(a: &crate::geometry::Loop, b: &crate::geometry::Loop) -> bool {
    let (Some(ba), Some(bb)) = (a.bbox(), b.bbox()) else {
        return false;
    };
    if !bboxes_overlap(&ba, &bb) {
        return false;
    }
    a.points.iter().any(|p| b.contains_point(*p)) || b.points.iter().any(|p| a.contains_point(*p))
}

fn bboxes_overlap(a: &Bbox, b: &Bbox) -> bool {
    a.min.x <= b.max.x && a.max.x >= b.min.x && a.min.y <= b.max.y && a.max.y >= b.min.y
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Loop, LoopSet, Point as P};
    use crate::model::{Strategy, Units};

    fn basic_input(outer: Loop, islands: Vec<Loop>) -> PlanInput {
        PlanInput {
            loops: LoopSet::new(outer, islands),
            units: Units::Mm,
            tool_d: 6.0,
            stepover: 0.4,
            target_stepover: None,
            stepdown_mm: 2.0,
            z_rough: -4.0,
            safe_z: 10.0,
            margin: 0.2,
            strategy: Strategy::Spiral,
            climb: false,
            smoothing: 0.0,
            corner_radius_min: 1.0,
            use_trochoids: false,
            trochoid_radius: 1.0,
            trochoid_radius_min: 1.5,
            trochoid_pitch: 0.5,
            slowdown_feed_pct: 40.0,
            feed_xy: 1200.0,
            feed_z: 300.0,
            machine_profile: None,
        }
    }

    fn square(side: Real) -> Loop {
        Loop::new(vec![
            P::new(0.0, 0.0),
            P::new(side, 0.0),
            P::new(side, side),
            P::new(0.0, side),
        ])
    }

    #[test]
    fn plans_a_plain_square_pocket() {
        let input = basic_input(square(100.0), vec![]);
        let out = plan(input).expect("plan should succeed");
        assert!(!out.motions.is_empty());
        assert!(out.stats.length_mm > 0.0);
        assert!(out.stats.time_s > 0.0);
    }

    #[test]
    fn zero_islands_succeeds() {
        let input = basic_input(square(60.0), vec![]);
        assert!(plan(input).is_ok());
    }

    #[test]
    fn island_touching_boundary_is_bad_input() {
        // square(20.0)'s own (0,0) corner coincides with the outer square's
        // (0,0) corner: touches the boundary at exactly one point.
        let island = square(20.0);
        let input = basic_input(square(100.0), vec![island]);
        let err = plan(input).unwrap_err();
        assert!(matches!(err, PlanError::BadInput { .. }));
    }

    #[test]
    fn oversized_tool_is_infeasible() {
        let mut input = basic_input(square(10.0), vec![]);
        input.tool_d = 50.0;
        let err = plan(input).unwrap_err();
        assert!(matches!(err, PlanError::Infeasible { .. }));
    }

    #[test]
    fn island_with_valid_clearance_succeeds() {
        let mut island = square(10.0);
        for p in island.points.iter_mut() {
            *p = P::new(p.x + 45.0, p.y + 45.0);
        }
        let input = basic_input(square(100.0), vec![island]);
        assert!(plan(input).is_ok());
    }

    #[test]
    fn negative_stepdown_is_bad_input() {
        let mut input = basic_input(square(60.0), vec![]);
        input.stepdown_mm = -1.0;
        let err = plan(input).unwrap_err();
        assert!(matches!(err, PlanError::BadInput { .. }));
    }

    #[test]
    fn lanes_strategy_retracts_between_every_ring() {
        let mut spiral_input = basic_input(square(100.0), vec![]);
        spiral_input.strategy = Strategy::Spiral;
        let spiral_out = plan(spiral_input).expect("spiral plan should succeed");

        let mut lanes_input = basic_input(square(100.0), vec![]);
        lanes_input.strategy = Strategy::Lanes;
        let lanes_out = plan(lanes_input).expect("lanes plan should succeed");

        // Lanes retracts to safe Z between every ring instead of bridging
        // them into one spiral, so it issues strictly more rapid moves for
        // the same multi-ring pocket.
        let rapids = |out: &PlanOutput| out.motions.iter().filter(|m| m.is_rapid()).count();
        assert!(rapids(&lanes_out) > rapids(&spiral_out));
    }
}
