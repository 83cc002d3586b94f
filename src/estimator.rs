//! Jerk-aware motion time estimation: each linear/arc move
//! is timed as a trapezoidal-or-S-curve profile bounded by the machine's
//! feed cap, acceleration limit, and jerk limit, whichever binds first.
//! Arcs are additionally capped by centripetal acceleration. A fixed 10%
//! overhead multiplier accounts for controller look-ahead and acceleration
//! smoothing the simple kinematic model doesn't capture.

use crate::float_types::Real;
use crate::machine::MachineProfile;
use crate::motion::{BindingConstraint, Motion};

/// Fixed overhead multiplier applied to every cutting move's estimated
/// time, folding in controller latency this simple model
/// doesn't otherwise capture.
pub const OVERHEAD_MULTIPLIER: Real = 1.10;

/// Time (seconds) and binding constraint for a single move of `length` mm
/// at up to `feed` mm/min, subject to `accel` (mm/s^2) and `jerk`
/// (mm/s^3). For arcs, `radius` caps the feed further by centripetal
/// acceleration (`v^2/r <= accel`); `None` for linear moves.
pub fn estimate_segment(
    length: Real,
    feed_mm_per_min: Real,
    machine: &MachineProfile,
    radius: Option<Real>,
) -> (Real, BindingConstraint) {
    if length <= 0.0 {
        return (0.0, BindingConstraint::None);
    }

    let requested_v = feed_mm_per_min / 60.0; // mm/s
    let profile_cap_v = machine.limits.feed_xy / 60.0;
    let feed_capped = requested_v > profile_cap_v;
    let v_req = requested_v.min(profile_cap_v);

    let centripetal_cap = radius
        .filter(|r| *r > 1e-9)
        .map(|r| (machine.limits.accel * r).sqrt());
    let v_cap = match centripetal_cap {
        Some(c) => v_req.min(c),
        None => v_req,
    };

    let accel = machine.limits.accel;
    let jerk = machine.limits.jerk;

    // Time to reach v_cap under a jerk-limited S-curve ramp (symmetric
    // accel/decel), then cruise at v_cap for whatever distance remains.
    let t_jerk_to_accel_peak = accel / jerk; // time ramping jerk until accel caps out
    let v_at_accel_cap = 0.5 * accel * t_jerk_to_accel_peak; // v gained during jerk ramp alone

    let (ramp_time, ramp_dist, binding) = if v_at_accel_cap >= v_cap {
        // Jerk-limited the whole way: never reach the accel ceiling. The
        // velocity profile is a symmetric triangular ramp in jerk, so the
        // distance covered reaching v_cap is the trapezoid area v_cap*t/2.
        let t = (2.0 * v_cap / jerk).cbrt();
        (t, v_cap * t * 0.5, BindingConstraint::Jerk)
    } else {
        // Reach the accel ceiling, then ramp velocity linearly until v_cap.
        let t_accel_phase = (v_cap - v_at_accel_cap) / accel;
        let total_ramp_t = 2.0 * t_jerk_to_accel_peak + t_accel_phase;
        let dist_jerk_phases = v_at_accel_cap * t_jerk_to_accel_peak; // two symmetric jerk ramps combined
        let dist_accel_phase = 0.5 * (v_at_accel_cap + v_cap) * t_accel_phase;
        (total_ramp_t, dist_jerk_phases + dist_accel_phase, BindingConstraint::Accel)
    };

    let ramp_dist_total = ramp_dist * 2.0; // accelerate then decelerate, symmetric
    if ramp_dist_total >= length {
        // Move too short to reach v_cap; approximate as a symmetric
        // triangular ramp scaled to fit `length`, still reporting the
        // constraint that would have bound a longer move.
        let scale = (length / ramp_dist_total).max(0.0).sqrt();
        let t = ramp_time * 2.0 * scale;
        return (t.max(0.0) * OVERHEAD_MULTIPLIER, binding);
    }

    let cruise_dist = length - ramp_dist_total;
    let cruise_time = cruise_dist / v_cap;
    let total = ramp_time * 2.0 + cruise_time;

    // A cruise that actually reaches the profile's feed limit is FeedCap
    // bound; a cruise that reaches the move's own full requested speed
    // (never having to back off for the machine's limit or, for arcs,
    // centripetal acceleration) binds on nothing and is tagged None.
    // Otherwise the centripetal cap pulled v_cap below both, and whichever
    // ramp phase got the move up to that reduced speed is what bound it.
    let final_binding = if feed_capped && (v_cap - profile_cap_v).abs() < 1e-9 {
        BindingConstraint::FeedCap
    } else if (v_cap - requested_v).abs() < 1e-9 {
        BindingConstraint::None
    } else {
        binding
    };

    (total * OVERHEAD_MULTIPLIER, final_binding)
}

/// Estimate and annotate every cutting move in `motions` in place, tagging
/// each with its binding constraint and time. Rapids are
/// timed at the machine's rapid rate with no jerk model (point-to-point,
/// look-ahead-free by convention on most controllers).
pub fn estimate_all(motions: &mut [Motion], machine: &MachineProfile) {
    let mut prev_end = None;
    let mut prev_z = None;
    for m in motions.iter_mut() {
        let end = m.end();
        let z = m.z();
        let start = prev_end.unwrap_or(end);
        let start_z = prev_z.unwrap_or(z);
        let xy_len = (end - start).norm();
        let dz = z - start_z;
        let length = (xy_len * xy_len + dz * dz).sqrt();

        let (time_s, binding) = match m {
            Motion::Rapid { .. } => (length / (machine.limits.rapid / 60.0), BindingConstraint::FeedCap),
            Motion::Linear { feed, .. } => estimate_segment(length, *feed, machine, None),
            Motion::Arc { feed, center, to, .. } => {
                let radius = (*to - *center).norm();
                estimate_segment(length, *feed, machine, Some(radius))
            },
        };

        let meta = m.meta_mut();
        meta.time_s = Some(time_s);
        meta.binding_constraint = Some(binding);
        prev_end = Some(end);
        prev_z = Some(z);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::motion::MotionMeta;

    fn test_machine() -> MachineProfile {
        MachineProfile::defaults_for(2000.0, 1000.0)
    }

    #[test]
    fn long_move_is_feed_cap_bound() {
        let m = test_machine();
        // Requested feed (3000) exceeds the profile's feed_xy limit (2000):
        // the move cruises at the machine's cap, not the programmed feed.
        let (t, binding) = estimate_segment(10_000.0, 3000.0, &m, None);
        assert!(t > 0.0);
        assert_eq!(binding, BindingConstraint::FeedCap);
    }

    #[test]
    fn within_limit_cruise_is_untagged() {
        let m = test_machine();
        // Requested feed (1500) stays under the profile limit (2000): a
        // long enough move reaches cruise at the full requested speed and
        // binds on nothing.
        let (t, binding) = estimate_segment(10_000.0, 1500.0, &m, None);
        assert!(t > 0.0);
        assert_eq!(binding, BindingConstraint::None);
    }

    #[test]
    fn very_short_move_never_reaches_feed_cap() {
        let m = test_machine();
        let (t, _binding) = estimate_segment(0.001, 3000.0, &m, None);
        assert!(t > 0.0);
        assert!(t < 1.0);
    }

    #[test]
    fn tight_arc_radius_caps_below_feed_cap() {
        let m = test_machine();
        let (_t_straight, binding_straight) = estimate_segment(1000.0, 1500.0, &m, None);
        let (_t_arc, binding_arc) = estimate_segment(1000.0, 1500.0, &m, Some(0.5));
        assert_eq!(binding_straight, BindingConstraint::None);
        assert_ne!(binding_arc, BindingConstraint::None);
        assert_ne!(binding_arc, BindingConstraint::FeedCap);
    }

    #[test]
    fn estimate_all_tags_every_motion() {
        let m = test_machine();
        let mut motions = vec![
            Motion::Rapid {
                to: Point::new(0.0, 0.0),
                z: 10.0,
                meta: MotionMeta::new(),
            },
            Motion::Linear {
                to: Point::new(100.0, 0.0),
                z: -2.0,
                feed: 1000.0,
                meta: MotionMeta::new(),
            },
        ];
        estimate_all(&mut motions, &m);
        assert!(motions.iter().all(|mo| mo.meta().time_s.is_some()));
    }
}
