//! Post-processing contract. Turning a [`Motion`] list into
//! G-code text is an external collaborator's job (machine/controller
//! dialect varies far more than this kernel should know about); the kernel
//! only defines the trait a post-processor implements.

use crate::model::Units;
use crate::motion::Motion;

/// Formats a finished motion list into machine-readable text. Kept as a
/// trait, not a concrete implementation, so the kernel stays controller-
/// agnostic.
pub trait PostProcessor {
    fn format(
        &self,
        motions: &[Motion],
        header_lines: &[String],
        footer_lines: &[String],
        units: Units,
        line_numbering: bool,
    ) -> String;
}

/// A minimal reference implementation good enough for smoke-testing a
/// planner result end to end; real deployments supply their own dialect.
pub struct GenericPost;

impl PostProcessor for GenericPost {
    fn format(
        &self,
        motions: &[Motion],
        header_lines: &[String],
        footer_lines: &[String],
        units: Units,
        line_numbering: bool,
    ) -> String {
        let mut out = String::new();
        let unit_code = match units {
            Units::Mm => "G21",
            Units::Inch => "G20",
        };
        let mut n = 10;
        let mut emit = |line: String| {
            if line_numbering {
                out.push_str(&format!("N{n} {line}\n"));
                n += 10;
            } else {
                out.push_str(&line);
                out.push('\n');
            }
        };

        for h in header_lines {
            emit(h.clone());
        }
        emit(unit_code.to_string());
        emit("G90".to_string());

        for m in motions {
            emit(format_motion(m));
        }

        for f in footer_lines {
            emit(f.clone());
        }
        out
    }
}

fn format_motion(m: &Motion) -> String {
    match m {
        Motion::Rapid { to, z, .. } => format!("G0 X{:.4} Y{:.4} Z{:.4}", to.x, to.y, z),
        Motion::Linear { to, z, feed, .. } => {
            format!("G1 X{:.4} Y{:.4} Z{:.4} F{:.1}", to.x, to.y, z, feed)
        },
        Motion::Arc { to, z, center, ccw, feed, .. } => {
            let code = if *ccw { "G3" } else { "G2" };
            format!(
                "{code} X{:.4} Y{:.4} Z{:.4} I{:.4} J{:.4} F{:.1}",
                to.x,
                to.y,
                z,
                center.x - to.x,
                center.y - to.y,
                feed
            )
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::motion::MotionMeta;

    #[test]
    fn formats_a_simple_linear_move() {
        let motions = vec![Motion::Linear {
            to: Point::new(1.0, 2.0),
            z: -1.0,
            feed: 500.0,
            meta: MotionMeta::new(),
        }];
        let text = GenericPost.format(&motions, &[], &[], Units::Mm, false);
        assert!(text.contains("G21"));
        assert!(text.contains("G1 X1.0000 Y2.0000 Z-1.0000 F500.0"));
    }

    #[test]
    fn line_numbering_prefixes_every_line() {
        let motions = vec![Motion::Rapid {
            to: Point::new(0.0, 0.0),
            z: 10.0,
            meta: MotionMeta::new(),
        }];
        let text = GenericPost.format(&motions, &[], &[], Units::Mm, true);
        assert!(text.lines().all(|l| l.starts_with('N')));
    }
}
