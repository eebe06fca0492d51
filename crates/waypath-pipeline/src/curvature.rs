//! Curvature of the circle through three points.

use crate::types::Point;

/// Offset applied to `p1.x` when it equals `p2.x`, which would otherwise
/// zero the denominator of the bisector solution.
pub const VERTICAL_CHORD_NUDGE: f64 = 1e-5;

/// Curvature (`1 / radius`) of the unique circle through `p1`, `p2`, `p3`.
///
/// Solves for the circle center `(a, b)` by intersecting the
/// perpendicular bisectors of the chords `p1 p2` and `p2 p3`, then takes
/// the radius as the distance from the center to `p1`.
///
/// When `p1.x == p2.x` exactly, `p1.x` is shifted by
/// [`VERTICAL_CHORD_NUDGE`] before solving, which biases the result
/// slightly. Collinear or coincident points have no finite circle and
/// return 0 (a straight line).
///
/// # Examples
///
/// ```
/// use waypath_pipeline::{Point, curvature::curvature};
///
/// // Three points on the unit circle.
/// let k = curvature(Point::new(1.0, 0.0), Point::new(0.0, 1.0), Point::new(-1.0, 0.0));
/// assert!((k - 1.0).abs() < 1e-9);
/// ```
#[must_use]
#[allow(clippy::similar_names, clippy::float_cmp)]
pub fn curvature(p1: Point, p2: Point, p3: Point) -> f64 {
    let mut x1 = p1.x;
    if x1 == p2.x {
        x1 += VERTICAL_CHORD_NUDGE;
    }
    let (y1, x2, y2, x3, y3) = (p1.y, p2.x, p2.y, p3.x, p3.y);

    let k1 = 0.5 * (x1.powi(2) + y1.powi(2) - x2.powi(2) - y2.powi(2)) / (x1 - x2);
    let k2 = (y1 - y2) / (x1 - x2);
    let b_num = x2.powi(2) - 2.0 * x2 * k1 + y2.powi(2) - x3.powi(2) + 2.0 * x3 * k1 - y3.powi(2);
    let b_den = x3 * k2 - y3 + y2 - x2 * k2;

    let b = 0.5 * b_num / b_den;
    let a = k1 - k2 * b;
    let radius = (x1 - a).hypot(y1 - b);
    let curvature = radius.recip();

    if curvature.is_finite() {
        curvature
    } else {
        log::trace!("degenerate curvature at ({}, {}), treating as straight", p2.x, p2.y);
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn on_circle(center: Point, r: f64, angle_deg: f64) -> Point {
        let a = angle_deg.to_radians();
        Point::new(r.mul_add(a.cos(), center.x), r.mul_add(a.sin(), center.y))
    }

    #[test]
    fn known_radius_gives_reciprocal() {
        let center = Point::new(3.0, -2.0);
        for r in [0.5, 2.0, 25.0] {
            let k = curvature(
                on_circle(center, r, 10.0),
                on_circle(center, r, 75.0),
                on_circle(center, r, 200.0),
            );
            assert!(
                (k - 1.0 / r).abs() < 1e-9,
                "radius {r}: expected {}, got {k}",
                1.0 / r
            );
        }
    }

    #[test]
    fn collinear_points_are_straight() {
        let k = curvature(
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 2.0),
        );
        assert!(k.abs() < f64::EPSILON, "expected 0, got {k}");
    }

    #[test]
    fn coincident_points_are_straight() {
        let p = Point::new(4.0, 4.0);
        assert!(curvature(p, p, p).abs() < f64::EPSILON);
    }

    #[test]
    fn vertical_chord_is_nudged_not_degenerate() {
        // p1 and p2 share x; without the nudge the bisector solve divides by zero.
        let center = Point::new(0.0, 0.0);
        let p1 = Point::new(1.0, -1.0);
        let p2 = Point::new(1.0, 1.0);
        let p3 = on_circle(center, 2.0_f64.sqrt(), 180.0);
        let k = curvature(p1, p2, p3);
        let expected = 1.0 / 2.0_f64.sqrt();
        assert!(
            (k - expected).abs() < 1e-4,
            "expected ~{expected}, got {k}"
        );
    }

    #[test]
    fn tighter_turn_has_higher_curvature() {
        let gentle = curvature(
            Point::new(0.0, 0.0),
            Point::new(5.0, 1.0),
            Point::new(10.0, 0.0),
        );
        let sharp = curvature(
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 0.0),
        );
        assert!(sharp > gentle);
    }
}
