//! Cumulative arc length along the concatenated samples.

use crate::types::{Point, Waypoint};

/// Annotate each sample with its cumulative distance from the first.
///
/// `distance[0] = 0` and `distance[i] = distance[i-1] + |p[i-1] p[i]|`,
/// so distances are non-decreasing. Velocities start at 0 and are filled
/// in by the velocity stage.
#[must_use]
pub fn measure(points: &[Point]) -> Vec<Waypoint> {
    let mut samples = Vec::with_capacity(points.len());
    let mut distance = 0.0;
    let mut previous: Option<Point> = None;

    for &p in points {
        if let Some(prev) = previous {
            distance += prev.distance(p);
        }
        samples.push(Waypoint {
            distance,
            ..Waypoint::at(p)
        });
        previous = Some(p);
    }

    samples
}

/// Total arc length: the distance of the last sample, or 0 when empty.
#[must_use]
pub fn total_length(samples: &[Waypoint]) -> f64 {
    samples.last().map_or(0.0, |w| w.distance)
}
