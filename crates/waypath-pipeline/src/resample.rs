//! Evenly spaced resampling of the velocity-annotated samples.
//!
//! The raw samples are evenly spaced in the curve parameter, so their
//! arc-length spacing varies with the curve's parametric speed. This
//! stage emits a fixed number of waypoints at equal arc-length steps,
//! interpolating positions between the bracketing samples.

use crate::types::{PipelineError, Waypoint};
use crate::vector::Vector;

/// Resample `samples` into exactly `spacing` waypoints evenly spaced in
/// arc length over `[0, length]`.
///
/// Waypoint `i` targets `u = length * i / (spacing - 1)`. For each target
/// the bracketing sample is the last one with `distance <= u`, found by
/// binary search:
///
/// - if that sample sits exactly at `u`, or is the final sample, it is
///   copied with `distance = u`;
/// - otherwise the position is interpolated towards the next sample at
///   offset `u - sample.distance`, and the velocity is taken from the
///   next sample when the offset is past the midpoint of the step, else
///   from the current one.
///
/// `samples` must have non-decreasing `distance`, as produced by
/// [`measure`](crate::arc_length::measure).
///
/// # Errors
///
/// Returns [`PipelineError::InvalidSpacing`] when `spacing < 2` and
/// [`PipelineError::EmptyPath`] when `samples` is empty.
#[allow(clippy::cast_precision_loss, clippy::float_cmp)]
pub fn spaced_points(
    samples: &[Waypoint],
    length: f64,
    spacing: usize,
) -> Result<Vec<Waypoint>, PipelineError> {
    if spacing < 2 {
        return Err(PipelineError::InvalidSpacing(spacing));
    }
    if samples.is_empty() {
        return Err(PipelineError::EmptyPath);
    }

    let steps = (spacing - 1) as f64;
    let mut waypoints = Vec::with_capacity(spacing);

    for i in 0..spacing {
        let u = length * (i as f64 / steps);
        let index = samples
            .partition_point(|s| s.distance <= u)
            .saturating_sub(1);
        let current = samples[index];

        if current.distance == u || index + 1 == samples.len() {
            waypoints.push(Waypoint {
                distance: u,
                ..current
            });
            continue;
        }

        let next = samples[index + 1];
        let offset = u - current.distance;
        let position = Vector::new(current.position(), next.position()).interpolate(offset)?;
        let half_step = (next.distance - current.distance) / 2.0;
        let velocity = if offset > half_step {
            next.velocity
        } else {
            current.velocity
        };

        waypoints.push(Waypoint {
            x: position.x,
            y: position.y,
            distance: u,
            velocity,
        });
    }

    debug_assert_eq!(waypoints.len(), spacing);
    debug_assert!(
        waypoints.last().is_none_or(|w| w.distance == length),
        "last waypoint must land on the path length"
    );
    Ok(waypoints)
}
