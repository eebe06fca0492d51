//! Velocity profile: a forward limiting pass and a backward deceleration
//! pass.
//!
//! The forward pass assigns every sample a speed ceiling. This module
//! defines the [`VelocityLimiter`] trait for pluggable forward passes and
//! the [`VelocityLimiterKind`] enum for runtime selection. The backward
//! pass ([`decelerate`]) then walks from the end of the path to the
//! start so the robot can come to rest at the final sample without
//! exceeding any forward limit.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::curvature::curvature;
use crate::types::{TrajectoryConfig, Waypoint};

/// Selects which forward velocity pass to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VelocityLimiterKind {
    /// Scale the distance to the next sample by the curvature multiplier.
    ///
    /// Samples are evenly spaced in `t`, so they bunch together where the
    /// curve's parametric speed drops (typically around tight bends).
    /// Short sample steps therefore act as a proxy for sharpness.
    #[default]
    SegmentLength,

    /// Divide the curvature multiplier by the curvature of the circle
    /// through each sample and its two neighbours.
    ///
    /// Straight stretches (zero curvature) run at the maximum speed.
    Curvature,
}

impl fmt::Display for VelocityLimiterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SegmentLength => f.write_str("SegmentLength"),
            Self::Curvature => f.write_str("Curvature"),
        }
    }
}

/// Trait for forward velocity passes.
///
/// Input: samples with cumulative distance. Output: one speed ceiling per
/// sample, each within `[0, max_speed]`.
pub trait VelocityLimiter {
    /// Compute the forward speed limit for every sample.
    fn limit(&self, samples: &[Waypoint], config: &TrajectoryConfig) -> Vec<f64>;
}

impl VelocityLimiter for VelocityLimiterKind {
    fn limit(&self, samples: &[Waypoint], config: &TrajectoryConfig) -> Vec<f64> {
        match *self {
            Self::SegmentLength => {
                limit_by_segment_length(samples, config.max_speed, config.curvature_multiplier)
            }
            Self::Curvature => {
                limit_by_curvature(samples, config.max_speed, config.curvature_multiplier)
            }
        }
    }
}

/// Forward pass using sample spacing as the sharpness proxy.
///
/// For each adjacent pair, `limit[i] = min(max_speed, multiplier * |p[i] p[i+1]|)`.
/// The last sample has no successor and copies the second-to-last limit.
/// Fewer than 2 samples yield all-zero limits.
#[must_use]
pub fn limit_by_segment_length(samples: &[Waypoint], max_speed: f64, multiplier: f64) -> Vec<f64> {
    if samples.len() < 2 {
        return vec![0.0; samples.len()];
    }

    let mut limits: Vec<f64> = samples
        .windows(2)
        .map(|w| {
            let step = w[0].position().distance(w[1].position());
            max_speed.min(multiplier * step)
        })
        .collect();
    let last = limits[limits.len() - 1];
    limits.push(last);
    limits
}

/// Forward pass using the measured curvature at each interior sample.
///
/// `limit[i] = min(max_speed, multiplier / curvature(p[i-1], p[i], p[i+1]))`,
/// where zero curvature means `max_speed`. The first and last samples
/// copy their neighbour's limit. Two samples form a straight line and
/// both get `max_speed`; fewer yield all-zero limits.
#[must_use]
pub fn limit_by_curvature(samples: &[Waypoint], max_speed: f64, multiplier: f64) -> Vec<f64> {
    match samples.len() {
        0 | 1 => return vec![0.0; samples.len()],
        2 => return vec![max_speed; 2],
        _ => {}
    }

    let interior = samples.windows(3).map(|w| {
        let k = curvature(w[0].position(), w[1].position(), w[2].position());
        if k > 0.0 {
            max_speed.min(multiplier / k)
        } else {
            max_speed
        }
    });

    let mut limits = Vec::with_capacity(samples.len());
    limits.push(0.0);
    limits.extend(interior);
    limits[0] = limits[1];
    let last = limits[limits.len() - 1];
    limits.push(last);
    limits
}

/// Backward deceleration pass.
///
/// Sets each sample's velocity to its forward limit, forces the last to
/// 0, then walks from the end to the start applying the kinematic bound
/// `v[i-1] = min(sqrt(v[i]² + 2 * decel * |p[i] p[i-1]|), limit[i-1])`.
/// The result never exceeds the forward limit at any index.
///
/// `limits` must be index-aligned with `samples`; extra entries on
/// either side are ignored.
pub fn decelerate(samples: &mut [Waypoint], limits: &[f64], decel: f64) {
    for (sample, &limit) in samples.iter_mut().zip(limits) {
        sample.velocity = limit;
    }

    let Some(last) = samples.last_mut() else {
        return;
    };
    last.velocity = 0.0;

    for i in (1..samples.len()).rev() {
        let current = samples[i];
        let previous = &mut samples[i - 1];
        let step = current.position().distance(previous.position());
        let reachable = current
            .velocity
            .mul_add(current.velocity, 2.0 * decel * step)
            .sqrt();
        previous.velocity = reachable.min(previous.velocity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arc_length::measure;
    use crate::types::Point;

    fn line(xs: &[f64]) -> Vec<Waypoint> {
        let points: Vec<Point> = xs.iter().map(|&x| Point::new(x, 0.0)).collect();
        measure(&points)
    }

    #[test]
    fn default_is_segment_length() {
        assert_eq!(VelocityLimiterKind::default(), VelocityLimiterKind::SegmentLength);
    }

    #[test]
    fn display_names() {
        assert_eq!(VelocityLimiterKind::SegmentLength.to_string(), "SegmentLength");
        assert_eq!(VelocityLimiterKind::Curvature.to_string(), "Curvature");
    }

    // --- Segment-length pass ---

    #[test]
    fn segment_length_scales_step() {
        let samples = line(&[0.0, 1.0, 3.0, 3.5]);
        let limits = limit_by_segment_length(&samples, 100.0, 10.0);
        let expected = [10.0, 20.0, 5.0, 5.0];
        assert_eq!(limits.len(), samples.len());
        for (l, e) in limits.iter().zip(expected) {
            assert!((l - e).abs() < 1e-12, "expected {e}, got {l}");
        }
    }

    #[test]
    fn segment_length_is_capped_at_max_speed() {
        let samples = line(&[0.0, 10.0, 20.0]);
        let limits = limit_by_segment_length(&samples, 7.0, 10.0);
        assert!(limits.iter().all(|&l| (l - 7.0).abs() < f64::EPSILON));
    }

    #[test]
    fn segment_length_short_inputs() {
        assert!(limit_by_segment_length(&[], 5.0, 1.0).is_empty());
        assert_eq!(limit_by_segment_length(&line(&[1.0]), 5.0, 1.0), vec![0.0]);
    }

    // --- Curvature pass ---

    #[test]
    fn curvature_on_straight_line_is_max_speed() {
        let samples = line(&[0.0, 1.0, 2.0, 3.0]);
        let limits = limit_by_curvature(&samples, 12.0, 1.0);
        assert!(limits.iter().all(|&l| (l - 12.0).abs() < f64::EPSILON));
    }

    #[test]
    fn curvature_on_circle_is_multiplier_times_radius() {
        let r = 4.0;
        let points: Vec<Point> = (0..8)
            .map(|i| {
                let a = f64::from(i) * 0.3;
                Point::new(r * a.cos(), r * a.sin())
            })
            .collect();
        let samples = measure(&points);
        let limits = limit_by_curvature(&samples, 100.0, 2.0);
        for &l in &limits {
            assert!((l - 2.0 * r).abs() < 1e-6, "expected {}, got {l}", 2.0 * r);
        }
    }

    #[test]
    fn curvature_endpoints_copy_neighbours() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 0.0),
            Point::new(10.0, 0.0),
        ];
        let limits = limit_by_curvature(&measure(&points), 100.0, 1.0);
        assert!((limits[0] - limits[1]).abs() < f64::EPSILON);
        assert!((limits[3] - limits[2]).abs() < f64::EPSILON);
    }

    #[test]
    fn curvature_short_inputs() {
        assert!(limit_by_curvature(&[], 5.0, 1.0).is_empty());
        assert_eq!(limit_by_curvature(&line(&[0.0]), 5.0, 1.0), vec![0.0]);
        assert_eq!(limit_by_curvature(&line(&[0.0, 1.0]), 5.0, 1.0), vec![5.0, 5.0]);
    }

    // --- Deceleration pass ---

    #[test]
    fn decelerate_stops_at_end() {
        let mut samples = line(&[0.0, 1.0, 2.0, 3.0]);
        decelerate(&mut samples, &[50.0; 4], 2.0);
        assert!(samples[3].velocity.abs() < f64::EPSILON);
        // v² = 2 * a * d from the end: d = 1, 2, 3 → v = 2, √8, √12.
        assert!((samples[2].velocity - 2.0).abs() < 1e-12);
        assert!((samples[1].velocity - 8.0_f64.sqrt()).abs() < 1e-12);
        assert!((samples[0].velocity - 12.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn decelerate_never_exceeds_forward_limit() {
        let mut samples = line(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        let limits = [3.0, 1.0, 5.0, 0.5, 9.0, 9.0];
        decelerate(&mut samples, &limits, 10.0);
        for (w, &l) in samples.iter().zip(&limits) {
            assert!(w.velocity <= l + 1e-12, "velocity {} exceeds limit {l}", w.velocity);
        }
        // A slow sample caps what can be reached just before it.
        let after_slow = 0.5_f64.mul_add(0.5, 2.0 * 10.0).sqrt();
        assert!((samples[2].velocity - after_slow).abs() < 1e-12);
    }

    #[test]
    fn decelerate_with_zero_decel_holds_zero() {
        let mut samples = line(&[0.0, 1.0, 2.0]);
        decelerate(&mut samples, &[4.0; 3], 0.0);
        assert!(samples.iter().all(|w| w.velocity.abs() < f64::EPSILON));
    }

    #[test]
    fn decelerate_empty_is_noop() {
        let mut samples: Vec<Waypoint> = Vec::new();
        decelerate(&mut samples, &[], 1.0);
        assert!(samples.is_empty());
    }
}
