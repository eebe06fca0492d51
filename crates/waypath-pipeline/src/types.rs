//! Shared types for the waypath trajectory pipeline.

use serde::{Deserialize, Serialize};

use crate::velocity::VelocityLimiterKind;

/// A 2D point in path coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// A processed point on the path: position plus cumulative arc length
/// and target speed.
///
/// Every derived sequence owns its own waypoints; mutating one never
/// affects another view of the same logical sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
    /// Arc length from the start of the path.
    pub distance: f64,
    /// Target speed at this point.
    pub velocity: f64,
}

impl Waypoint {
    /// Create a waypoint at `point` with zero distance and velocity.
    #[must_use]
    pub const fn at(point: Point) -> Self {
        Self {
            x: point.x,
            y: point.y,
            distance: 0.0,
            velocity: 0.0,
        }
    }

    /// The position of this waypoint.
    #[must_use]
    pub const fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// How many evenly spaced waypoints the resampling stage emits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OutputSpacing {
    /// Emit exactly this many waypoints (at least 2).
    PointCount(usize),

    /// Derive the count from the path length: `round(length / d)`,
    /// clamped to at least 2.
    DistancePerPoint(f64),
}

impl Default for OutputSpacing {
    fn default() -> Self {
        Self::PointCount(TrajectoryConfig::DEFAULT_SPACING)
    }
}

impl OutputSpacing {
    /// Largest waypoint count either variant may resolve to.
    pub const MAX_POINT_COUNT: usize = 1_000_000;

    /// Resolve the waypoint count for a path of the given length.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidSpacing`] for a point count outside
    /// `2..=MAX_POINT_COUNT`, and [`PipelineError::InvalidConfig`] for a
    /// non-positive or non-finite distance per point, or one so small the
    /// count would exceed [`MAX_POINT_COUNT`](Self::MAX_POINT_COUNT).
    pub fn resolve(self, length: f64) -> Result<usize, PipelineError> {
        match self {
            Self::PointCount(n) if !(2..=Self::MAX_POINT_COUNT).contains(&n) => {
                Err(PipelineError::InvalidSpacing(n))
            }
            Self::PointCount(n) => Ok(n),
            Self::DistancePerPoint(d) if !d.is_finite() || d <= 0.0 => Err(
                PipelineError::InvalidConfig(format!("distance per point must be positive, got {d}")),
            ),
            Self::DistancePerPoint(d) => {
                let raw = (length / d).round();
                if raw.is_nan() || raw < 2.0 {
                    log::warn!(
                        "path length {length:.3} yields {raw} points at {d} per point, clamping to 2"
                    );
                    return Ok(2);
                }
                #[allow(clippy::cast_precision_loss)]
                let ceiling = Self::MAX_POINT_COUNT as f64;
                if raw > ceiling {
                    return Err(PipelineError::InvalidConfig(format!(
                        "path length {length:.3} at {d} per point needs {raw} points, above the limit of {}",
                        Self::MAX_POINT_COUNT
                    )));
                }
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let count = raw as usize;
                Ok(count)
            }
        }
    }
}

/// Tunable parameters for trajectory generation.
///
/// Passed by reference into [`Path::generate`](crate::Path::generate);
/// the pipeline never reads ambient state. Call
/// [`validate`](Self::validate) to check invariants up front; generation
/// validates again before doing any work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryConfig {
    /// Samples generated per spline segment. Must be at least 2.
    pub tolerance: usize,

    /// Number (or density) of evenly spaced output waypoints.
    pub spacing: OutputSpacing,

    /// Hard velocity ceiling.
    pub max_speed: f64,

    /// Scale applied by the forward velocity pass.
    ///
    /// With [`VelocityLimiterKind::SegmentLength`] the limit is
    /// `curvature_multiplier * sample_spacing`; with
    /// [`VelocityLimiterKind::Curvature`] it is
    /// `curvature_multiplier / curvature`.
    ///
    /// The value is used as given. Sample spacing shrinks as `tolerance`
    /// grows, so under `SegmentLength` raising `tolerance` alone lowers
    /// every limit. Use [`scaled_multiplier`](Self::scaled_multiplier)
    /// to keep the limits independent of `tolerance`.
    pub curvature_multiplier: f64,

    /// Deceleration bound (distance units per time squared) for the
    /// backward pass.
    pub decel: f64,

    /// Which forward velocity pass to run.
    pub velocity_limiter: VelocityLimiterKind,
}

impl TrajectoryConfig {
    /// Default samples per spline segment.
    pub const DEFAULT_TOLERANCE: usize = 50;
    /// Default number of output waypoints.
    pub const DEFAULT_SPACING: usize = 100;
    /// Default velocity ceiling.
    pub const DEFAULT_MAX_SPEED: f64 = 60.0;
    /// Default forward-pass scale.
    pub const DEFAULT_CURVATURE_MULTIPLIER: f64 = 50.0;
    /// Default deceleration bound.
    pub const DEFAULT_DECEL: f64 = 40.0;
    /// Largest accepted `tolerance`.
    pub const MAX_TOLERANCE: usize = 1_000_000;

    /// A `curvature_multiplier` for `tolerance` that keeps
    /// segment-length limits independent of the sampling density:
    /// `scale * tolerance / 100`.
    ///
    /// At `tolerance = 100` the result equals `scale`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn scaled_multiplier(scale: f64, tolerance: usize) -> f64 {
        scale * tolerance as f64 / 100.0
    }

    /// Check every parameter invariant.
    ///
    /// The output spacing is only partially checked here: a
    /// [`OutputSpacing::DistancePerPoint`] count depends on the path
    /// length and is resolved after the arc-length stage.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidTolerance`] when `tolerance` is
    /// outside `2..=MAX_TOLERANCE`, [`PipelineError::InvalidSpacing`] when
    /// a point count is outside `2..=OutputSpacing::MAX_POINT_COUNT`, and
    /// [`PipelineError::InvalidConfig`] for a non-finite or negative speed,
    /// multiplier, deceleration, or density.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(2..=Self::MAX_TOLERANCE).contains(&self.tolerance) {
            return Err(PipelineError::InvalidTolerance(self.tolerance));
        }
        match self.spacing {
            OutputSpacing::PointCount(n) if !(2..=OutputSpacing::MAX_POINT_COUNT).contains(&n) => {
                return Err(PipelineError::InvalidSpacing(n));
            }
            OutputSpacing::DistancePerPoint(d) if !d.is_finite() || d <= 0.0 => {
                return Err(PipelineError::InvalidConfig(format!(
                    "distance per point must be positive, got {d}"
                )));
            }
            _ => {}
        }
        if !self.max_speed.is_finite() || self.max_speed <= 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "max speed must be positive, got {}",
                self.max_speed
            )));
        }
        check_non_negative("curvature multiplier", self.curvature_multiplier)?;
        check_non_negative("deceleration", self.decel)?;
        Ok(())
    }
}

fn check_non_negative(name: &str, value: f64) -> Result<(), PipelineError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(PipelineError::InvalidConfig(format!(
            "{name} must be finite and non-negative, got {value}"
        )))
    }
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            tolerance: Self::DEFAULT_TOLERANCE,
            spacing: OutputSpacing::default(),
            max_speed: Self::DEFAULT_MAX_SPEED,
            curvature_multiplier: Self::DEFAULT_CURVATURE_MULTIPLIER,
            decel: Self::DEFAULT_DECEL,
            velocity_limiter: VelocityLimiterKind::default(),
        }
    }
}

/// The evenly spaced, velocity-annotated output of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    /// Evenly arc-length-spaced waypoints, first at distance 0 and last
    /// at `length`.
    pub waypoints: Vec<Waypoint>,

    /// Total arc length of the sampled path.
    pub length: f64,
}

impl Trajectory {
    /// Returns the number of waypoints.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Returns `true` if there are no waypoints.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// The highest target velocity on the trajectory (0 when empty).
    #[must_use]
    pub fn max_velocity(&self) -> f64 {
        self.waypoints
            .iter()
            .map(|w| w.velocity)
            .fold(0.0, f64::max)
    }

    /// Rough traversal time assuming constant acceleration between
    /// waypoints.
    ///
    /// A step covered at mean speed `(v0 + v1) / 2` takes
    /// `step / mean`. Resampling copies the velocity of the nearest raw
    /// sample, so the final steps can both read 0 even though the path
    /// only reaches rest at its end; such a step is timed as starting
    /// from rest at `decel`, `sqrt(2 * step / decel)`. Zero-length steps
    /// take no time.
    ///
    /// Returns `None` when a step has length but no velocity and
    /// `decel` is not positive, i.e. the trajectory never moves.
    #[must_use]
    pub fn duration_estimate(&self, decel: f64) -> Option<f64> {
        self.waypoints
            .windows(2)
            .map(|w| {
                let step = w[1].distance - w[0].distance;
                let mean = (w[0].velocity + w[1].velocity) / 2.0;
                if step <= 0.0 {
                    Some(0.0)
                } else if mean > 0.0 {
                    Some(step / mean)
                } else if decel > 0.0 {
                    Some((2.0 * step / decel).sqrt())
                } else {
                    None
                }
            })
            .sum::<Option<f64>>()
            .filter(|t| t.is_finite())
    }
}

/// Result of running the pipeline with the intermediate stage outputs
/// preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedResult {
    /// Concatenated raw samples with cumulative distance and final
    /// (decelerated) velocity.
    pub samples: Vec<Waypoint>,

    /// Forward-pass velocity limits, index-aligned with `samples`.
    pub forward_velocities: Vec<f64>,

    /// Resolved number of output waypoints.
    pub spacing: usize,

    /// The resampled trajectory.
    pub trajectory: Trajectory,
}

/// Errors that can occur while building a path or generating a
/// trajectory.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    /// Samples per spline outside `2..=TrajectoryConfig::MAX_TOLERANCE`.
    #[error("tolerance must be between 2 and 1000000 samples per spline, got {0}")]
    InvalidTolerance(usize),

    /// Output waypoint count outside `2..=OutputSpacing::MAX_POINT_COUNT`.
    #[error("spacing must be between 2 and 1000000 output points, got {0}")]
    InvalidSpacing(usize),

    /// A tunable parameter is out of range.
    #[error("invalid trajectory configuration: {0}")]
    InvalidConfig(String),

    /// Generation was requested on a path with no splines.
    #[error("path has no splines")]
    EmptyPath,

    /// A spline does not start where the previous one ends.
    #[error(
        "spline {index} starts at ({}, {}) but the previous spline ends at ({}, {})",
        .found.x, .found.y, .expected.x, .expected.y
    )]
    Discontinuity {
        /// Index the rejected spline would have had.
        index: usize,
        /// End point of the previous spline.
        expected: Point,
        /// Start point of the rejected spline.
        found: Point,
    },

    /// Interpolation was attempted along a zero-length vector.
    #[error("cannot interpolate along a zero-length vector")]
    ZeroLengthVector,
}
