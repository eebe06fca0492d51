//! waypath-pipeline: Pure trajectory generation pipeline (sans-IO).
//!
//! Turns a chain of cubic Bézier splines into evenly spaced waypoints
//! annotated with target velocities, through:
//! sampling -> arc length -> forward velocity limit ->
//! backward deceleration -> resampling.
//!
//! This crate has **no I/O dependencies**: it operates on in-memory
//! values and returns structured data. It logs through the `log` facade
//! and never installs a logger.
//!
//! Enable the `parallel` feature to sample splines concurrently with
//! rayon; the output is identical to the sequential build.

pub mod arc_length;
pub mod curvature;
pub mod diagnostics;
pub mod path;
pub mod pipeline;
pub mod resample;
pub mod spline;
pub mod types;
pub mod vector;
pub mod velocity;

pub use path::Path;
pub use pipeline::Pipeline;
pub use spline::Spline;
pub use types::{
    OutputSpacing, PipelineError, Point, StagedResult, Trajectory, TrajectoryConfig, Waypoint,
};
pub use vector::Vector;
pub use velocity::{VelocityLimiter, VelocityLimiterKind};

/// Generate a trajectory along `path`.
///
/// Convenience wrapper around [`Path::generate`].
///
/// # Pipeline steps
///
/// 1. Sample each spline `config.tolerance` times (junction samples are
///    not duplicated)
/// 2. Cumulative arc length
/// 3. Forward velocity limit (pluggable [`VelocityLimiterKind`])
/// 4. Backward deceleration so the path ends at rest
/// 5. Resample to evenly arc-length-spaced waypoints
///
/// # Errors
///
/// Returns [`PipelineError::EmptyPath`] if `path` has no splines, and
/// [`PipelineError::InvalidTolerance`], [`PipelineError::InvalidSpacing`]
/// or [`PipelineError::InvalidConfig`] for an invalid `config`.
pub fn generate(path: &Path, config: &TrajectoryConfig) -> Result<Trajectory, PipelineError> {
    path.generate(config)
}
