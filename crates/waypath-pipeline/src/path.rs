//! An ordered chain of splines and the top-level generation entry points.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::pipeline::Pipeline;
use crate::spline::Spline;
use crate::types::{PipelineError, Point, StagedResult, Trajectory, TrajectoryConfig};

/// Maximum per-axis gap between a spline's end and the next spline's
/// start for the two to count as joined.
pub const JOIN_TOLERANCE: f64 = 1e-9;

/// An ordered list of splines laid end to end.
///
/// Insertion order is traversal order. Every spline after the first
/// starts where its predecessor ends (within [`JOIN_TOLERANCE`]); the
/// constructors reject anything else, so a `Path` is always continuous.
///
/// A `Path` holds only splines. All derived data (samples, arc length,
/// velocities, waypoints) is recomputed by each call to
/// [`generate`](Self::generate) and returned by value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Spline>", into = "Vec<Spline>")]
pub struct Path {
    splines: Vec<Spline>,
}

impl Path {
    /// Create an empty path.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            splines: Vec::new(),
        }
    }

    /// Build a path from splines in traversal order.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Discontinuity`] for the first spline
    /// that does not start where the previous one ends.
    pub fn from_splines(splines: impl IntoIterator<Item = Spline>) -> Result<Self, PipelineError> {
        let mut path = Self::new();
        for spline in splines {
            path.add_spline(spline)?;
        }
        Ok(path)
    }

    /// Append a spline to the end of the path.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Discontinuity`] when `spline.p1` is
    /// further than [`JOIN_TOLERANCE`] (on either axis) from the current
    /// last spline's `p4`. The path is left unchanged.
    pub fn add_spline(&mut self, spline: Spline) -> Result<(), PipelineError> {
        if let Some(previous) = self.splines.last() {
            let expected = previous.end();
            let found = spline.start();
            if !joins(expected, found) {
                return Err(PipelineError::Discontinuity {
                    index: self.splines.len(),
                    expected,
                    found,
                });
            }
        }
        self.splines.push(spline);
        Ok(())
    }

    /// The splines in traversal order.
    #[must_use]
    pub fn splines(&self) -> &[Spline] {
        &self.splines
    }

    /// Number of splines.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.splines.len()
    }

    /// Returns `true` if the path has no splines.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.splines.is_empty()
    }

    /// Generate the evenly spaced, velocity-annotated trajectory.
    ///
    /// Runs every stage of the [`Pipeline`] and keeps only the final
    /// waypoints and length.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyPath`] for a path with no splines,
    /// or the validation error for an invalid `config`.
    pub fn generate(&self, config: &TrajectoryConfig) -> Result<Trajectory, PipelineError> {
        Ok(self.generate_staged(config)?.trajectory)
    }

    /// Generate the trajectory and keep every intermediate.
    ///
    /// # Errors
    ///
    /// Same as [`generate`](Self::generate).
    pub fn generate_staged(&self, config: &TrajectoryConfig) -> Result<StagedResult, PipelineError> {
        Ok(Pipeline::new(self.clone(), config.clone())
            .sample()?
            .measure()
            .limit()
            .decelerate()
            .resample()?
            .into_result())
    }
}

impl TryFrom<Vec<Spline>> for Path {
    type Error = PipelineError;

    fn try_from(splines: Vec<Spline>) -> Result<Self, Self::Error> {
        Self::from_splines(splines)
    }
}

impl From<Path> for Vec<Spline> {
    fn from(path: Path) -> Self {
        path.splines
    }
}

fn joins(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() <= JOIN_TOLERANCE && (a.y - b.y).abs() <= JOIN_TOLERANCE
}

/// Sample every spline and concatenate the results.
///
/// Only the first spline keeps its `t = 0` sample, so junctions are not
/// duplicated: `n` splines yield `tolerance + (n - 1) * (tolerance - 1)`
/// points.
pub(crate) fn sample_splines(
    splines: &[Spline],
    tolerance: usize,
) -> Result<Vec<Point>, PipelineError> {
    let segments = sample_segments(splines, tolerance)?;
    Ok(segments.concat())
}

#[cfg(feature = "parallel")]
fn sample_segments(
    splines: &[Spline],
    tolerance: usize,
) -> Result<Vec<Vec<Point>>, PipelineError> {
    splines
        .par_iter()
        .enumerate()
        .map(|(i, spline)| spline.generate_points(tolerance, i == 0))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn sample_segments(
    splines: &[Spline],
    tolerance: usize,
) -> Result<Vec<Vec<Point>>, PipelineError> {
    splines
        .iter()
        .enumerate()
        .map(|(i, spline)| spline.generate_points(tolerance, i == 0))
        .collect()
}
