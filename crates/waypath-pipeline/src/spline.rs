//! A single cubic Bézier segment and its per-segment sampling.
//!
//! Samples are evenly spaced in the curve parameter `t`, not in arc
//! length; the path's resampling stage evens out the spacing later.

use serde::{Deserialize, Serialize};

use crate::types::{PipelineError, Point, TrajectoryConfig};

/// One cubic Bézier segment.
///
/// `p1` and `p4` lie on the curve; `p2` and `p3` are the tangent handles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spline {
    /// Start point (on-curve).
    pub p1: Point,
    /// First handle (off-curve).
    pub p2: Point,
    /// Second handle (off-curve).
    pub p3: Point,
    /// End point (on-curve).
    pub p4: Point,
}

impl Spline {
    /// Create a spline from its four control points.
    #[must_use]
    pub const fn new(p1: Point, p2: Point, p3: Point, p4: Point) -> Self {
        Self { p1, p2, p3, p4 }
    }

    /// The on-curve start point.
    #[must_use]
    pub const fn start(&self) -> Point {
        self.p1
    }

    /// The on-curve end point.
    #[must_use]
    pub const fn end(&self) -> Point {
        self.p4
    }

    /// Evaluate the curve at parameter `t`:
    /// `(1-t)³P1 + 3t(1-t)²P2 + 3t²(1-t)P3 + t³P4`.
    ///
    /// `t` is not clamped; values outside `[0, 1]` extrapolate the
    /// polynomial. `t = 0` returns `p1` and `t = 1` returns `p4` exactly.
    #[must_use]
    pub fn position(&self, t: f64) -> Point {
        let mt = 1.0 - t;
        let w1 = mt * mt * mt;
        let w2 = 3.0 * t * mt * mt;
        let w3 = 3.0 * t * t * mt;
        let w4 = t * t * t;
        let blend = |a: f64, b: f64, c: f64, d: f64| {
            w4.mul_add(d, w3.mul_add(c, w2.mul_add(b, w1 * a)))
        };
        Point::new(
            blend(self.p1.x, self.p2.x, self.p3.x, self.p4.x),
            blend(self.p1.y, self.p2.y, self.p3.y, self.p4.y),
        )
    }

    /// Sample `tolerance` points evenly spaced in `t` over `[0, 1]`,
    /// both ends included.
    ///
    /// When `is_first` is `false` the `t = 0` sample is dropped, since it
    /// duplicates the previous segment's final sample; the result then
    /// has `tolerance - 1` points.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidTolerance`] when `tolerance` is
    /// above [`TrajectoryConfig::MAX_TOLERANCE`] or below 2
    /// (the step `1 / (tolerance - 1)` is undefined).
    ///
    /// # Examples
    ///
    /// ```
    /// use waypath_pipeline::{Point, Spline};
    ///
    /// let s = Spline::new(
    ///     Point::new(0.0, 0.0),
    ///     Point::new(0.0, 10.0),
    ///     Point::new(10.0, 10.0),
    ///     Point::new(10.0, 0.0),
    /// );
    /// assert_eq!(s.generate_points(5, true).unwrap().len(), 5);
    /// assert_eq!(s.generate_points(5, false).unwrap().len(), 4);
    /// ```
    pub fn generate_points(
        &self,
        tolerance: usize,
        is_first: bool,
    ) -> Result<Vec<Point>, PipelineError> {
        if !(2..=TrajectoryConfig::MAX_TOLERANCE).contains(&tolerance) {
            return Err(PipelineError::InvalidTolerance(tolerance));
        }
        #[allow(clippy::cast_precision_loss)]
        let steps = (tolerance - 1) as f64;
        let first_index = usize::from(!is_first);

        #[allow(clippy::cast_precision_loss)]
        let points = (first_index..tolerance)
            .map(|i| self.position(i as f64 / steps))
            .collect();
        Ok(points)
    }

    /// Piecewise-linear arc length over `tolerance` samples.
    ///
    /// Accuracy improves with `tolerance`; the true arc length is
    /// approached from below.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidTolerance`] for a tolerance that
    /// [`generate_points`](Self::generate_points) rejects.
    pub fn sampled_length(&self, tolerance: usize) -> Result<f64, PipelineError> {
        let points = self.generate_points(tolerance, true)?;
        Ok(points.windows(2).map(|w| w[0].distance(w[1])).sum())
    }
}
