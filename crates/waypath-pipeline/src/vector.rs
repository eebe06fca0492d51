//! Directed line segment between two points.
//!
//! Interpolation here is distance-based, not fractional: `interpolate(d)`
//! walks `d` units from `start` towards `end`.

use crate::types::{PipelineError, Point};

/// A directed segment from `start` to `end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vector {
    /// Tail of the vector.
    pub start: Point,
    /// Head of the vector.
    pub end: Point,
}

impl Vector {
    /// Create a vector from `start` to `end`.
    #[must_use]
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Euclidean length from `start` to `end`. Zero-length vectors
    /// return 0.
    #[must_use]
    pub fn magnitude(&self) -> f64 {
        self.start.distance(self.end)
    }

    /// The point at signed distance `d` from `start` in the direction of
    /// `end`: `start + d * (end - start) / magnitude`.
    ///
    /// Negative `d` walks backwards past `start`; `d` greater than the
    /// magnitude extrapolates past `end`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ZeroLengthVector`] when the magnitude is
    /// zero or not finite, since the direction is undefined.
    ///
    /// # Examples
    ///
    /// ```
    /// use waypath_pipeline::{Point, Vector};
    ///
    /// let v = Vector::new(Point::new(0.0, 0.0), Point::new(3.0, 4.0));
    /// let p = v.interpolate(2.5).unwrap();
    /// assert!((p.x - 1.5).abs() < 1e-12);
    /// assert!((p.y - 2.0).abs() < 1e-12);
    /// ```
    pub fn interpolate(&self, d: f64) -> Result<Point, PipelineError> {
        let magnitude = self.magnitude();
        if !(magnitude > 0.0 && magnitude.is_finite()) {
            return Err(PipelineError::ZeroLengthVector);
        }
        let scale = d / magnitude;
        Ok(Point::new(
            (self.end.x - self.start.x).mul_add(scale, self.start.x),
            (self.end.y - self.start.y).mul_add(scale, self.start.y),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn magnitude_of_3_4_5_triangle() {
        let v = Vector::new(Point::new(1.0, 1.0), Point::new(4.0, 5.0));
        assert!((v.magnitude() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_length_magnitude_is_zero() {
        let p = Point::new(2.0, -7.0);
        assert!(Vector::new(p, p).magnitude().abs() < f64::EPSILON);
    }

    #[test]
    fn interpolate_is_distance_based() {
        // 10-unit horizontal vector: distance 4 lands at x = 4, not x = 40.
        let v = Vector::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        let p = v.interpolate(4.0).unwrap();
        assert!((p.x - 4.0).abs() < 1e-12);
        assert!(p.y.abs() < 1e-12);
    }

    #[test]
    fn interpolate_endpoints() {
        let v = Vector::new(Point::new(-1.0, 2.0), Point::new(2.0, 6.0));
        let start = v.interpolate(0.0).unwrap();
        let end = v.interpolate(v.magnitude()).unwrap();
        assert!(start.distance(v.start) < 1e-12);
        assert!(end.distance(v.end) < 1e-12);
    }

    #[test]
    fn interpolate_negative_distance_walks_backwards() {
        let v = Vector::new(Point::new(0.0, 0.0), Point::new(0.0, 2.0));
        let p = v.interpolate(-1.0).unwrap();
        assert!((p.y + 1.0).abs() < 1e-12);
    }

    #[test]
    fn interpolate_zero_length_is_rejected() {
        let p = Point::new(3.0, 3.0);
        assert_eq!(
            Vector::new(p, p).interpolate(1.0),
            Err(PipelineError::ZeroLengthVector)
        );
    }
}
