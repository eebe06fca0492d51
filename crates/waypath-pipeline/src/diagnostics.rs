//! Pipeline diagnostics: timing, counts, and other metrics for each stage.
//!
//! These diagnostics are permanent instrumentation for parameter
//! experimentation. [`generate_with_diagnostics`] runs the full pipeline
//! and collects per-stage metrics alongside the staged result.
//!
//! Timestamps come from a caller-supplied [`Clock`], which keeps this
//! crate free of any particular time source.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::path::Path;
use crate::pipeline::{Pipeline, PipelineStage};
use crate::types::{PipelineError, StagedResult, TrajectoryConfig};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Source of timestamps for stage timing.
pub trait Clock {
    /// Opaque timestamp type.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 1: per-spline sampling.
    pub sample: StageDiagnostics,
    /// Stage 2: cumulative arc length.
    pub arc_length: StageDiagnostics,
    /// Stage 3: forward velocity pass.
    pub velocity: StageDiagnostics,
    /// Stage 4: backward deceleration pass.
    pub decelerate: StageDiagnostics,
    /// Stage 5: evenly spaced resampling.
    pub resample: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Spline sampling metrics.
    Sample {
        /// Number of splines in the path.
        spline_count: usize,
        /// Samples per spline.
        tolerance: usize,
        /// Concatenated sample count.
        point_count: usize,
    },
    /// Arc-length metrics.
    ArcLength {
        /// Number of measured samples.
        sample_count: usize,
        /// Total path length.
        length: f64,
    },
    /// Forward velocity pass metrics.
    Velocity {
        /// Which limiter ran.
        limiter: String,
        /// Configured ceiling.
        max_speed: f64,
        /// Lowest forward limit.
        min_limit: f64,
        /// Highest forward limit.
        max_limit: f64,
        /// Mean forward limit.
        mean_limit: f64,
    },
    /// Deceleration pass metrics.
    Decelerate {
        /// Configured deceleration bound.
        decel: f64,
        /// Samples whose velocity dropped below their forward limit.
        reduced_count: usize,
        /// Total samples.
        sample_count: usize,
    },
    /// Resampling metrics.
    Resample {
        /// Samples fed into resampling.
        input_count: usize,
        /// Waypoints emitted.
        waypoint_count: usize,
        /// Arc-length step between consecutive waypoints.
        step: f64,
    },
}

/// High-level summary for the entire pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Number of splines in the path.
    pub spline_count: usize,
    /// Raw samples before resampling.
    pub sample_count: usize,
    /// Total path length.
    pub length: f64,
    /// Waypoints in the output trajectory.
    pub waypoint_count: usize,
    /// Highest output velocity.
    pub max_velocity: f64,
    /// Estimated traversal time (seconds), `None` if the trajectory
    /// never moves.
    pub duration_estimate: Option<f64>,
}

impl PipelineDiagnostics {
    /// The per-stage diagnostics in pipeline order, with display names.
    #[must_use]
    pub fn stages(&self) -> [(&'static str, &StageDiagnostics); 5] {
        [
            ("Sample", &self.sample),
            ("Arc Length", &self.arc_length),
            ("Velocity", &self.velocity),
            ("Decelerate", &self.decelerate),
            ("Resample", &self.resample),
        ]
    }

    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Path: {} splines, length {:.3}",
            self.summary.spline_count, self.summary.length,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        for (name, diag) in self.stages() {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        let duration = self
            .summary
            .duration_estimate
            .map_or_else(|| "n/a".to_owned(), |t| format!("{t:.3}s"));
        lines.push(format!(
            "Samples: {}  |  Waypoints: {}  |  Peak velocity: {:.3}  |  Est. duration: {duration}",
            self.summary.sample_count, self.summary.waypoint_count, self.summary.max_velocity,
        ));

        lines.join("\n")
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Sample {
            spline_count,
            tolerance,
            point_count,
        } => format!("{spline_count} splines x {tolerance} -> {point_count} pts"),
        StageMetrics::ArcLength {
            sample_count,
            length,
        } => format!("{sample_count} pts, length={length:.3}"),
        StageMetrics::Velocity {
            limiter,
            max_speed,
            min_limit,
            max_limit,
            mean_limit,
        } => format!(
            "{limiter} cap={max_speed:.1} min={min_limit:.2} max={max_limit:.2} mean={mean_limit:.2}"
        ),
        StageMetrics::Decelerate {
            decel,
            reduced_count,
            sample_count,
        } => format!("decel={decel:.1} reduced {reduced_count}/{sample_count}"),
        StageMetrics::Resample {
            input_count,
            waypoint_count,
            step,
        } => format!("{input_count}->{waypoint_count} pts, step={step:.3}"),
    }
}

/// Time one stage transition and capture the new stage's metrics.
fn timed<C: Clock, T: PipelineStage>(
    clock: &C,
    advance: impl FnOnce() -> Result<T, PipelineError>,
) -> Result<(T, StageDiagnostics), PipelineError> {
    let start = clock.now();
    let stage = advance()?;
    let duration = clock.elapsed(&start);
    // Only Pending lacks metrics, and it is never the result of a transition.
    #[allow(clippy::unreachable)]
    let metrics = stage
        .metrics()
        .unwrap_or_else(|| unreachable!("stage {} produced no metrics", T::NAME));
    Ok((stage, StageDiagnostics { duration, metrics }))
}

/// Run the full pipeline, timing each stage with `clock`.
///
/// # Errors
///
/// Returns the same errors as [`Path::generate`].
pub fn generate_with_diagnostics<C: Clock>(
    path: &Path,
    config: &TrajectoryConfig,
    clock: &C,
) -> Result<(StagedResult, PipelineDiagnostics), PipelineError> {
    let total_start = clock.now();
    let pending = Pipeline::new(path.clone(), config.clone());

    let (sampled, sample) = timed(clock, || pending.sample())?;
    let (measured, arc_length) = timed(clock, || Ok(sampled.measure()))?;
    let (limited, velocity) = timed(clock, || Ok(measured.limit()))?;
    let (decelerated, decelerate) = timed(clock, || Ok(limited.decelerate()))?;
    let (resampled, resample) = timed(clock, || decelerated.resample())?;

    let staged = resampled.into_result();
    let total_duration = clock.elapsed(&total_start);

    let summary = PipelineSummary {
        spline_count: path.len(),
        sample_count: staged.samples.len(),
        length: staged.trajectory.length,
        waypoint_count: staged.trajectory.len(),
        max_velocity: staged.trajectory.max_velocity(),
        duration_estimate: staged.trajectory.duration_estimate(config.decel),
    };

    Ok((
        staged,
        PipelineDiagnostics {
            sample,
            arc_length,
            velocity,
            decelerate,
            resample,
            total_duration,
            summary,
        },
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::spline::Spline;
    use crate::types::Point;

    /// Deterministic clock that advances one millisecond per reading.
    struct StepClock {
        ticks: Cell<u64>,
    }

    impl StepClock {
        const fn new() -> Self {
            Self {
                ticks: Cell::new(0),
            }
        }
    }

    impl Clock for StepClock {
        type Instant = u64;

        fn now(&self) -> u64 {
            let t = self.ticks.get();
            self.ticks.set(t + 1);
            t
        }

        fn elapsed(&self, since: &u64) -> Duration {
            Duration::from_millis(self.now() - since)
        }
    }

    fn path() -> Path {
        Path::from_splines([Spline::new(
            Point::new(0.0, 0.0),
            Point::new(0.0, 10.0),
            Point::new(10.0, 10.0),
            Point::new(10.0, 0.0),
        )])
        .unwrap()
    }

    #[test]
    fn duration_ms_converts_correctly() {
        let d = Duration::from_millis(1234);
        assert!((duration_ms(d) - 1234.0).abs() < 0.01);
    }

    #[test]
    fn diagnostics_cover_every_stage() {
        let (staged, diag) =
            generate_with_diagnostics(&path(), &TrajectoryConfig::default(), &StepClock::new())
                .unwrap();

        assert!(matches!(
            diag.sample.metrics,
            StageMetrics::Sample {
                spline_count: 1,
                tolerance: 50,
                point_count: 50
            }
        ));
        assert!(matches!(
            diag.resample.metrics,
            StageMetrics::Resample {
                waypoint_count: 100,
                ..
            }
        ));
        assert_eq!(diag.summary.waypoint_count, staged.trajectory.len());
        assert_eq!(diag.summary.sample_count, 50);
        for (name, stage) in diag.stages() {
            assert_eq!(stage.duration, Duration::from_millis(1), "{name}");
        }
        assert!(diag.total_duration >= Duration::from_millis(5));
    }

    #[test]
    fn diagnostics_match_plain_generation() {
        let config = TrajectoryConfig::default();
        let (staged, _) = generate_with_diagnostics(&path(), &config, &StepClock::new()).unwrap();
        assert_eq!(staged, path().generate_staged(&config).unwrap());
    }

    #[test]
    fn diagnostics_propagate_errors() {
        let result =
            generate_with_diagnostics(&Path::new(), &TrajectoryConfig::default(), &StepClock::new());
        assert!(matches!(result, Err(PipelineError::EmptyPath)));
    }

    #[test]
    fn report_lists_every_stage() {
        let (_, diag) =
            generate_with_diagnostics(&path(), &TrajectoryConfig::default(), &StepClock::new())
                .unwrap();
        let report = diag.report();
        assert!(report.contains("Pipeline Diagnostics Report"));
        for name in ["Sample", "Arc Length", "Velocity", "Decelerate", "Resample"] {
            assert!(report.contains(name), "report missing {name}:\n{report}");
        }
        assert!(report.contains("SegmentLength"));
    }

    #[test]
    fn diagnostics_serialize_durations_as_seconds() {
        let (_, diag) =
            generate_with_diagnostics(&path(), &TrajectoryConfig::default(), &StepClock::new())
                .unwrap();
        let json = serde_json::to_value(&diag).unwrap();
        let secs = json["sample"]["duration"].as_f64().unwrap();
        assert!((secs - 0.001).abs() < 1e-12);

        let back: PipelineDiagnostics = serde_json::from_value(json).unwrap();
        assert_eq!(back.sample.duration, Duration::from_millis(1));
    }

    #[test]
    fn arch_summary_has_finite_duration_and_round_trips() {
        let config = TrajectoryConfig::default();
        let (staged, diag) = generate_with_diagnostics(&path(), &config, &StepClock::new()).unwrap();

        // The arch ends with two waypoints that both copy the resting
        // final sample.
        let waypoints = &staged.trajectory.waypoints;
        let tail = &waypoints[waypoints.len() - 2..];
        assert!(tail.iter().all(|w| w.velocity.abs() < f64::EPSILON));

        let estimate = diag.summary.duration_estimate.unwrap();
        assert!(estimate.is_finite() && estimate > 0.0, "estimate {estimate}");

        let json = serde_json::to_string(&diag).unwrap();
        let back: PipelineDiagnostics = serde_json::from_str(&json).unwrap();
        let restored = back.summary.duration_estimate.unwrap();
        assert!((restored - estimate).abs() < 1e-9, "{restored} vs {estimate}");
        assert!(diag.report().contains(&format!("Est. duration: {estimate:.3}s")));
    }

    #[test]
    fn summary_without_decel_reports_no_duration() {
        // With zero deceleration the backward pass pins every sample at rest.
        let config = TrajectoryConfig {
            decel: 0.0,
            ..TrajectoryConfig::default()
        };
        let (_, diag) = generate_with_diagnostics(&path(), &config, &StepClock::new()).unwrap();
        assert_eq!(diag.summary.duration_estimate, None);
        assert!(diag.report().contains("Est. duration: n/a"));

        let json = serde_json::to_string(&diag).unwrap();
        let back: PipelineDiagnostics = serde_json::from_str(&json).unwrap();
        assert_eq!(back.summary.duration_estimate, None);
    }
}
