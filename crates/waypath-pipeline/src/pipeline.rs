//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`Path::generate`] which runs every stage in one call,
//! [`Pipeline`] lets the caller drive execution one step at a time:
//!
//! ```rust
//! # use waypath_pipeline::{Path, Pipeline, PipelineError, TrajectoryConfig};
//! # fn run(path: Path) -> Result<(), PipelineError> {
//! let staged = Pipeline::new(path, TrajectoryConfig::default())
//!     .sample()?
//!     .measure()
//!     .limit()
//!     .decelerate()
//!     .resample()?
//!     .into_result();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline state
//! (or `Result` for fallible stages), carrying forward everything later
//! stages and the final [`StagedResult`] need. Skipping a stage or
//! running stages out of order is a compile-time error, and no
//! half-built state is ever observable.

use crate::diagnostics::StageMetrics;
use crate::path::Path;
use crate::spline::Spline;
use crate::types::{PipelineError, Point, StagedResult, Trajectory, TrajectoryConfig, Waypoint};
use crate::velocity::VelocityLimiter;

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
///
/// The path and config are stored but not yet touched.
/// Call [`sample`](Self::sample) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing; call .sample() to continue"]
pub struct Pending {
    config: TrajectoryConfig,
    path: Path,
}

impl Pending {
    /// The splines to be sampled.
    #[must_use]
    pub fn splines(&self) -> &[Spline] {
        self.path.splines()
    }

    /// Validate the config, sample every spline, and advance to the
    /// [`Sampled`] stage.
    ///
    /// # Errors
    ///
    /// Returns the [`TrajectoryConfig::validate`] error for an invalid
    /// config, and [`PipelineError::EmptyPath`] when the path has no
    /// splines.
    pub fn sample(self) -> Result<Sampled, PipelineError> {
        self.config.validate()?;
        if self.path.is_empty() {
            return Err(PipelineError::EmptyPath);
        }
        let points = crate::path::sample_splines(self.path.splines(), self.config.tolerance)?;
        log::debug!(
            "sampled {} splines at tolerance {} into {} points",
            self.path.len(),
            self.config.tolerance,
            points.len(),
        );
        Ok(Sampled {
            config: self.config,
            spline_count: self.path.len(),
            points,
        })
    }
}

// ───────────────────────── Stage 1: Sampled ──────────────────────────

/// Pipeline state after sampling every spline.
///
/// Call [`measure`](Self::measure) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing; call .measure() to continue"]
pub struct Sampled {
    config: TrajectoryConfig,
    spline_count: usize,
    points: Vec<Point>,
}

impl Sampled {
    /// The concatenated raw samples.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Advance to the arc-length stage.
    pub fn measure(self) -> Measured {
        let samples = crate::arc_length::measure(&self.points);
        let length = crate::arc_length::total_length(&samples);
        log::debug!("path length {length:.3} over {} samples", samples.len());
        Measured {
            config: self.config,
            spline_count: self.spline_count,
            samples,
            length,
        }
    }
}

// ───────────────────────── Stage 2: Measured ─────────────────────────

/// Pipeline state after computing cumulative arc length.
///
/// Call [`limit`](Self::limit) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing; call .limit() to continue"]
pub struct Measured {
    config: TrajectoryConfig,
    spline_count: usize,
    samples: Vec<Waypoint>,
    length: f64,
}

impl Measured {
    /// Samples annotated with cumulative distance.
    #[must_use]
    pub fn samples(&self) -> &[Waypoint] {
        &self.samples
    }

    /// Total arc length.
    #[must_use]
    pub const fn length(&self) -> f64 {
        self.length
    }

    /// Advance to the forward velocity stage.
    pub fn limit(self) -> Limited {
        let forward = self.config.velocity_limiter.limit(&self.samples, &self.config);
        log::debug!(
            "{} forward pass: {} limits, peak {:.3}",
            self.config.velocity_limiter,
            forward.len(),
            forward.iter().copied().fold(0.0, f64::max),
        );
        Limited {
            config: self.config,
            spline_count: self.spline_count,
            samples: self.samples,
            length: self.length,
            forward,
        }
    }
}

// ───────────────────────── Stage 3: Limited ──────────────────────────

/// Pipeline state after the forward velocity pass.
///
/// Call [`decelerate`](Self::decelerate) to advance to the next stage.
#[must_use = "pipeline stages are consumed by advancing; call .decelerate() to continue"]
pub struct Limited {
    config: TrajectoryConfig,
    spline_count: usize,
    samples: Vec<Waypoint>,
    length: f64,
    forward: Vec<f64>,
}

impl Limited {
    /// Forward-pass speed limits, index-aligned with the samples.
    #[must_use]
    pub fn forward_velocities(&self) -> &[f64] {
        &self.forward
    }

    /// Advance to the deceleration stage.
    pub fn decelerate(self) -> Decelerated {
        let mut samples = self.samples;
        crate::velocity::decelerate(&mut samples, &self.forward, self.config.decel);
        log::debug!(
            "decelerated at {} over {} samples",
            self.config.decel,
            samples.len()
        );
        Decelerated {
            config: self.config,
            spline_count: self.spline_count,
            samples,
            length: self.length,
            forward: self.forward,
        }
    }
}

// ───────────────────────── Stage 4: Decelerated ──────────────────────

/// Pipeline state after the backward deceleration pass.
///
/// Call [`resample`](Self::resample) to advance to the final stage.
#[must_use = "pipeline stages are consumed by advancing; call .resample() to continue"]
pub struct Decelerated {
    config: TrajectoryConfig,
    spline_count: usize,
    samples: Vec<Waypoint>,
    length: f64,
    forward: Vec<f64>,
}

impl Decelerated {
    /// Samples carrying their final velocities.
    #[must_use]
    pub fn samples(&self) -> &[Waypoint] {
        &self.samples
    }

    /// Resolve the output spacing and advance to the [`Resampled`]
    /// stage.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidSpacing`] or
    /// [`PipelineError::InvalidConfig`] when the spacing cannot be
    /// resolved.
    pub fn resample(self) -> Result<Resampled, PipelineError> {
        let spacing = self.config.spacing.resolve(self.length)?;
        let waypoints = crate::resample::spaced_points(&self.samples, self.length, spacing)?;
        log::debug!("resampled into {spacing} waypoints");
        Ok(Resampled {
            config: self.config,
            spline_count: self.spline_count,
            samples: self.samples,
            forward: self.forward,
            spacing,
            trajectory: Trajectory {
                waypoints,
                length: self.length,
            },
        })
    }
}

// ───────────────────────── Stage 5: Resampled ────────────────────────

/// Pipeline state after resampling, the final stage.
///
/// Call [`into_result`](Self::into_result) to extract the
/// [`StagedResult`] containing all intermediates.
#[must_use = "call .into_result() to extract the StagedResult"]
pub struct Resampled {
    config: TrajectoryConfig,
    spline_count: usize,
    samples: Vec<Waypoint>,
    forward: Vec<f64>,
    spacing: usize,
    trajectory: Trajectory,
}

impl Resampled {
    /// The evenly spaced output trajectory.
    #[must_use]
    pub const fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    /// The resolved number of output waypoints.
    #[must_use]
    pub const fn spacing(&self) -> usize {
        self.spacing
    }

    /// Consume the pipeline and return the full [`StagedResult`].
    #[must_use]
    pub fn into_result(self) -> StagedResult {
        StagedResult {
            samples: self.samples,
            forward_velocities: self.forward,
            spacing: self.spacing,
            trajectory: self.trajectory,
        }
    }
}

// ──────────────────── PipelineStage trait + Stage enum ────────────────

/// Total number of stages in the pipeline.
pub const STAGE_COUNT: usize = 6;

/// The output produced by a single pipeline stage.
///
/// Each variant borrows the data that the corresponding stage computed.
#[must_use]
pub enum StageOutput<'a> {
    /// Source splines (not yet sampled).
    Source {
        /// The splines in traversal order.
        splines: &'a [Spline],
    },
    /// Concatenated raw samples.
    Sampled {
        /// The sampled points.
        points: &'a [Point],
    },
    /// Samples with cumulative distance.
    Measured {
        /// The measured samples.
        samples: &'a [Waypoint],
        /// Total arc length.
        length: f64,
    },
    /// Forward velocity limits.
    Limited {
        /// One limit per sample.
        forward_velocities: &'a [f64],
    },
    /// Samples with final velocities.
    Decelerated {
        /// The decelerated samples.
        samples: &'a [Waypoint],
    },
    /// The resampled trajectory.
    Resampled {
        /// The output trajectory.
        trajectory: &'a Trajectory,
    },
}

/// Trait implemented by every pipeline stage, enabling uniform iteration.
///
/// Each stage struct implements it, and [`Stage`] delegates to whichever
/// variant it holds.
///
/// # Loop pattern
///
/// ```rust
/// # use waypath_pipeline::{Path, Pipeline, PipelineError, TrajectoryConfig};
/// # use waypath_pipeline::pipeline::{Stage, PipelineStage, Advance};
/// # fn run(path: Path) -> Result<(), PipelineError> {
/// let mut stage: Stage = Pipeline::new(path, TrajectoryConfig::default()).into();
/// loop {
///     match stage.advance()? {
///         Advance::Next(next) => stage = next,
///         Advance::Complete(done) => { stage = done; break; }
///     }
/// }
/// let result = stage.complete()?;
/// # Ok(())
/// # }
/// ```
pub trait PipelineStage: Sized {
    /// Human-readable name of this stage (e.g. `"source"`, `"resample"`).
    const NAME: &str;

    /// Zero-based index of this stage (`0` for Pending through `5` for
    /// Resampled).
    const INDEX: usize;

    /// The output this stage produced.
    fn output(&self) -> StageOutput<'_>;

    /// Stage-specific metrics for diagnostics.
    ///
    /// Returns `None` for the initial [`Pending`] stage which has not
    /// yet performed any processing.
    fn metrics(&self) -> Option<StageMetrics>;

    /// Advance to the next stage.
    ///
    /// Returns `Ok(Some(stage))` on success, `Ok(None)` if already at
    /// the final stage, or `Err` if the stage transition fails.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] from sampling (invalid config, empty
    /// path) or resampling (unresolvable spacing).
    fn next(self) -> Result<Option<Stage>, PipelineError>;

    /// Run all remaining stages to completion and return the final
    /// [`StagedResult`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if any remaining fallible stage fails.
    fn complete(self) -> Result<StagedResult, PipelineError>;
}

impl PipelineStage for Pending {
    const NAME: &str = "source";
    const INDEX: usize = 0;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Source {
            splines: self.path.splines(),
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        None
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        Ok(Some(Stage::Sampled(self.sample()?)))
    }

    fn complete(self) -> Result<StagedResult, PipelineError> {
        self.sample()?.complete()
    }
}

impl PipelineStage for Sampled {
    const NAME: &str = "sample";
    const INDEX: usize = 1;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Sampled {
            points: &self.points,
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(StageMetrics::Sample {
            spline_count: self.spline_count,
            tolerance: self.config.tolerance,
            point_count: self.points.len(),
        })
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        Ok(Some(Stage::Measured(self.measure())))
    }

    fn complete(self) -> Result<StagedResult, PipelineError> {
        self.measure().complete()
    }
}

impl PipelineStage for Measured {
    const NAME: &str = "arc_length";
    const INDEX: usize = 2;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Measured {
            samples: &self.samples,
            length: self.length,
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        Some(StageMetrics::ArcLength {
            sample_count: self.samples.len(),
            length: self.length,
        })
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        Ok(Some(Stage::Limited(self.limit())))
    }

    fn complete(self) -> Result<StagedResult, PipelineError> {
        self.limit().complete()
    }
}

impl PipelineStage for Limited {
    const NAME: &str = "velocity";
    const INDEX: usize = 3;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Limited {
            forward_velocities: &self.forward,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn metrics(&self) -> Option<StageMetrics> {
        let min_limit = self.forward.iter().copied().reduce(f64::min).unwrap_or(0.0);
        let max_limit = self.forward.iter().copied().reduce(f64::max).unwrap_or(0.0);
        let mean_limit = if self.forward.is_empty() {
            0.0
        } else {
            self.forward.iter().sum::<f64>() / self.forward.len() as f64
        };
        Some(StageMetrics::Velocity {
            limiter: self.config.velocity_limiter.to_string(),
            max_speed: self.config.max_speed,
            min_limit,
            max_limit,
            mean_limit,
        })
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        Ok(Some(Stage::Decelerated(self.decelerate())))
    }

    fn complete(self) -> Result<StagedResult, PipelineError> {
        self.decelerate().complete()
    }
}

impl PipelineStage for Decelerated {
    const NAME: &str = "decelerate";
    const INDEX: usize = 4;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Decelerated {
            samples: &self.samples,
        }
    }

    fn metrics(&self) -> Option<StageMetrics> {
        let reduced_count = self
            .samples
            .iter()
            .zip(&self.forward)
            .filter(|(w, limit)| w.velocity < **limit)
            .count();
        Some(StageMetrics::Decelerate {
            decel: self.config.decel,
            reduced_count,
            sample_count: self.samples.len(),
        })
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        Ok(Some(Stage::Resampled(self.resample()?)))
    }

    fn complete(self) -> Result<StagedResult, PipelineError> {
        self.resample()?.complete()
    }
}

impl PipelineStage for Resampled {
    const NAME: &str = "resample";
    const INDEX: usize = 5;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Resampled {
            trajectory: &self.trajectory,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn metrics(&self) -> Option<StageMetrics> {
        let intervals = self.spacing.saturating_sub(1).max(1) as f64;
        let step = self.trajectory.length / intervals;
        Some(StageMetrics::Resample {
            input_count: self.samples.len(),
            waypoint_count: self.trajectory.len(),
            step,
        })
    }

    fn next(self) -> Result<Option<Stage>, PipelineError> {
        Ok(None)
    }

    fn complete(self) -> Result<StagedResult, PipelineError> {
        Ok(self.into_result())
    }
}

/// Enum wrapping all pipeline stages for uniform, loopable access.
///
/// Use [`From`] conversions to enter the dynamic API from any typed
/// stage, then call [`advance`](Self::advance) in a loop.
#[must_use]
pub enum Stage {
    /// See [`Pending`].
    Pending(Pending),
    /// See [`Sampled`].
    Sampled(Sampled),
    /// See [`Measured`].
    Measured(Measured),
    /// See [`Limited`].
    Limited(Limited),
    /// See [`Decelerated`].
    Decelerated(Decelerated),
    /// See [`Resampled`].
    Resampled(Resampled),
}

/// Compile-time guard: adding a [`Stage`] variant makes this match
/// non-exhaustive, a reminder to bump [`STAGE_COUNT`].
#[allow(dead_code, clippy::match_same_arms)]
const fn _stage_count_guard(s: &Stage) {
    match s {
        Stage::Pending(_)
        | Stage::Sampled(_)
        | Stage::Measured(_)
        | Stage::Limited(_)
        | Stage::Decelerated(_)
        | Stage::Resampled(_) => {}
    }
}

/// Result of [`Stage::advance`]: either the next stage or the
/// completed final stage returned unchanged.
#[must_use]
pub enum Advance {
    /// The pipeline advanced to this next stage.
    Next(Stage),
    /// The pipeline was already at the final stage; returned unchanged.
    Complete(Stage),
}

/// Delegate a method call to whichever `Stage` variant is active.
macro_rules! delegate {
    ($self:ident, $method:ident $(, $arg:expr)*) => {
        match $self {
            Self::Pending(s) => s.$method($($arg),*),
            Self::Sampled(s) => s.$method($($arg),*),
            Self::Measured(s) => s.$method($($arg),*),
            Self::Limited(s) => s.$method($($arg),*),
            Self::Decelerated(s) => s.$method($($arg),*),
            Self::Resampled(s) => s.$method($($arg),*),
        }
    };
}

impl Stage {
    /// Human-readable name of the current stage.
    #[must_use]
    pub fn name(&self) -> &'static str {
        delegate!(self, name)
    }

    /// Zero-based index of the current stage.
    #[must_use]
    pub fn index(&self) -> usize {
        delegate!(self, index)
    }

    /// The output this stage produced.
    pub fn output(&self) -> StageOutput<'_> {
        delegate!(self, output)
    }

    /// Stage-specific metrics for diagnostics. `None` for `Pending`.
    #[must_use]
    pub fn metrics(&self) -> Option<StageMetrics> {
        delegate!(self, metrics)
    }

    /// Whether the pipeline is at the final stage.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Resampled(_))
    }

    /// Advance to the next stage.
    ///
    /// Returns `Ok(Some(next_stage))` on success, `Ok(None)` if
    /// already complete (the `Resampled` value is consumed), or `Err`
    /// if the transition fails.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if a fallible stage transition fails.
    pub fn next(self) -> Result<Option<Self>, PipelineError> {
        delegate!(self, next)
    }

    /// Advance to the next stage, returning `self` unchanged if
    /// already complete.
    ///
    /// Unlike [`next`](Self::next), the final stage comes back inside
    /// [`Advance::Complete`] so [`complete`](Self::complete) can still
    /// be called on it.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if a fallible stage transition fails.
    pub fn advance(self) -> Result<Advance, PipelineError> {
        if self.is_complete() {
            return Ok(Advance::Complete(self));
        }
        // Non-complete stages always return Ok(Some(_)) from next().
        #[allow(clippy::unreachable)]
        let next = self
            .next()?
            .unwrap_or_else(|| unreachable!("non-complete stage returned None from next()"));
        Ok(Advance::Next(next))
    }

    /// Run all remaining stages to completion.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if any remaining fallible stage fails.
    pub fn complete(self) -> Result<StagedResult, PipelineError> {
        delegate!(self, complete)
    }
}

// Associated constants aren't reachable through `self`, so the macro
// goes through this helper to read NAME and INDEX.
trait StageMetadata {
    fn name(&self) -> &'static str;
    fn index(&self) -> usize;
}

impl<T: PipelineStage> StageMetadata for T {
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn index(&self) -> usize {
        T::INDEX
    }
}

impl From<Pending> for Stage {
    fn from(s: Pending) -> Self {
        Self::Pending(s)
    }
}

impl From<Sampled> for Stage {
    fn from(s: Sampled) -> Self {
        Self::Sampled(s)
    }
}

impl From<Measured> for Stage {
    fn from(s: Measured) -> Self {
        Self::Measured(s)
    }
}

impl From<Limited> for Stage {
    fn from(s: Limited) -> Self {
        Self::Limited(s)
    }
}

impl From<Decelerated> for Stage {
    fn from(s: Decelerated) -> Self {
        Self::Decelerated(s)
    }
}

impl From<Resampled> for Stage {
    fn from(s: Resampled) -> Self {
        Self::Resampled(s)
    }
}

// ───────────────────── Pipeline entry point ──────────────────────────

/// Incremental trajectory generation pipeline.
///
/// Created via [`Pipeline::new`], which stores the path and config
/// without doing any processing. The caller then chains stage methods
/// (see the [module docs](self)) or converts into a [`Stage`] and loops.
pub struct Pipeline;

impl Pipeline {
    /// Create a new pipeline from a path and config.
    ///
    /// No processing is performed. Validation happens when
    /// [`.sample()`](Pending::sample) runs.
    #[allow(clippy::new_ret_no_self)]
    pub const fn new(path: Path, config: TrajectoryConfig) -> Pending {
        Pending { config, path }
    }
}
