//! waypath-bench: CLI tool for trajectory parameter experimentation and diagnostics.
//!
//! Runs the trajectory pipeline on a spline path with configurable
//! parameters, printing detailed per-stage diagnostics. Useful for:
//!
//! - Comparing forward velocity limiters (`segment-length` vs `curvature`)
//! - Tuning tolerance, speed ceiling, multiplier, and deceleration
//! - Measuring per-stage durations to identify bottlenecks
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin waypath-bench -- [OPTIONS]
//! ```
//!
//! Without `--path-file` or `--path-json` a built-in demo path with a
//! sharp 90° turn is used. Set `RUST_LOG=debug` to see per-stage logs.
//! `--stages` steps through the pipeline one stage at a time and prints
//! what each stage produced instead of timing a run.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use serde::Serialize;
use waypath_pipeline::diagnostics::{Clock, PipelineDiagnostics};
use waypath_pipeline::pipeline::{Advance, STAGE_COUNT, Stage, StageOutput};
use waypath_pipeline::{
    OutputSpacing, Path, Pipeline, PipelineError, Point, Spline, Trajectory, TrajectoryConfig,
    VelocityLimiterKind,
};

/// Trajectory parameter experimentation and diagnostics for waypath.
///
/// Builds a trajectory along a chain of cubic Bézier splines with
/// configurable parameters and prints per-stage timing and count
/// diagnostics.
#[derive(Parser)]
#[command(name = "waypath-bench", version)]
struct Cli {
    /// JSON file holding an array of splines (`[{"p1":{"x":..,"y":..},"p2":..,"p3":..,"p4":..}, ..]`).
    #[arg(long, conflicts_with = "path_json")]
    path_file: Option<PathBuf>,

    /// Spline array as an inline JSON string.
    #[arg(long)]
    path_json: Option<String>,

    /// Samples per spline segment.
    #[arg(long, default_value_t = TrajectoryConfig::DEFAULT_TOLERANCE, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(2..))]
    tolerance: usize,

    /// Number of evenly spaced output waypoints.
    #[arg(long, conflicts_with = "distance_per_point", value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(2..))]
    spacing: Option<usize>,

    /// Derive the waypoint count from path length at this distance per point.
    #[arg(long)]
    distance_per_point: Option<f64>,

    /// Velocity ceiling.
    #[arg(long, default_value_t = TrajectoryConfig::DEFAULT_MAX_SPEED)]
    max_speed: f64,

    /// Scale applied by the forward velocity pass.
    #[arg(long, default_value_t = TrajectoryConfig::DEFAULT_CURVATURE_MULTIPLIER)]
    curvature_multiplier: f64,

    /// Treat `--curvature-multiplier` as a per-100-samples scale, so
    /// segment-length limits stay put when `--tolerance` changes.
    #[arg(long)]
    scale_multiplier: bool,

    /// Deceleration bound for the backward pass.
    #[arg(long, default_value_t = TrajectoryConfig::DEFAULT_DECEL)]
    decel: f64,

    /// Forward velocity limiter.
    #[arg(long, value_enum, default_value_t = Limiter::SegmentLength)]
    limiter: Limiter,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics and trajectory as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,

    /// Step through the stages once, printing each stage's output.
    #[arg(long, conflicts_with = "json")]
    stages: bool,

    /// Full trajectory config as a JSON string.
    ///
    /// When provided, all other trajectory parameter flags are ignored.
    /// The JSON must be a valid `TrajectoryConfig` serialization; missing
    /// fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,
}

/// Forward velocity limiter selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Limiter {
    /// Distance to the next sample times the multiplier.
    SegmentLength,
    /// Multiplier divided by the local curvature.
    Curvature,
}

/// Build a [`TrajectoryConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored. Otherwise, a config is
/// assembled from the individual flags.
fn config_from_cli(cli: &Cli) -> Result<TrajectoryConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    let spacing = match (cli.spacing, cli.distance_per_point) {
        (_, Some(d)) => OutputSpacing::DistancePerPoint(d),
        (Some(n), None) => OutputSpacing::PointCount(n),
        (None, None) => OutputSpacing::default(),
    };

    Ok(TrajectoryConfig {
        tolerance: cli.tolerance,
        spacing,
        max_speed: cli.max_speed,
        curvature_multiplier: if cli.scale_multiplier {
            TrajectoryConfig::scaled_multiplier(cli.curvature_multiplier, cli.tolerance)
        } else {
            cli.curvature_multiplier
        },
        decel: cli.decel,
        velocity_limiter: match cli.limiter {
            Limiter::SegmentLength => VelocityLimiterKind::SegmentLength,
            Limiter::Curvature => VelocityLimiterKind::Curvature,
        },
    })
}

/// Load the path from `--path-file` / `--path-json`, or fall back to the
/// demo path.
fn path_from_cli(cli: &Cli) -> Result<Path, String> {
    if let Some(ref file) = cli.path_file {
        let json = std::fs::read_to_string(file)
            .map_err(|e| format!("Error reading {}: {e}", file.display()))?;
        return serde_json::from_str(&json)
            .map_err(|e| format!("Error parsing path in {}: {e}", file.display()));
    }
    if let Some(ref json) = cli.path_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --path-json: {e}"));
    }
    demo_path().map_err(|e| format!("Error building demo path: {e}"))
}

/// A 100-unit straight, a tight left turn, and another 100-unit straight.
fn demo_path() -> Result<Path, waypath_pipeline::PipelineError> {
    Path::from_splines([
        Spline::new(
            Point::new(0.0, 0.0),
            Point::new(33.0, 0.0),
            Point::new(66.0, 0.0),
            Point::new(100.0, 0.0),
        ),
        Spline::new(
            Point::new(100.0, 0.0),
            Point::new(105.0, 0.0),
            Point::new(110.0, 5.0),
            Point::new(110.0, 10.0),
        ),
        Spline::new(
            Point::new(110.0, 10.0),
            Point::new(110.0, 43.0),
            Point::new(110.0, 76.0),
            Point::new(110.0, 110.0),
        ),
    ])
}

fn main() -> ExitCode {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let path = match path_from_cli(&cli) {
        Ok(p) => p,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    log::info!("loaded path with {} splines", path.len());
    eprintln!("Path: {} splines", path.len());
    eprintln!("Config: {config:#?}");
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    if cli.stages {
        return match print_stages(path, config) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Pipeline error: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        match waypath_pipeline::diagnostics::generate_with_diagnostics(&path, &config, &StdClock) {
            Ok((staged, diagnostics)) => {
                if cli.json {
                    let output = BenchOutput {
                        diagnostics: &diagnostics,
                        trajectory: &staged.trajectory,
                    };
                    match serde_json::to_string_pretty(&output) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            eprintln!("Error serializing diagnostics: {e}");
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    println!("{}", diagnostics.report());
                }

                all_diagnostics.push(diagnostics);
            }
            Err(e) => {
                eprintln!("Pipeline error: {e}");
                return ExitCode::FAILURE;
            }
        }

        if cli.runs > 1 {
            eprintln!();
        }
    }

    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

/// Walk the pipeline with [`Stage::advance`], printing one line per stage.
fn print_stages(path: Path, config: TrajectoryConfig) -> Result<(), PipelineError> {
    let mut stage: Stage = Pipeline::new(path, config).into();
    loop {
        println!(
            "[{}/{}] {:<12} {}",
            stage.index() + 1,
            STAGE_COUNT,
            stage.name(),
            describe_output(&stage.output()),
        );
        match stage.advance()? {
            Advance::Next(next) => stage = next,
            Advance::Complete(_) => return Ok(()),
        }
    }
}

/// One-line summary of a stage's output.
fn describe_output(output: &StageOutput<'_>) -> String {
    match output {
        StageOutput::Source { splines } => format!("{} splines", splines.len()),
        StageOutput::Sampled { points } => format!("{} points", points.len()),
        StageOutput::Measured { samples, length } => {
            format!("{} samples, length {length:.3}", samples.len())
        }
        StageOutput::Limited { forward_velocities } => format!(
            "{} limits, peak {:.3}",
            forward_velocities.len(),
            peak(forward_velocities.iter().copied()),
        ),
        StageOutput::Decelerated { samples } => format!(
            "{} samples, peak velocity {:.3}",
            samples.len(),
            peak(samples.iter().map(|w| w.velocity)),
        ),
        StageOutput::Resampled { trajectory } => format!(
            "{} waypoints, peak velocity {:.3}",
            trajectory.len(),
            trajectory.max_velocity(),
        ),
    }
}

fn peak(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(0.0, f64::max)
}

/// One run's `--json` output.
#[derive(Serialize)]
struct BenchOutput<'a> {
    diagnostics: &'a PipelineDiagnostics,
    trajectory: &'a Trajectory,
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[PipelineDiagnostics]) {
    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    if all_diagnostics.is_empty() {
        println!("Warning: no diagnostics to summarize");
        return;
    }

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    // Every run reports the same stages in the same order.
    let stage_names = all_diagnostics[0].stages().map(|(name, _)| name);
    for (i, name) in stage_names.iter().enumerate() {
        let total: f64 = all_diagnostics
            .iter()
            .map(|d| d.stages()[i].1.duration.as_secs_f64() * 1000.0)
            .sum();
        let stage_mean = total / all_diagnostics.len() as f64;
        println!("{name:<24} {stage_mean:>10.3}ms");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("waypath-bench").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_match_pipeline_defaults() {
        let config = config_from_cli(&parse(&[])).unwrap();
        assert_eq!(config, TrajectoryConfig::default());
    }

    #[test]
    fn flags_build_config() {
        let cli = parse(&[
            "--tolerance",
            "12",
            "--spacing",
            "30",
            "--max-speed",
            "8.5",
            "--decel",
            "3",
            "--limiter",
            "curvature",
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.tolerance, 12);
        assert_eq!(config.spacing, OutputSpacing::PointCount(30));
        assert!((config.max_speed - 8.5).abs() < f64::EPSILON);
        assert!((config.decel - 3.0).abs() < f64::EPSILON);
        assert_eq!(config.velocity_limiter, VelocityLimiterKind::Curvature);
    }

    #[test]
    fn distance_per_point_selects_density() {
        let config = config_from_cli(&parse(&["--distance-per-point", "2.5"])).unwrap();
        assert_eq!(config.spacing, OutputSpacing::DistancePerPoint(2.5));
    }

    #[test]
    fn spacing_conflicts_with_density() {
        let result = Cli::try_parse_from([
            "waypath-bench",
            "--spacing",
            "10",
            "--distance-per-point",
            "2",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn tolerance_below_two_rejected_by_parser() {
        assert!(Cli::try_parse_from(["waypath-bench", "--tolerance", "1"]).is_err());
    }

    #[test]
    fn config_json_overrides_flags() {
        let cli = parse(&[
            "--tolerance",
            "12",
            "--config-json",
            r#"{"tolerance": 7, "velocity_limiter": "Curvature"}"#,
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.tolerance, 7);
        assert_eq!(config.velocity_limiter, VelocityLimiterKind::Curvature);
        assert_eq!(config.spacing, OutputSpacing::default());
    }

    #[test]
    fn invalid_config_json_reported() {
        let cli = parse(&["--config-json", "{not json"]);
        let err = config_from_cli(&cli).unwrap_err();
        assert!(err.contains("--config-json"), "got: {err}");
    }

    #[test]
    fn demo_path_is_used_by_default() {
        let path = path_from_cli(&parse(&[])).unwrap();
        assert_eq!(path.len(), 3);
        assert!(path.generate(&TrajectoryConfig::default()).is_ok());
    }

    #[test]
    fn inline_path_json_is_parsed() {
        let cli = parse(&[
            "--path-json",
            r#"[{"p1":{"x":0,"y":0},"p2":{"x":1,"y":0},"p3":{"x":2,"y":0},"p4":{"x":3,"y":0}}]"#,
        ]);
        assert_eq!(path_from_cli(&cli).unwrap().len(), 1);
    }

    #[test]
    fn discontinuous_path_json_reported() {
        let cli = parse(&[
            "--path-json",
            r#"[{"p1":{"x":0,"y":0},"p2":{"x":1,"y":0},"p3":{"x":2,"y":0},"p4":{"x":3,"y":0}},
                {"p1":{"x":9,"y":9},"p2":{"x":9,"y":9},"p3":{"x":9,"y":9},"p4":{"x":9,"y":9}}]"#,
        ]);
        let err = path_from_cli(&cli).unwrap_err();
        assert!(err.contains("spline 1"), "got: {err}");
    }

    #[test]
    fn scale_multiplier_follows_tolerance() {
        let cli = parse(&[
            "--tolerance",
            "200",
            "--curvature-multiplier",
            "40",
            "--scale-multiplier",
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert!((config.curvature_multiplier - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stages_conflicts_with_json() {
        assert!(Cli::try_parse_from(["waypath-bench", "--stages", "--json"]).is_err());
    }

    #[test]
    fn stage_walk_describes_every_stage() {
        let mut stage: Stage = Pipeline::new(demo_path().unwrap(), TrajectoryConfig::default()).into();
        let mut lines = vec![describe_output(&stage.output())];
        while let Advance::Next(next) = stage.advance().unwrap() {
            lines.push(describe_output(&next.output()));
            stage = next;
        }
        assert_eq!(lines.len(), STAGE_COUNT);
        assert_eq!(lines[0], "3 splines");
        assert_eq!(lines[1], "148 points");
        assert!(lines[5].starts_with("100 waypoints"), "got {}", lines[5]);
        assert!(print_stages(demo_path().unwrap(), TrajectoryConfig::default()).is_ok());
    }

    #[test]
    fn missing_path_file_reported() {
        let cli = parse(&["--path-file", "/nonexistent/waypath-path.json"]);
        assert!(path_from_cli(&cli).unwrap_err().contains("Error reading"));
    }
}
