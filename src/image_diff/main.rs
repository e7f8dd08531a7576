mod application;
mod domain;
mod infrastructure;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use tracing::error;

use application::config::{DiffConfig, OutputPaths};
use application::diff_service::{ComparisonOutcome, DiffService};
use infrastructure::annotator::ImageprocAnnotator;
use infrastructure::image_codec::FileImageCodec;
use infrastructure::tracing_observer::TracingDiffObserver;

/// Exit status when a difference was found but an output could not be written.
const EXIT_WRITE_FAILED: u8 = 2;

#[derive(Parser, Debug)]
#[command(author, version, about = "Compare two images and box every region that changed")]
struct Args {
    /// Baseline image
    image_one: PathBuf,

    /// Image to compare against the baseline
    image_two: PathBuf,

    /// JSON config file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where to write the grayscale difference image
    #[arg(long)]
    diff_output: Option<PathBuf>,

    /// Where to write the annotated copy of the first image
    #[arg(long)]
    output_one: Option<PathBuf>,

    /// Where to write the annotated copy of the second image
    #[arg(long)]
    output_two: Option<PathBuf>,

    /// Difference intensity (0-255) a pixel must exceed to be boxed
    #[arg(short, long)]
    threshold: Option<u8>,

    /// Outline thickness in pixels
    #[arg(long)]
    thickness: Option<u32>,

    /// Outline color, #RRGGBB or #RRGGBBAA
    #[arg(long)]
    color: Option<String>,

    /// Fail when the two images have different color modes
    #[arg(long)]
    strict_modes: bool,

    /// Exit non-zero when the dissimilarity ratio is above this value
    #[arg(long)]
    max_ratio: Option<f64>,

    /// Print a JSON summary to stdout
    #[arg(long)]
    json: bool,
}

impl Args {
    fn build_config(&self) -> Result<DiffConfig> {
        let mut config = match &self.config {
            Some(path) => DiffConfig::from_json_file(path)?,
            None => DiffConfig::default(),
        };
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(thickness) = self.thickness {
            config.line_thickness = thickness;
        }
        if let Some(color) = &self.color {
            config.highlight_color = color.clone();
        }
        if self.strict_modes {
            config.strict_modes = true;
        }
        if self.max_ratio.is_some() {
            config.max_ratio = self.max_ratio;
        }
        config.validate()?;
        Ok(config)
    }

    fn output_paths(&self) -> Result<OutputPaths> {
        let mut outputs = OutputPaths::derive(&self.image_one, &self.image_two)?;
        if let Some(path) = &self.diff_output {
            outputs.diff = path.clone();
        }
        if let Some(path) = &self.output_one {
            outputs.annotated_one = path.clone();
        }
        if let Some(path) = &self.output_two {
            outputs.annotated_two = path.clone();
        }
        Ok(outputs)
    }
}

fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    match run(&args) {
        Ok(code) => code,
        Err(err) => {
            error!("{err:?}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<ExitCode> {
    let config = args.build_config().context("Invalid configuration")?;
    let outputs = args.output_paths()?;

    let service = DiffService::new(
        Arc::new(FileImageCodec::new()),
        Arc::new(ImageprocAnnotator::new()),
        Arc::new(TracingDiffObserver::new()),
        config,
    );

    let outcome = service
        .run(&args.image_one, &args.image_two, &outputs)
        .with_context(|| {
            format!(
                "Failed to compare {} with {}",
                args.image_one.display(),
                args.image_two.display()
            )
        })?;

    if args.json {
        println!("{}", summary(&outcome));
    }
    Ok(ExitCode::from(exit_status(&outcome, service.config().max_ratio)))
}

fn summary(outcome: &ComparisonOutcome) -> serde_json::Value {
    match outcome {
        ComparisonOutcome::Identical => json!({ "identical": true, "ratio": 0.0 }),
        ComparisonOutcome::Different(report) => json!({
            "identical": false,
            "ratio": report.ratio,
            "bounding_box": report.bounding_box,
            "regions": report.regions,
            "written": report.written,
            "failed_writes": report
                .failed_writes
                .iter()
                .map(|f| json!({ "path": f.path, "error": f.error.to_string() }))
                .collect::<Vec<_>>(),
        }),
    }
}

fn exit_status(outcome: &ComparisonOutcome, max_ratio: Option<f64>) -> u8 {
    match outcome {
        ComparisonOutcome::Identical => 0,
        ComparisonOutcome::Different(report) if !report.failed_writes.is_empty() => EXIT_WRITE_FAILED,
        ComparisonOutcome::Different(report) if report.exceeds(max_ratio) => 1,
        ComparisonOutcome::Different(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::region::{BoundingBox, Region};
    use std::path::Path;

    fn report(ratio: f64) -> ComparisonOutcome {
        ComparisonOutcome::Different(application::diff_service::DifferenceReport {
            ratio,
            bounding_box: BoundingBox { left: 1, top: 2, right: 3, bottom: 4 },
            regions: vec![Region::new(1, 2, 2, 2)],
            written: vec![PathBuf::from("diff.png")],
            failed_writes: Vec::new(),
        })
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::try_parse_from([
            "image_diff",
            "shots/a.png",
            "shots/b.png",
            "--threshold",
            "12",
            "--thickness",
            "3",
            "--color",
            "#00FF00",
            "--max-ratio",
            "0.05",
            "--output-two",
            "custom.png",
        ])
        .unwrap();

        let config = args.build_config().unwrap();
        assert_eq!(config.threshold, 12);
        assert_eq!(config.line_thickness, 3);
        assert_eq!(config.highlight_color, "#00FF00");
        assert_eq!(config.max_ratio, Some(0.05));
        assert!(!config.strict_modes);

        let outputs = args.output_paths().unwrap();
        assert_eq!(outputs.diff, Path::new("shots/diff.png"));
        assert_eq!(outputs.annotated_one, Path::new("shots/a-annotated.png"));
        assert_eq!(outputs.annotated_two, Path::new("custom.png"));
    }

    #[test]
    fn test_invalid_flag_value_is_rejected() {
        let args = Args::try_parse_from(["image_diff", "a.png", "b.png", "--thickness", "0"]).unwrap();
        assert!(args.build_config().is_err());
        assert!(Args::try_parse_from(["image_diff", "a.png", "b.png", "--threshold", "300"]).is_err());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_status(&ComparisonOutcome::Identical, Some(0.0)), 0);
        assert_eq!(exit_status(&report(0.01), None), 0);
        assert_eq!(exit_status(&report(0.01), Some(0.02)), 0);
        assert_eq!(exit_status(&report(0.03), Some(0.02)), 1);

        let ComparisonOutcome::Different(mut failed) = report(0.03) else {
            unreachable!()
        };
        failed.failed_writes.push(application::diff_service::WriteFailure {
            path: PathBuf::from("diff.png"),
            error: infrastructure::error::InfrastructureError::WriteError {
                path: PathBuf::from("diff.png"),
                source: image::ImageError::IoError(std::io::Error::other("disk full")),
            },
        });
        assert_eq!(exit_status(&ComparisonOutcome::Different(failed), Some(0.02)), EXIT_WRITE_FAILED);
    }

    #[test]
    fn test_summary_lists_regions() {
        let value = summary(&report(0.25));
        assert_eq!(value["identical"], false);
        assert_eq!(value["ratio"], 0.25);
        assert_eq!(value["regions"][0]["width"], 2);
        assert_eq!(value["bounding_box"]["right"], 3);
        assert_eq!(summary(&ComparisonOutcome::Identical)["identical"], true);
    }
}
