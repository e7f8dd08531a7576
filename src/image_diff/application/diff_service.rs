use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use super::config::{DiffConfig, OutputPaths};
use super::error::ApplicationError;
use crate::domain::annotator_trait::Annotator;
use crate::domain::diff_engine::{compare, compare_strict};
use crate::domain::diff_observer_trait::DiffObserver;
use crate::domain::image::{ColorMode, Image};
use crate::domain::image_codec_trait::ImageCodec;
use crate::domain::region::{BoundingBox, Region};
use crate::infrastructure::error::InfrastructureError;

#[derive(Debug)]
pub enum ComparisonOutcome {
    Identical,
    Different(DifferenceReport),
}

#[derive(Debug)]
pub struct DifferenceReport {
    pub ratio: f64,
    pub bounding_box: BoundingBox,
    pub regions: Vec<Region>,
    pub written: Vec<PathBuf>,
    pub failed_writes: Vec<WriteFailure>,
}

impl DifferenceReport {
    pub fn exceeds(&self, max_ratio: Option<f64>) -> bool {
        max_ratio.is_some_and(|max| self.ratio > max)
    }
}

#[derive(Debug)]
pub struct WriteFailure {
    pub path: PathBuf,
    pub error: InfrastructureError,
}

/// Runs one comparison end to end: load, diff, extract regions, annotate, write.
pub struct DiffService {
    codec: Arc<dyn ImageCodec + Send + Sync>,
    annotator: Arc<dyn Annotator + Send + Sync>,
    observer: Arc<dyn DiffObserver + Send + Sync>,
    config: DiffConfig,
}

impl DiffService {
    pub fn new(
        codec: Arc<dyn ImageCodec + Send + Sync>,
        annotator: Arc<dyn Annotator + Send + Sync>,
        observer: Arc<dyn DiffObserver + Send + Sync>,
        config: DiffConfig,
    ) -> Self {
        Self {
            codec,
            annotator,
            observer,
            config,
        }
    }

    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Output paths that would overwrite an input, decode, shape and annotation
    /// errors abort the run. Failed writes do not: every output is attempted
    /// and failures are listed in the report.
    pub fn run(
        &self,
        path_one: &Path,
        path_two: &Path,
        outputs: &OutputPaths,
    ) -> Result<ComparisonOutcome, ApplicationError> {
        outputs.check_inputs(path_one, path_two)?;

        let image_one = self.codec.load(path_one)?;
        self.observer.image_loaded(path_one, &image_one);
        let image_two = self.codec.load(path_two)?;
        self.observer.image_loaded(path_two, &image_two);

        let diff = if self.config.strict_modes {
            compare_strict(&image_one, &image_two)?
        } else {
            if image_one.mode() != image_two.mode() {
                self.observer.mode_mismatch(
                    image_two.mode(),
                    image_one.mode(),
                    image_two.mode().is_lossy_to(image_one.mode()),
                );
            }
            compare(&image_one, &image_two)?
        };

        let Some(bounding_box) = diff.bounding_box else {
            self.observer.identical();
            return Ok(ComparisonOutcome::Identical);
        };

        let extractor = self.config.region_extractor();
        let regions = extractor.extract(&diff.difference)?;
        debug!(
            ?bounding_box,
            threshold = extractor.threshold(),
            regions = regions.len(),
            "Extracted regions"
        );
        self.observer.difference_found(diff.ratio, regions.len());

        let style = self.config.box_style();
        let annotated_one = self.annotator.annotate(&for_annotation(&image_one), &regions, &style)?;
        let annotated_two = self.annotator.annotate(&for_annotation(&image_two), &regions, &style)?;

        let mut written = Vec::new();
        let mut failed_writes = Vec::new();
        for (image, path) in [
            (&diff.difference, &outputs.diff),
            (&annotated_one, &outputs.annotated_one),
            (&annotated_two, &outputs.annotated_two),
        ] {
            match self.codec.save(image, path) {
                Ok(()) => {
                    self.observer.output_written(path);
                    written.push(path.clone());
                }
                Err(error) => {
                    self.observer.write_failed(path, &error);
                    failed_writes.push(WriteFailure {
                        path: path.clone(),
                        error,
                    });
                }
            }
        }

        Ok(ComparisonOutcome::Different(DifferenceReport {
            ratio: diff.ratio,
            bounding_box,
            regions,
            written,
            failed_writes,
        }))
    }
}

// グレースケールのままだと枠の色が出ないので RGB にする
fn for_annotation(image: &Image) -> Cow<'_, Image> {
    match image.mode() {
        ColorMode::Gray => Cow::Owned(image.convert_to(ColorMode::Rgb)),
        ColorMode::Rgb | ColorMode::Rgba => Cow::Borrowed(image),
    }
}
