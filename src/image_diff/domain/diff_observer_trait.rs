use std::path::Path;

use crate::domain::image::{ColorMode, Image};
use crate::infrastructure::error::InfrastructureError;

/// Receives progress events from a comparison run. Purely observational:
/// nothing an observer does changes the outcome.
#[cfg_attr(test, mockall::automock)]
pub trait DiffObserver {
    fn image_loaded(&self, path: &Path, image: &Image);

    fn mode_mismatch(&self, from: ColorMode, to: ColorMode, lossy: bool);

    fn identical(&self);

    fn difference_found(&self, ratio: f64, region_count: usize);

    fn output_written(&self, path: &Path);

    fn write_failed(&self, path: &Path, error: &InfrastructureError);
}
