use std::path::Path;

use tracing::{error, info, warn};

use super::error::InfrastructureError;
use crate::domain::diff_observer_trait::DiffObserver;
use crate::domain::image::{ColorMode, Image};

/// Forwards comparison events to `tracing`.
pub struct TracingDiffObserver;

impl TracingDiffObserver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TracingDiffObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl DiffObserver for TracingDiffObserver {
    fn image_loaded(&self, path: &Path, image: &Image) {
        info!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            mode = ?image.mode(),
            "Loaded image"
        );
    }

    fn mode_mismatch(&self, from: ColorMode, to: ColorMode, lossy: bool) {
        warn!(?from, ?to, lossy, "Image modes differ, converting second image to match the first");
    }

    fn identical(&self) {
        info!("Images are identical");
    }

    fn difference_found(&self, ratio: f64, region_count: usize) {
        info!(ratio, region_count, "Found difference");
    }

    fn output_written(&self, path: &Path) {
        info!(path = %path.display(), "Wrote output");
    }

    fn write_failed(&self, path: &Path, err: &InfrastructureError) {
        // エラーチェーンを全部残す
        let chain: Vec<String> = std::iter::successors(Some(err as &(dyn std::error::Error + 'static)), |e| e.source())
            .map(|e| e.to_string())
            .collect();
        error!(path = %path.display(), error = %chain.join(": "), "Failed to write output");
    }
}
