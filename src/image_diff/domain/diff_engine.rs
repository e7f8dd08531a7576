use std::borrow::Cow;

use crate::domain::error::DomainError;
use crate::domain::image::{luma, ColorMode, Image};
use crate::domain::region::BoundingBox;

const MAX_SAMPLE: f64 = 255.0;

/// Outcome of comparing two images.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffResult {
    /// Grayscale per-pixel difference, same size as the inputs.
    pub difference: Image,
    /// `None` when the inputs are pixel-identical.
    pub bounding_box: Option<BoundingBox>,
    /// Mean normalized difference over all channels and pixels, in `[0, 1]`.
    pub ratio: f64,
}

impl DiffResult {
    #[cfg(test)]
    pub fn is_identical(&self) -> bool {
        self.bounding_box.is_none()
    }
}

/// Compares `image_b` against `image_a`.
///
/// When the color modes differ, `image_b` is converted to `image_a`'s mode
/// first, even if the conversion is lossy. Width and height must match.
pub fn compare(image_a: &Image, image_b: &Image) -> Result<DiffResult, DomainError> {
    if image_a.dimensions() != image_b.dimensions() {
        return Err(DomainError::ShapeMismatch {
            left_width: image_a.width(),
            left_height: image_a.height(),
            right_width: image_b.width(),
            right_height: image_b.height(),
        });
    }

    let mode = image_a.mode();
    let image_b: Cow<'_, Image> = if image_b.mode() == mode {
        Cow::Borrowed(image_b)
    } else {
        Cow::Owned(image_b.convert_to(mode))
    };

    let channels = mode.channels();
    let (width, height) = image_a.dimensions();
    let pixel_count = width as usize * height as usize;

    let mut channel_sums = vec![0u64; channels];
    let mut gray = Vec::with_capacity(pixel_count);
    let mut extent: Option<(u32, u32, u32, u32)> = None;
    let mut delta = [0u8; 4];

    for (index, (pa, pb)) in image_a
        .data()
        .chunks_exact(channels)
        .zip(image_b.data().chunks_exact(channels))
        .enumerate()
    {
        let mut changed = false;
        for c in 0..channels {
            let d = pa[c].abs_diff(pb[c]);
            delta[c] = d;
            channel_sums[c] += d as u64;
            changed |= d != 0;
        }

        if changed {
            let x = (index % width as usize) as u32;
            let y = (index / width as usize) as u32;
            extent = Some(match extent {
                None => (x, y, x, y),
                Some((min_x, min_y, max_x, max_y)) => {
                    (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
                }
            });
        }

        gray.push(reduce_channels(mode, &delta[..channels]));
    }

    let per_channel_mean: f64 = channel_sums
        .iter()
        .map(|&sum| sum as f64 / pixel_count as f64)
        .sum();
    let ratio = per_channel_mean / (channels as f64 * MAX_SAMPLE);

    let bounding_box = extent.map(|(min_x, min_y, max_x, max_y)| BoundingBox {
        left: min_x,
        top: min_y,
        right: max_x + 1,
        bottom: max_y + 1,
    });

    Ok(DiffResult {
        difference: Image::new(gray, width, height, ColorMode::Gray)?,
        bounding_box,
        ratio,
    })
}

/// Like [`compare`], but refuses to reconcile differing color modes.
pub fn compare_strict(image_a: &Image, image_b: &Image) -> Result<DiffResult, DomainError> {
    if image_a.mode() != image_b.mode() {
        return Err(DomainError::ModeMismatch {
            left: image_a.mode(),
            right: image_b.mode(),
        });
    }
    compare(image_a, image_b)
}

// alpha だけの変化も拾えるように RGBA は max を取る
fn reduce_channels(mode: ColorMode, delta: &[u8]) -> u8 {
    match mode {
        ColorMode::Gray => delta[0],
        ColorMode::Rgb => luma(delta[0], delta[1], delta[2]),
        ColorMode::Rgba => luma(delta[0], delta[1], delta[2]).max(delta[3]),
    }
}
