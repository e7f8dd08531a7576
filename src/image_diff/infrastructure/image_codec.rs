use std::path::Path;

use image::{ColorType, DynamicImage};

use super::error::InfrastructureError;
use crate::domain::error::DomainError;
use crate::domain::image::{ColorMode, Image};
use crate::domain::image_codec_trait::ImageCodec;

/// Reads and writes images on the local filesystem through the `image` crate.
/// The file format follows the path extension.
pub struct FileImageCodec;

impl FileImageCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FileImageCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageCodec for FileImageCodec {
    fn load(&self, path: &Path) -> Result<Image, InfrastructureError> {
        let decoded = image::open(path).map_err(|source| InfrastructureError::DecodeError {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(from_dynamic(decoded)?)
    }

    fn save(&self, image: &Image, path: &Path) -> Result<(), InfrastructureError> {
        let color_type = match image.mode() {
            ColorMode::Gray => ColorType::L8,
            ColorMode::Rgb => ColorType::Rgb8,
            ColorMode::Rgba => ColorType::Rgba8,
        };
        image::save_buffer(path, image.data(), image.width(), image.height(), color_type).map_err(|source| {
            InfrastructureError::WriteError {
                path: path.to_path_buf(),
                source,
            }
        })
    }
}

/// Maps whatever the decoder produced onto one of the three supported modes.
/// Gray+alpha widens to RGBA; deeper sample types are narrowed to 8 bits.
fn from_dynamic(decoded: DynamicImage) -> Result<Image, DomainError> {
    let (width, height) = (decoded.width(), decoded.height());
    let (data, mode) = match decoded {
        DynamicImage::ImageLuma8(buf) => (buf.into_raw(), ColorMode::Gray),
        DynamicImage::ImageRgb8(buf) => (buf.into_raw(), ColorMode::Rgb),
        DynamicImage::ImageRgba8(buf) => (buf.into_raw(), ColorMode::Rgba),
        img @ DynamicImage::ImageLuma16(_) => (img.to_luma8().into_raw(), ColorMode::Gray),
        img @ (DynamicImage::ImageRgb16(_) | DynamicImage::ImageRgb32F(_)) => {
            (img.to_rgb8().into_raw(), ColorMode::Rgb)
        }
        img @ (DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageLumaA16(_)
        | DynamicImage::ImageRgba16(_)
        | DynamicImage::ImageRgba32F(_)) => (img.to_rgba8().into_raw(), ColorMode::Rgba),
        other => {
            return Err(DomainError::UnsupportedMode(format!("{:?}", other.color())));
        }
    };
    Image::new(data, width, height, mode)
}
