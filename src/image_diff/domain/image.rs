use crate::domain::error::DomainError;

/// Color layouts an [`Image`] can carry. Every sample is 8-bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorMode {
    Gray,
    Rgb,
    Rgba,
}

impl ColorMode {
    pub fn channels(self) -> usize {
        match self {
            ColorMode::Gray => 1,
            ColorMode::Rgb => 3,
            ColorMode::Rgba => 4,
        }
    }

    /// Whether converting from `self` to `target` throws information away.
    pub fn is_lossy_to(self, target: ColorMode) -> bool {
        match (self, target) {
            (ColorMode::Gray, _) => false,
            (ColorMode::Rgb, ColorMode::Gray) => true,
            (ColorMode::Rgb, ColorMode::Rgb | ColorMode::Rgba) => false,
            (ColorMode::Rgba, ColorMode::Rgba) => false,
            (ColorMode::Rgba, ColorMode::Gray | ColorMode::Rgb) => true,
        }
    }
}

/// ITU-R 601 luma, rounded.
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let weighted = 299 * r as u32 + 587 * g as u32 + 114 * b as u32;
    ((weighted + 500) / 1000) as u8
}

/// Immutable 8-bit raster, row-major, channels interleaved.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    data: Vec<u8>,
    width: u32,
    height: u32,
    mode: ColorMode,
}

impl Image {
    pub fn new(data: Vec<u8>, width: u32, height: u32, mode: ColorMode) -> Result<Self, DomainError> {
        if width == 0 || height == 0 {
            return Err(DomainError::InvalidInput(format!(
                "image dimensions must be positive, got {width}x{height}"
            )));
        }
        let expected = width as usize * height as usize * mode.channels();
        if data.len() != expected {
            return Err(DomainError::InvalidInput(format!(
                "buffer holds {} samples, {width}x{height} {mode:?} needs {expected}",
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
            mode,
        })
    }

    /// Image where every sample is `value`.
    #[cfg(test)]
    pub fn filled(width: u32, height: u32, mode: ColorMode, value: u8) -> Result<Self, DomainError> {
        let len = width as usize * height as usize * mode.channels();
        Self::new(vec![value; len], width, height, mode)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn mode(&self) -> ColorMode {
        self.mode
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Samples of the pixel at `(x, y)`.
    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let channels = self.mode.channels();
        let start = (y as usize * self.width as usize + x as usize) * channels;
        &self.data[start..start + channels]
    }

    /// Returns a copy of this image in `target` mode.
    pub fn convert_to(&self, target: ColorMode) -> Image {
        if self.mode == target {
            return self.clone();
        }
        let source_channels = self.mode.channels();
        let mut data = Vec::with_capacity(self.width as usize * self.height as usize * target.channels());
        for px in self.data.chunks_exact(source_channels) {
            match (self.mode, target) {
                (ColorMode::Gray, ColorMode::Rgb) => data.extend_from_slice(&[px[0], px[0], px[0]]),
                (ColorMode::Gray, ColorMode::Rgba) => data.extend_from_slice(&[px[0], px[0], px[0], 255]),
                (ColorMode::Rgb, ColorMode::Gray) | (ColorMode::Rgba, ColorMode::Gray) => {
                    data.push(luma(px[0], px[1], px[2]))
                }
                (ColorMode::Rgb, ColorMode::Rgba) => data.extend_from_slice(&[px[0], px[1], px[2], 255]),
                (ColorMode::Rgba, ColorMode::Rgb) => data.extend_from_slice(&px[..3]),
                (ColorMode::Gray, ColorMode::Gray)
                | (ColorMode::Rgb, ColorMode::Rgb)
                | (ColorMode::Rgba, ColorMode::Rgba) => data.extend_from_slice(px),
            }
        }
        Image {
            data,
            width: self.width,
            height: self.height,
            mode: target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_wrong_buffer_length() {
        let result = Image::new(vec![0; 11], 2, 2, ColorMode::Rgb);
        assert!(matches!(result, Err(DomainError::InvalidInput(_))));
    }

    #[test]
    fn test_new_rejects_zero_dimensions() {
        let result = Image::new(Vec::new(), 0, 5, ColorMode::Gray);
        assert!(matches!(result, Err(DomainError::InvalidInput(_))));
    }

    #[test]
    fn test_gray_to_rgba_replicates_and_sets_opaque_alpha() {
        let gray = Image::new(vec![10, 200], 2, 1, ColorMode::Gray).unwrap();
        let rgba = gray.convert_to(ColorMode::Rgba);
        assert_eq!(rgba.mode(), ColorMode::Rgba);
        assert_eq!(rgba.data(), &[10, 10, 10, 255, 200, 200, 200, 255]);
    }

    #[test]
    fn test_rgba_to_rgb_drops_alpha() {
        let rgba = Image::new(vec![1, 2, 3, 4], 1, 1, ColorMode::Rgba).unwrap();
        assert_eq!(rgba.convert_to(ColorMode::Rgb).data(), &[1, 2, 3]);
        assert!(ColorMode::Rgba.is_lossy_to(ColorMode::Rgb));
        assert!(!ColorMode::Rgb.is_lossy_to(ColorMode::Rgba));
    }

    #[test]
    fn test_rgb_to_gray_uses_luma() {
        let rgb = Image::new(vec![255, 255, 255, 255, 0, 0], 2, 1, ColorMode::Rgb).unwrap();
        let gray = rgb.convert_to(ColorMode::Gray);
        assert_eq!(gray.data(), &[255, 76]);
    }

    #[test]
    fn test_pixel_indexing() {
        let img = Image::new((0..12).collect(), 2, 2, ColorMode::Rgb).unwrap();
        assert_eq!(img.pixel(1, 1), &[9, 10, 11]);
        assert_eq!(img.pixel(0, 1), &[6, 7, 8]);
    }
}
