use image::{GrayImage, ImageBuffer, Luma, Pixel, Rgb, RgbImage, Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::domain::annotator_trait::{Annotator, BoxStyle};
use crate::domain::error::DomainError;
use crate::domain::image::{luma, ColorMode, Image};
use crate::domain::region::Region;

/// Draws region outlines with `imageproc`.
pub struct ImageprocAnnotator;

impl ImageprocAnnotator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageprocAnnotator {
    fn default() -> Self {
        Self::new()
    }
}

impl Annotator for ImageprocAnnotator {
    fn annotate(&self, image: &Image, regions: &[Region], style: &BoxStyle) -> Result<Image, DomainError> {
        let (width, height) = image.dimensions();
        if let Some(outside) = regions.iter().find(|r| r.x >= width || r.y >= height) {
            return Err(DomainError::AnnotationBounds {
                x: outside.x,
                y: outside.y,
                width,
                height,
            });
        }

        let thickness = style.thickness.max(1);
        let color = style.color;
        let data = image.data().to_vec();

        let annotated = match image.mode() {
            ColorMode::Gray => {
                let mut canvas: GrayImage = into_buffer(data, width, height)?;
                draw_boxes(&mut canvas, regions, thickness, Luma([luma(color.r, color.g, color.b)]));
                canvas.into_raw()
            }
            ColorMode::Rgb => {
                let mut canvas: RgbImage = into_buffer(data, width, height)?;
                draw_boxes(&mut canvas, regions, thickness, Rgb([color.r, color.g, color.b]));
                canvas.into_raw()
            }
            ColorMode::Rgba => {
                let mut canvas: RgbaImage = into_buffer(data, width, height)?;
                draw_boxes(&mut canvas, regions, thickness, Rgba([color.r, color.g, color.b, color.a]));
                canvas.into_raw()
            }
        };

        Image::new(annotated, width, height, image.mode())
    }
}

fn into_buffer<P>(data: Vec<u8>, width: u32, height: u32) -> Result<ImageBuffer<P, Vec<u8>>, DomainError>
where
    P: Pixel<Subpixel = u8>,
{
    ImageBuffer::from_raw(width, height, data)
        .ok_or_else(|| DomainError::InvalidInput("pixel buffer does not match image size".to_string()))
}

/// Outline spans (x, y)-(x + w, y + h); extra thickness grows outward.
fn draw_boxes<P>(canvas: &mut ImageBuffer<P, Vec<u8>>, regions: &[Region], thickness: u32, color: P)
where
    P: Pixel<Subpixel = u8> + 'static,
{
    for region in regions {
        for t in 0..thickness {
            let rect = Rect::at(region.x as i32 - t as i32, region.y as i32 - t as i32)
                .of_size(region.width + 1 + 2 * t, region.height + 1 + 2 * t);
            draw_hollow_rect_mut(canvas, rect, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::color::Color;

    #[test]
    fn test_no_regions_returns_identical_copy() {
        let data: Vec<u8> = (0..48).collect();
        let image = Image::new(data, 4, 4, ColorMode::Rgb).unwrap();
        let annotated = ImageprocAnnotator::new()
            .annotate(&image, &[], &BoxStyle::default())
            .unwrap();
        assert_eq!(annotated, image);
    }

    #[test]
    fn test_outline_is_drawn_and_interior_untouched() {
        let image = Image::filled(40, 40, ColorMode::Rgb, 0).unwrap();
        let style = BoxStyle { color: Color::RED, thickness: 1 };
        let annotated = ImageprocAnnotator::new()
            .annotate(&image, &[Region::new(10, 10, 10, 10)], &style)
            .unwrap();

        assert_eq!(annotated.pixel(10, 10), &[255, 0, 0]);
        assert_eq!(annotated.pixel(20, 20), &[255, 0, 0]);
        assert_eq!(annotated.pixel(15, 10), &[255, 0, 0]);
        assert_eq!(annotated.pixel(15, 15), &[0, 0, 0]);
        assert_eq!(annotated.pixel(21, 21), &[0, 0, 0]);
        // 入力はそのまま
        assert!(image.data().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_default_thickness_grows_outward() {
        let image = Image::filled(40, 40, ColorMode::Rgba, 0).unwrap();
        let annotated = ImageprocAnnotator::new()
            .annotate(&image, &[Region::new(10, 10, 5, 5)], &BoxStyle::default())
            .unwrap();

        assert_eq!(annotated.pixel(9, 9), &[255, 0, 0, 255]);
        assert_eq!(annotated.pixel(10, 12), &[255, 0, 0, 255]);
        assert_eq!(annotated.pixel(11, 12), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_gray_image_uses_highlight_luma() {
        let image = Image::filled(10, 10, ColorMode::Gray, 0).unwrap();
        let annotated = ImageprocAnnotator::new()
            .annotate(&image, &[Region::new(2, 2, 3, 3)], &BoxStyle::default())
            .unwrap();
        assert_eq!(annotated.pixel(2, 2), &[76]);
    }

    #[test]
    fn test_region_touching_edge_is_clipped() {
        let image = Image::filled(8, 8, ColorMode::Gray, 0).unwrap();
        let annotated = ImageprocAnnotator::new()
            .annotate(&image, &[Region::new(0, 0, 8, 8)], &BoxStyle::default())
            .unwrap();
        assert_eq!(annotated.pixel(0, 0), &[76]);
        assert_eq!(annotated.pixel(4, 4), &[0]);
    }

    #[test]
    fn test_region_outside_image_is_rejected() {
        let image = Image::filled(8, 8, ColorMode::Gray, 0).unwrap();
        let result = ImageprocAnnotator::new().annotate(&image, &[Region::new(8, 0, 2, 2)], &BoxStyle::default());
        assert_eq!(
            result,
            Err(DomainError::AnnotationBounds { x: 8, y: 0, width: 8, height: 8 })
        );
    }
}
