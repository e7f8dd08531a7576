use crate::domain::color::Color;
use crate::domain::error::DomainError;
use crate::domain::image::Image;
use crate::domain::region::Region;

pub const DEFAULT_LINE_THICKNESS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxStyle {
    pub color: Color,
    pub thickness: u32,
}

impl Default for BoxStyle {
    fn default() -> Self {
        Self {
            color: Color::RED,
            thickness: DEFAULT_LINE_THICKNESS,
        }
    }
}

pub trait Annotator {
    /// Returns a copy of `image` with an outline drawn around every region,
    /// in order. `image` itself is left untouched.
    fn annotate(&self, image: &Image, regions: &[Region], style: &BoxStyle) -> Result<Image, DomainError>;
}
