use thiserror::Error;

use crate::domain::image::ColorMode;

#[derive(Error, Debug, PartialEq)]
pub enum DomainError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Image size mismatch: {left_width}x{left_height} vs {right_width}x{right_height}")]
    ShapeMismatch {
        left_width: u32,
        left_height: u32,
        right_width: u32,
        right_height: u32,
    },

    #[error("Unsupported color mode: {0}")]
    UnsupportedMode(String),

    // strict_modes が有効な場合のみ
    #[error("Color modes differ: {left:?} vs {right:?}")]
    ModeMismatch { left: ColorMode, right: ColorMode },

    #[error("Region at ({x}, {y}) lies outside the {width}x{height} image")]
    AnnotationBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
}
