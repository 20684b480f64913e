use thiserror::Error;

use crate::Rect;

#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("IO error: {0}")]
    IoError(std::io::Error),
    #[error("Image error: {0}")]
    ImageError(String),
    #[error("Invalid overlay format: {0}")]
    InvalidOverlayFormat(String),
    #[error("Region {region} exceeds the {width}x{height} frame")]
    OutOfBoundsRegion { region: Rect, width: u32, height: u32 },
    #[error("Dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
    #[error("Analysis error: {0}")]
    AnalysisError(String),
}

impl From<std::io::Error> for OverlayError {
    fn from(err: std::io::Error) -> Self {
        OverlayError::IoError(err)
    }
}

impl From<image::ImageError> for OverlayError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(err) => OverlayError::IoError(err),
            err => OverlayError::ImageError(err.to_string()),
        }
    }
}

impl From<ndarray::ShapeError> for OverlayError {
    fn from(err: ndarray::ShapeError) -> Self {
        OverlayError::ImageError(err.to_string())
    }
}

pub type OverlayResult<R> = Result<R, OverlayError>;
