//! Error type shared by every engine entry point.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(
        "invalid geometry: width {width}, height {height}, stride {stride} \
         (stride must be >= width * 3)"
    )]
    InvalidGeometry {
        width: usize,
        height: usize,
        stride: usize,
    },

    #[error("buffer length {actual} does not match stride * height = {expected}")]
    BufferLength { expected: usize, actual: usize },

    #[error("image size mismatch: {}x{} vs {}x{}", left.0, left.1, right.0, right.1)]
    GeometryMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("invalid kernel: {0}")]
    InvalidKernel(String),

    #[error("layout error: {0}")]
    Layout(#[from] ndarray::ShapeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub(crate) fn parameter(name: &'static str, reason: impl Into<String>) -> Self {
        EngineError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Reject `value` unless it lies in `min..=max`.
pub(crate) fn check_range(name: &'static str, value: i64, min: i64, max: i64) -> Result<()> {
    if value < min || value > max {
        return Err(EngineError::parameter(
            name,
            format!("{value} is outside [{min}, {max}]"),
        ));
    }
    Ok(())
}
