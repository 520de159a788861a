//! Error types for simmatch.

use crate::image::GridShape;
use thiserror::Error;

/// Result alias for simmatch operations.
pub type SimMatchResult<T> = std::result::Result<T, SimMatchError>;

/// Errors that can occur while normalizing, scoring or scanning images.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SimMatchError {
    /// Raw bytes could not be decoded into an image.
    #[error("failed to decode image: {reason}")]
    Decode { reason: String },
    /// Two normalized grids with different shapes were compared.
    ///
    /// Grids produced by one `Normalizer` always share a shape, so this
    /// signals a programming error rather than bad input.
    #[error("shape mismatch: {left} vs {right}")]
    ShapeMismatch { left: GridShape, right: GridShape },
    /// Similarity threshold outside `[-1, 1]` or not finite.
    #[error("invalid threshold {value}: expected a finite value in [-1, 1]")]
    InvalidThreshold { value: f64 },
    /// A normalizer, scorer or ranker parameter is invalid.
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
    /// Width or height is zero or too large.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Stride is smaller than the row width.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// Backing buffer is shorter than the view requires.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// The image source failed to list or read records.
    #[error("image source error: {reason}")]
    Source { reason: String },
    /// A collection listing contained the same identity twice.
    #[error("duplicate identity in collection listing: {id}")]
    DuplicateIdentity { id: String },
    /// Filesystem failure inside a collaborator.
    #[error("io error: {reason}")]
    Io { reason: String },
}

impl From<std::io::Error> for SimMatchError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            reason: err.to_string(),
        }
    }
}
