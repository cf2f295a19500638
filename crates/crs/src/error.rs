//! Error types for reference frame construction and transforms.

use thiserror::Error;

/// Result type alias using CrsError.
pub type CrsResult<T> = Result<T, CrsError>;

#[derive(Debug, Error)]
pub enum CrsError {
    /// Malformed EPSG code, WKT or PROJ4 definition
    #[error("Invalid CRS definition: {0}")]
    InvalidDefinition(String),

    #[error("Unknown NF160 area '{0}', expected one of A01..A13")]
    UnknownArea(String),

    #[error("Coordinate arrays differ in shape: x {x:?}, y {y:?}")]
    ShapeMismatch { x: Vec<usize>, y: Vec<usize> },

    /// The frame is well formed but its projection cannot be evaluated
    #[error("Projection not supported for transforms: {0}")]
    UnsupportedProjection(String),
}

impl CrsError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        CrsError::InvalidDefinition(message.into())
    }
}
