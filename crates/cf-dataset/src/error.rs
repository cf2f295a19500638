//! Error types for CF dataset operations.

use crs::CrsError;
use thiserror::Error;

/// Result type alias using CfError.
pub type CfResult<T> = Result<T, CfError>;

#[derive(Debug, Error)]
pub enum CfError {
    #[error(transparent)]
    Crs(#[from] CrsError),

    /// The frame uses a projection that has no CF grid mapping here
    #[error("Projection cannot be encoded as a grid mapping: {0}")]
    UnsupportedProjection(String),

    #[error("Unsupported grid_mapping_name: {0}")]
    UnsupportedMapping(String),

    #[error("Grid mapping '{mapping}' lacks the '{attribute}' attribute")]
    MissingDefinition { mapping: String, attribute: String },

    #[error("Grid mapping not found: {0}")]
    MappingNotFound(String),

    #[error("Coordinate axes do not match the dataset: {0}")]
    AxisShapeMismatch(String),

    #[error("Variable not found: {0}")]
    VariableNotFound(String),

    #[error("Dimension '{dim}' has length {expected} but variable '{variable}' has {found}")]
    DimensionMismatch {
        dim: String,
        variable: String,
        expected: usize,
        found: usize,
    },
}
