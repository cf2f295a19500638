//! Error types for map layers.

use std::path::PathBuf;

use cf_dataset::CfError;
use thiserror::Error;
use wfs::WfsError;

/// Result type alias using LayerError.
pub type LayerResult<T> = Result<T, LayerError>;

#[derive(Error, Debug)]
pub enum LayerError {
    #[error(transparent)]
    Wfs(#[from] WfsError),

    #[error(transparent)]
    Cf(#[from] CfError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid GeoJSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// No aquaculture site with this location number.
    #[error("Location {0} not found")]
    LocationNotFound(i64),

    /// No distribution layer for this species name.
    #[error("Unknown species: {0}")]
    UnknownSpecies(String),

    #[error("Unknown coastline source: {0} (expected kartverket or gshhs)")]
    UnknownCoastSource(String),

    /// The coastline source data is not in the data directory.
    #[error("Cannot obtain coastline data from {0}")]
    CoastDataMissing(PathBuf),

    /// Clipping the coastline source failed.
    #[error("coastline clipping failed: {0}")]
    ClipFailed(String),

    /// A geometry that cannot be used.
    #[error("geometry error: {0}")]
    Geometry(String),
}
