//! CF-convention datasets and coordinate reference handling.
//!
//! [`Dataset`] is a small in-memory model of a netCDF/CF dataset. The
//! functions in this crate never modify their input: every operation
//! returns a new dataset.
//!
//! - [`GridMapping`]: encode a [`crs::ReferenceFrame`] as a CF grid-mapping
//!   variable and decode it back
//! - [`attribute_coordinates`]: tag coordinate axes and link data variables
//!   to a grid mapping
//! - [`set_crs`] and [`change_crs`]: attach a reference frame, or re-project
//!   a dataset's coordinates into a new one

pub mod dataset;
pub mod error;
pub mod geocoords;
pub mod grid_mapping;
pub mod rewrite;

pub use dataset::{AttrValue, Attributes, DataType, Dataset, Variable};
pub use error::{CfError, CfResult};
pub use geocoords::{
    attribute_coordinates, create_geocoords, create_grid_mapping, frame_from_dataset,
    grid_mappings,
};
pub use grid_mapping::{GridMapping, MappingKind, TransverseMercatorParams, DEFAULT_MAPPING_NAME};
pub use rewrite::{change_crs, set_crs, CrsRef};
