//! Coordinate reference frames for gridded and point geodata.
//!
//! A [`ReferenceFrame`] is a value type fully described by its canonical
//! WKT1 text. Frames are built from EPSG codes, WKT, PROJ4 strings, local
//! transverse Mercator parameters or the NK800/NF160 ocean model grids,
//! and coordinate arrays are moved between frames with [`transform`].

pub mod error;
pub mod frame;
pub mod grids;
mod proj4;
pub mod registry;
pub mod transform;
mod wkt;

pub use error::{CrsError, CrsResult};
pub use frame::{
    Authority, Datum, GeographicCrs, PrimeMeridian, ProjectedCrs, ProjectionMethod, ReferenceFrame,
    Spheroid, Unit,
};
pub use grids::{GridOrigin, NF160_AREAS, NK800};
pub use registry::{epsg_code, is_known_code, EPSG_CODES};
pub use transform::{transform, Transformer};
