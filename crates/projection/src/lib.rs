//! Ellipsoidal map projections and datum arithmetic.
//!
//! Implements the projections needed for the Norwegian coastal grids from
//! scratch: Transverse Mercator (UTM, ETRS89-TM zones and local frames) and
//! polar stereographic (the NorKyst800 and NorFjords160 model grids).
//!
//! All functions work in radians and metres. Callers are responsible for
//! unit conversion, false origins expressed in non-metric units and prime
//! meridian offsets.

pub mod ellipsoid;
pub mod geographic;
pub mod polar;
pub mod transverse_mercator;

pub use ellipsoid::Ellipsoid;
pub use geographic::{geocentric_to_geodetic, geodetic_to_geocentric, Helmert};
pub use polar::PolarStereographic;
pub use transverse_mercator::TransverseMercator;
