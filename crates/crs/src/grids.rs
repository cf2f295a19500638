//! Ocean model grids and local frames.
//!
//! NorKyst800 (NK800) and the thirteen NorFjords160 (NF160) sub-grids are
//! polar stereographic grids on ETRS89 with true scale at 60°N. By default
//! their coordinates are grid cell indices, expressed through a linear unit
//! named "Cells" whose size is the cell width in metres.

use crate::error::{CrsError, CrsResult};
use crate::frame::{ProjectedCrs, ProjectionMethod, ReferenceFrame, Unit};
use crate::registry;

const LATITUDE_OF_ORIGIN: f64 = 60.0;

/// Origin and resolution of a polar stereographic model grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridOrigin {
    pub name: &'static str,
    /// False easting in cells
    pub false_easting: f64,
    /// False northing in cells
    pub false_northing: f64,
    /// Cell width (meters)
    pub cell_size: f64,
    /// Central meridian (degrees)
    pub central_meridian: f64,
}

pub const NK800: GridOrigin = GridOrigin::new("NK800", 3991.0, 2230.0, 800.0, 70.0);

/// NorFjords160 sub-grids keyed by area.
pub static NF160_AREAS: [(&str, GridOrigin); 13] = [
    ("A01", GridOrigin::new("NF160_A01", 18704.0, 10752.0, 160.0, 70.0)),
    ("A02", GridOrigin::new("NF160_A02", 19254.0, 10352.0, 160.0, 70.0)),
    ("A03", GridOrigin::new("NF160_A03", 19254.0, 9282.0, 160.0, 70.0)),
    ("A04", GridOrigin::new("NF160_A04", 18854.0, 8992.0, 160.0, 70.0)),
    ("A05", GridOrigin::new("NF160_A05", 18104.0, 8922.0, 160.0, 70.0)),
    ("A06", GridOrigin::new("NF160_A06", 16904.0, 8582.0, 160.0, 70.0)),
    ("A07", GridOrigin::new("NF160_A07", 16074.0, 9082.0, 160.0, 70.0)),
    ("A08", GridOrigin::new("NF160_A08", 14804.0, 8932.0, 160.0, 70.0)),
    ("A09", GridOrigin::new("NF160_A09", 14054.0, 8932.0, 160.0, 70.0)),
    ("A10", GridOrigin::new("NF160_A10", 12954.0, 8802.0, 160.0, 70.0)),
    ("A11", GridOrigin::new("NF160_A11", 11554.0, 8952.0, 160.0, 70.0)),
    ("A12", GridOrigin::new("NF160_A12", 10004.0, 9422.0, 160.0, 70.0)),
    ("A13", GridOrigin::new("NF160_A13", 8754.0, 10552.0, 160.0, 70.0)),
];

impl GridOrigin {
    const fn new(
        name: &'static str,
        false_easting: f64,
        false_northing: f64,
        cell_size: f64,
        central_meridian: f64,
    ) -> Self {
        Self {
            name,
            false_easting,
            false_northing,
            cell_size,
            central_meridian,
        }
    }

    /// Build the reference frame of this grid.
    ///
    /// With `metric_unit` the false origin is scaled to metres and the
    /// linear unit is the metre; otherwise coordinates count cells.
    pub fn frame(&self, metric_unit: bool) -> ReferenceFrame {
        let (scale, linear_unit) = if metric_unit {
            (self.cell_size, Unit::metre())
        } else {
            (
                1.0,
                Unit {
                    name: "Cells".to_string(),
                    factor: self.cell_size,
                    authority: None,
                },
            )
        };

        ReferenceFrame::projected_crs(ProjectedCrs {
            name: self.name.to_string(),
            geographic: registry::etrs89(),
            method: ProjectionMethod::PolarStereographic,
            parameters: vec![
                ("latitude_of_origin".to_string(), LATITUDE_OF_ORIGIN),
                ("central_meridian".to_string(), self.central_meridian),
                ("scale_factor".to_string(), 1.0),
                ("false_easting".to_string(), self.false_easting * scale),
                ("false_northing".to_string(), self.false_northing * scale),
            ],
            linear_unit,
            authority: None,
        })
    }
}

pub(crate) fn nf160_area(area: &str) -> CrsResult<&'static GridOrigin> {
    NF160_AREAS
        .iter()
        .find(|(key, _)| *key == area)
        .map(|(_, origin)| origin)
        .ok_or_else(|| CrsError::UnknownArea(area.to_string()))
}

pub(crate) fn local(lon: f64, lat: f64) -> ReferenceFrame {
    ReferenceFrame::projected_crs(ProjectedCrs {
        name: "Local Transverse Mercator".to_string(),
        geographic: registry::etrs89(),
        method: ProjectionMethod::TransverseMercator,
        parameters: registry::tm_parameters(lat, lon, 1.0, 0.0, 0.0),
        linear_unit: Unit::metre(),
        authority: None,
    })
}
