//! CF grid-mapping variables.
//!
//! A grid mapping is a zero-dimensional int8 variable whose attributes carry
//! a reference frame: its WKT (`crs_wkt` and the GDAL-style `spatial_ref`),
//! the ellipsoid and datum names, and for projected frames the projection
//! parameters named by the CF conventions. Only `latitude_longitude` and
//! `transverse_mercator` are supported.

use crs::ReferenceFrame;

use crate::dataset::{AttrValue, DataType, Dataset, Variable};
use crate::error::{CfError, CfResult};

/// Name used for grid-mapping variables created without an explicit name.
pub const DEFAULT_MAPPING_NAME: &str = "crs_def";

const LATITUDE_LONGITUDE: &str = "latitude_longitude";
const TRANSVERSE_MERCATOR: &str = "transverse_mercator";

/// Projection parameters of a `transverse_mercator` grid mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransverseMercatorParams {
    pub scale_factor_at_central_meridian: f64,
    /// Degrees east
    pub longitude_of_central_meridian: f64,
    /// Degrees north
    pub latitude_of_projection_origin: f64,
    /// Projected units
    pub false_easting: f64,
    /// Projected units
    pub false_northing: f64,
}

/// Kind of a grid mapping, discriminated by `grid_mapping_name`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MappingKind {
    LatitudeLongitude,
    TransverseMercator(TransverseMercatorParams),
}

impl MappingKind {
    pub fn grid_mapping_name(&self) -> &'static str {
        match self {
            MappingKind::LatitudeLongitude => LATITUDE_LONGITUDE,
            MappingKind::TransverseMercator(_) => TRANSVERSE_MERCATOR,
        }
    }

    pub fn is_projected(&self) -> bool {
        !matches!(self, MappingKind::LatitudeLongitude)
    }
}

/// A named grid-mapping record.
#[derive(Debug, Clone, PartialEq)]
pub struct GridMapping {
    /// Variable name in the dataset
    pub name: String,

    /// WKT of the frame. Required for decoding.
    pub crs_wkt: Option<String>,

    /// Semi-major axis of the ellipsoid (meters)
    pub semi_major_axis: f64,

    pub inverse_flattening: f64,

    pub projected_crs_name: Option<String>,
    pub geographic_crs_name: Option<String>,
    pub horizontal_datum_name: Option<String>,
    pub reference_ellipsoid_name: Option<String>,
    pub prime_meridian_name: Option<String>,

    /// Datum shift to WGS 84: seven values, or empty when the datum has none
    pub towgs84: Vec<f64>,

    pub kind: MappingKind,
}

impl GridMapping {
    /// Describe a reference frame as a grid mapping named `name`.
    ///
    /// Fails with `UnsupportedProjection` for projections other than
    /// Transverse Mercator.
    pub fn encode(frame: &ReferenceFrame, name: &str) -> CfResult<Self> {
        let kind = match frame.projection_name() {
            None => MappingKind::LatitudeLongitude,
            Some("Transverse_Mercator") => {
                let param = |key: &str| frame.projection_parameter(key).unwrap_or(0.0);
                MappingKind::TransverseMercator(TransverseMercatorParams {
                    scale_factor_at_central_meridian: frame
                        .projection_parameter("scale_factor")
                        .unwrap_or(1.0),
                    longitude_of_central_meridian: param("central_meridian"),
                    latitude_of_projection_origin: param("latitude_of_origin"),
                    false_easting: param("false_easting"),
                    false_northing: param("false_northing"),
                })
            }
            Some(other) => return Err(CfError::UnsupportedProjection(other.to_string())),
        };

        Ok(Self {
            name: name.to_string(),
            crs_wkt: Some(frame.wkt().to_string()),
            semi_major_axis: frame.semi_major(),
            inverse_flattening: frame.inverse_flattening(),
            projected_crs_name: frame.projected_name().map(str::to_string),
            geographic_crs_name: Some(frame.geographic_name().to_string()),
            horizontal_datum_name: Some(frame.datum_name().to_string()),
            reference_ellipsoid_name: Some(frame.ellipsoid_name().to_string()),
            prime_meridian_name: Some(frame.prime_meridian_name().to_string()),
            towgs84: frame.towgs84().map(|p| p.to_vec()).unwrap_or_default(),
            kind,
        })
    }

    /// Rebuild the reference frame from `crs_wkt`.
    pub fn decode(&self) -> CfResult<ReferenceFrame> {
        let wkt = self.crs_wkt.as_deref().ok_or_else(|| CfError::MissingDefinition {
            mapping: self.name.clone(),
            attribute: "crs_wkt".to_string(),
        })?;
        Ok(ReferenceFrame::from_wkt(wkt)?)
    }

    /// Same mapping under another variable name.
    pub fn renamed(&self, name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..self.clone()
        }
    }

    /// The zero-dimensional variable holding this mapping.
    pub fn to_variable(&self) -> Variable {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();

        let mut var = Variable::scalar(0.0, DataType::Int8)
            .with_attr("long_name", "CRS definition")
            .with_attr("semi_major_axis", self.semi_major_axis)
            .with_attr("inverse_flattening", self.inverse_flattening)
            .with_attr("projected_crs_name", text(&self.projected_crs_name))
            .with_attr("geographic_crs_name", text(&self.geographic_crs_name))
            .with_attr("horizontal_datum_name", text(&self.horizontal_datum_name))
            .with_attr("reference_ellipsoid_name", text(&self.reference_ellipsoid_name))
            .with_attr("prime_meridian_name", text(&self.prime_meridian_name))
            .with_attr("towgs84", self.towgs84.clone())
            .with_attr("grid_mapping_name", self.kind.grid_mapping_name());

        if let Some(wkt) = &self.crs_wkt {
            var.set_attr("crs_wkt", wkt.as_str());
            var.set_attr("spatial_ref", wkt.as_str());
        }

        if let MappingKind::TransverseMercator(params) = &self.kind {
            var.set_attr(
                "scale_factor_at_central_meridian",
                params.scale_factor_at_central_meridian,
            );
            var.set_attr(
                "longitude_of_central_meridian",
                params.longitude_of_central_meridian,
            );
            var.set_attr(
                "latitude_of_projection_origin",
                params.latitude_of_projection_origin,
            );
            var.set_attr("false_easting", params.false_easting);
            var.set_attr("false_northing", params.false_northing);
        }

        var
    }

    /// Read a grid mapping from a variable's attributes.
    pub fn from_variable(name: &str, var: &Variable) -> CfResult<Self> {
        let kind_name = var
            .text_attr("grid_mapping_name")
            .ok_or_else(|| CfError::MappingNotFound(name.to_string()))?;

        let number = |key: &str| {
            var.attr(key)
                .and_then(AttrValue::as_number)
                .ok_or_else(|| CfError::MissingDefinition {
                    mapping: name.to_string(),
                    attribute: key.to_string(),
                })
        };
        let text = |key: &str| {
            var.text_attr(key)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        let kind = match kind_name {
            LATITUDE_LONGITUDE => MappingKind::LatitudeLongitude,
            TRANSVERSE_MERCATOR => MappingKind::TransverseMercator(TransverseMercatorParams {
                scale_factor_at_central_meridian: number("scale_factor_at_central_meridian")?,
                longitude_of_central_meridian: number("longitude_of_central_meridian")?,
                latitude_of_projection_origin: number("latitude_of_projection_origin")?,
                false_easting: number("false_easting")?,
                false_northing: number("false_northing")?,
            }),
            other => return Err(CfError::UnsupportedMapping(other.to_string())),
        };

        Ok(Self {
            name: name.to_string(),
            crs_wkt: text("crs_wkt").or_else(|| text("spatial_ref")),
            semi_major_axis: number("semi_major_axis")?,
            inverse_flattening: number("inverse_flattening")?,
            projected_crs_name: text("projected_crs_name"),
            geographic_crs_name: text("geographic_crs_name"),
            horizontal_datum_name: text("horizontal_datum_name"),
            reference_ellipsoid_name: text("reference_ellipsoid_name"),
            prime_meridian_name: text("prime_meridian_name"),
            towgs84: var
                .attr("towgs84")
                .and_then(AttrValue::as_numbers)
                .unwrap_or_default(),
            kind,
        })
    }

    /// Look up the grid mapping variable `name` in a dataset.
    pub fn from_dataset(dataset: &Dataset, name: &str) -> CfResult<Self> {
        let var = dataset
            .variable(name)
            .ok_or_else(|| CfError::MappingNotFound(name.to_string()))?;
        Self::from_variable(name, var)
    }
}
