//! The [`ReferenceFrame`] value type and its components.

use std::fmt;
use std::str::FromStr;

use projection::Ellipsoid;

use crate::error::{CrsError, CrsResult};
use crate::{grids, proj4, registry, wkt};

/// An `AUTHORITY["EPSG","4326"]` tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authority {
    pub name: String,
    pub code: String,
}

impl Authority {
    pub fn epsg(code: u32) -> Self {
        Self {
            name: "EPSG".to_string(),
            code: code.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spheroid {
    pub name: String,
    /// Semi-major axis (meters)
    pub semi_major: f64,
    /// Inverse flattening, 0 for a sphere
    pub inverse_flattening: f64,
    pub authority: Option<Authority>,
}

impl Spheroid {
    pub fn ellipsoid(&self) -> Ellipsoid {
        Ellipsoid::new(self.semi_major, self.inverse_flattening)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Datum {
    pub name: String,
    pub spheroid: Spheroid,
    /// Seven-parameter shift to WGS 84, when published
    pub towgs84: Option<[f64; 7]>,
    pub authority: Option<Authority>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrimeMeridian {
    pub name: String,
    /// Longitude east of Greenwich, in the angular unit of the frame
    pub longitude: f64,
    pub authority: Option<Authority>,
}

impl PrimeMeridian {
    pub fn greenwich() -> Self {
        Self {
            name: "Greenwich".to_string(),
            longitude: 0.0,
            authority: Some(Authority::epsg(8901)),
        }
    }
}

/// A linear or angular unit with its conversion factor to metres/radians.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub name: String,
    pub factor: f64,
    pub authority: Option<Authority>,
}

impl Unit {
    pub fn metre() -> Self {
        Self {
            name: "metre".to_string(),
            factor: 1.0,
            authority: Some(Authority::epsg(9001)),
        }
    }

    pub fn degree() -> Self {
        Self {
            name: "degree".to_string(),
            factor: 0.0174532925199433,
            authority: Some(Authority::epsg(9122)),
        }
    }

    /// Convert a value in this angular unit to radians.
    ///
    /// Degrees go through `to_radians` so that whole-degree values map to
    /// exactly the same radians as projection parameters do.
    pub(crate) fn angle_to_radians(&self, value: f64) -> f64 {
        if self.is_degree() {
            value.to_radians()
        } else {
            value * self.factor
        }
    }

    pub(crate) fn radians_to_angle(&self, value: f64) -> f64 {
        if self.is_degree() {
            value.to_degrees()
        } else {
            value / self.factor
        }
    }

    fn is_degree(&self) -> bool {
        (self.factor - std::f64::consts::PI / 180.0).abs() < 1e-15
    }
}

/// A `GEOGCS` definition.
#[derive(Debug, Clone, PartialEq)]
pub struct GeographicCrs {
    pub name: String,
    pub datum: Datum,
    pub prime_meridian: PrimeMeridian,
    pub angular_unit: Unit,
    pub authority: Option<Authority>,
}

/// Projection methods the transformer can evaluate.
///
/// Anything else is carried through WKT unchanged as `Other`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionMethod {
    TransverseMercator,
    PolarStereographic,
    Other(String),
}

impl ProjectionMethod {
    pub fn from_wkt_name(name: &str) -> Self {
        match name {
            "Transverse_Mercator" => ProjectionMethod::TransverseMercator,
            "Polar_Stereographic" => ProjectionMethod::PolarStereographic,
            other => ProjectionMethod::Other(other.to_string()),
        }
    }

    pub fn wkt_name(&self) -> &str {
        match self {
            ProjectionMethod::TransverseMercator => "Transverse_Mercator",
            ProjectionMethod::PolarStereographic => "Polar_Stereographic",
            ProjectionMethod::Other(name) => name,
        }
    }
}

/// A `PROJCS` definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedCrs {
    pub name: String,
    pub geographic: GeographicCrs,
    pub method: ProjectionMethod,
    /// `PARAMETER` entries in declaration order
    pub parameters: Vec<(String, f64)>,
    pub linear_unit: Unit,
    pub authority: Option<Authority>,
}

impl ProjectedCrs {
    pub fn parameter(&self, name: &str) -> Option<f64> {
        self.parameters
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| *value)
    }

    pub(crate) fn parameter_or(&self, name: &str, default: f64) -> f64 {
        self.parameter(name).unwrap_or(default)
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Definition {
    Geographic(GeographicCrs),
    Projected(ProjectedCrs),
}

/// A coordinate reference definition.
///
/// Two frames are equal when their canonical WKT encodings are identical.
#[derive(Debug, Clone)]
pub struct ReferenceFrame {
    definition: Definition,
    wkt: String,
}

impl ReferenceFrame {
    pub(crate) fn from_definition(definition: Definition) -> Self {
        let wkt = wkt::write(&definition);
        Self { definition, wkt }
    }

    pub fn geographic_crs(geographic: GeographicCrs) -> Self {
        Self::from_definition(Definition::Geographic(geographic))
    }

    pub fn projected_crs(projected: ProjectedCrs) -> Self {
        Self::from_definition(Definition::Projected(projected))
    }

    /// Look up a frame in the EPSG database.
    pub fn from_epsg(code: u32) -> CrsResult<Self> {
        registry::lookup(code).map(Self::from_definition)
    }

    /// Look up a frame by its short name (`wgs84`, `utm33n`, `etrs89_utm32n`, ...).
    pub fn from_name(name: &str) -> CrsResult<Self> {
        registry::epsg_code(name)
            .ok_or_else(|| CrsError::invalid(format!("unknown CRS name '{}'", name)))
            .and_then(Self::from_epsg)
    }

    pub fn from_wkt(text: &str) -> CrsResult<Self> {
        wkt::parse(text).map(Self::from_definition)
    }

    pub fn from_proj4(text: &str) -> CrsResult<Self> {
        proj4::parse(text).map(Self::from_definition)
    }

    /// Transverse Mercator frame on ETRS89 centred at (`lon`, `lat`), in metres.
    pub fn local(lon: f64, lat: f64) -> Self {
        grids::local(lon, lat)
    }

    /// The NorKyst800 polar stereographic grid.
    ///
    /// Coordinates are grid cell indices unless `metric_unit` is set.
    pub fn nk800(metric_unit: bool) -> Self {
        grids::NK800.frame(metric_unit)
    }

    /// One of the thirteen NorFjords160 sub-grids, `A01` to `A13`.
    pub fn nf160(area: &str, metric_unit: bool) -> CrsResult<Self> {
        grids::nf160_area(area).map(|origin| origin.frame(metric_unit))
    }

    /// Canonical WKT1 encoding.
    pub fn wkt(&self) -> &str {
        &self.wkt
    }

    pub fn to_proj4(&self) -> CrsResult<String> {
        proj4::write(&self.definition)
    }

    pub fn geographic(&self) -> &GeographicCrs {
        match &self.definition {
            Definition::Geographic(geog) => geog,
            Definition::Projected(proj) => &proj.geographic,
        }
    }

    pub fn projected(&self) -> Option<&ProjectedCrs> {
        match &self.definition {
            Definition::Geographic(_) => None,
            Definition::Projected(proj) => Some(proj),
        }
    }

    pub fn is_geographic(&self) -> bool {
        matches!(self.definition, Definition::Geographic(_))
    }

    pub fn is_projected(&self) -> bool {
        matches!(self.definition, Definition::Projected(_))
    }

    pub fn semi_major(&self) -> f64 {
        self.geographic().datum.spheroid.semi_major
    }

    pub fn inverse_flattening(&self) -> f64 {
        self.geographic().datum.spheroid.inverse_flattening
    }

    pub fn projected_name(&self) -> Option<&str> {
        self.projected().map(|proj| proj.name.as_str())
    }

    pub fn geographic_name(&self) -> &str {
        &self.geographic().name
    }

    pub fn datum_name(&self) -> &str {
        &self.geographic().datum.name
    }

    pub fn ellipsoid_name(&self) -> &str {
        &self.geographic().datum.spheroid.name
    }

    pub fn prime_meridian_name(&self) -> &str {
        &self.geographic().prime_meridian.name
    }

    pub fn towgs84(&self) -> Option<[f64; 7]> {
        self.geographic().datum.towgs84
    }

    /// WKT name of the projection, `None` for geographic frames.
    pub fn projection_name(&self) -> Option<&str> {
        self.projected().map(|proj| proj.method.wkt_name())
    }

    pub fn projection_parameter(&self, name: &str) -> Option<f64> {
        self.projected().and_then(|proj| proj.parameter(name))
    }

    pub fn linear_unit(&self) -> Option<&Unit> {
        self.projected().map(|proj| &proj.linear_unit)
    }

    /// Authority of the outermost CRS node.
    pub fn authority(&self) -> Option<&Authority> {
        match &self.definition {
            Definition::Geographic(geog) => geog.authority.as_ref(),
            Definition::Projected(proj) => proj.authority.as_ref(),
        }
    }

    /// EPSG code of the outermost CRS node, if it carries one.
    pub fn authority_code(&self) -> Option<u32> {
        self.authority()
            .filter(|auth| auth.name.eq_ignore_ascii_case("EPSG"))
            .and_then(|auth| auth.code.parse().ok())
    }
}

impl PartialEq for ReferenceFrame {
    fn eq(&self, other: &Self) -> bool {
        self.wkt == other.wkt
    }
}

impl Eq for ReferenceFrame {}

impl fmt::Display for ReferenceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.wkt)
    }
}

impl FromStr for ReferenceFrame {
    type Err = CrsError;

    /// Accepts `EPSG:<code>`, PROJ4 strings and WKT.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if let Some(code) = text
            .strip_prefix("EPSG:")
            .or_else(|| text.strip_prefix("epsg:"))
        {
            let code = code
                .parse()
                .map_err(|_| CrsError::invalid(format!("invalid EPSG code '{}'", code)))?;
            Self::from_epsg(code)
        } else if text.starts_with('+') || text.starts_with("proj=") {
            Self::from_proj4(text)
        } else {
            Self::from_wkt(text)
        }
    }
}
