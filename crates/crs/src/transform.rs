//! Coordinate transforms between reference frames.
//!
//! A transform runs every point through the same pipeline: inverse
//! projection of the source frame (or unit conversion for geographic
//! frames), an optional datum shift through geocentric coordinates and
//! WGS 84, then the forward projection of the target frame. Points outside
//! the domain of a projection come out as NaN.

use std::f64::consts::PI;

use nalgebra::Vector3;
use ndarray::{Array, Array2, ArrayBase, Data, Dimension};
use projection::{
    geocentric_to_geodetic, geodetic_to_geocentric, Ellipsoid, Helmert, PolarStereographic,
    TransverseMercator,
};
use tracing::debug;

use crate::error::{CrsError, CrsResult};
use crate::frame::{GeographicCrs, ProjectedCrs, ProjectionMethod, ReferenceFrame, Unit};

#[derive(Debug, Clone)]
enum Projector {
    Geographic,
    TransverseMercator(TransverseMercator),
    PolarStereographic(PolarStereographic),
}

/// One side of a transform: how to get between frame coordinates and
/// Greenwich-referenced geodetic radians.
#[derive(Debug, Clone)]
struct Endpoint {
    projector: Projector,
    /// Angular unit for geographic frames
    angular_unit: Unit,
    /// Metres per frame unit for projected frames
    linear_factor: f64,
    /// Prime meridian offset (radians)
    prime_meridian: f64,
    ellipsoid: Ellipsoid,
    /// Effective shift to WGS 84, `None` when the datum is unknown
    towgs84: Option<[f64; 7]>,
}

impl Endpoint {
    fn new(frame: &ReferenceFrame) -> CrsResult<Self> {
        let geog = frame.geographic();
        let ellipsoid = geog.datum.spheroid.ellipsoid();
        let (projector, linear_factor) = match frame.projected() {
            None => (Projector::Geographic, 1.0),
            Some(proj) => (projector(proj, &ellipsoid)?, proj.linear_unit.factor),
        };

        Ok(Self {
            projector,
            angular_unit: geog.angular_unit.clone(),
            linear_factor,
            prime_meridian: geog.angular_unit.angle_to_radians(geog.prime_meridian.longitude),
            ellipsoid,
            towgs84: effective_towgs84(geog),
        })
    }

    /// Frame coordinates to Greenwich longitude/latitude in radians.
    fn to_geodetic(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let (lon, lat) = match &self.projector {
            Projector::Geographic => (
                self.angular_unit.angle_to_radians(x),
                self.angular_unit.angle_to_radians(y),
            ),
            Projector::TransverseMercator(tm) => {
                tm.inverse(x * self.linear_factor, y * self.linear_factor)?
            }
            Projector::PolarStereographic(ps) => {
                ps.inverse(x * self.linear_factor, y * self.linear_factor)?
            }
        };
        Some((lon + self.prime_meridian, lat))
    }

    /// Greenwich longitude/latitude in radians to frame coordinates.
    fn from_geodetic(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        let lon = lon - self.prime_meridian;
        match &self.projector {
            Projector::Geographic => Some((
                self.angular_unit.radians_to_angle(wrap_longitude(lon)),
                self.angular_unit.radians_to_angle(lat),
            )),
            Projector::TransverseMercator(tm) => {
                let (x, y) = tm.forward(lon, lat)?;
                Some((x / self.linear_factor, y / self.linear_factor))
            }
            Projector::PolarStereographic(ps) => {
                let (x, y) = ps.forward(lon, lat)?;
                Some((x / self.linear_factor, y / self.linear_factor))
            }
        }
    }
}

fn projector(proj: &ProjectedCrs, ellipsoid: &Ellipsoid) -> CrsResult<Projector> {
    let factor = proj.linear_unit.factor;
    let lat0 = proj.parameter_or("latitude_of_origin", 0.0);
    let lon0 = proj.parameter_or("central_meridian", 0.0);
    let k0 = proj.parameter_or("scale_factor", 1.0);
    let false_easting = proj.parameter_or("false_easting", 0.0) * factor;
    let false_northing = proj.parameter_or("false_northing", 0.0) * factor;

    match &proj.method {
        ProjectionMethod::TransverseMercator => Ok(Projector::TransverseMercator(
            TransverseMercator::new(ellipsoid, lon0, lat0, k0, false_easting, false_northing),
        )),
        ProjectionMethod::PolarStereographic => {
            if lat0 == 0.0 {
                return Err(CrsError::UnsupportedProjection(
                    "Polar_Stereographic with latitude_of_origin 0".to_string(),
                ));
            }
            Ok(Projector::PolarStereographic(PolarStereographic::new(
                ellipsoid,
                lat0,
                lon0,
                k0,
                false_easting,
                false_northing,
            )))
        }
        ProjectionMethod::Other(name) => Err(CrsError::UnsupportedProjection(name.clone())),
    }
}

/// Datums without published shift parameters are taken to coincide with
/// WGS 84 when they sit on a WGS 84-equivalent ellipsoid.
fn effective_towgs84(geog: &GeographicCrs) -> Option<[f64; 7]> {
    geog.datum.towgs84.or_else(|| {
        geog.datum
            .spheroid
            .ellipsoid()
            .is_equivalent(&Ellipsoid::WGS84)
            .then_some([0.0; 7])
    })
}

fn wrap_longitude(lon: f64) -> f64 {
    if (-PI..=PI).contains(&lon) {
        lon
    } else {
        (lon + PI).rem_euclid(2.0 * PI) - PI
    }
}

#[derive(Debug, Clone)]
struct DatumShift {
    source: Helmert,
    target: Helmert,
}

/// A prepared transform between two reference frames.
#[derive(Debug, Clone)]
pub struct Transformer {
    source: Endpoint,
    target: Endpoint,
    shift: Option<DatumShift>,
    identity: bool,
}

impl Transformer {
    pub fn new(from: &ReferenceFrame, to: &ReferenceFrame) -> CrsResult<Self> {
        let source = Endpoint::new(from)?;
        let target = Endpoint::new(to)?;

        let shift = match (source.towgs84, target.towgs84) {
            (Some(src), Some(dst))
                if !(src == dst && source.ellipsoid.is_equivalent(&target.ellipsoid)) =>
            {
                Some(DatumShift {
                    source: Helmert::from_towgs84(&src),
                    target: Helmert::from_towgs84(&dst),
                })
            }
            _ => None,
        };

        Ok(Self {
            source,
            target,
            shift,
            identity: from == to,
        })
    }

    /// Transform a single point. Returns NaN coordinates when the point
    /// falls outside either projection.
    pub fn transform_point(&self, x: f64, y: f64, z: f64) -> (f64, f64, f64) {
        if self.identity {
            return (x, y, z);
        }
        self.try_transform_point(x, y, z)
            .unwrap_or((f64::NAN, f64::NAN, f64::NAN))
    }

    fn try_transform_point(&self, x: f64, y: f64, z: f64) -> Option<(f64, f64, f64)> {
        let (mut lon, mut lat) = self.source.to_geodetic(x, y)?;
        let mut h = z;

        if let Some(shift) = &self.shift {
            let p = geodetic_to_geocentric(&self.source.ellipsoid, lon, lat, h);
            let p: Vector3<f64> = shift.target.wgs84_to_local(&shift.source.to_wgs84(&p));
            (lon, lat, h) = geocentric_to_geodetic(&self.target.ellipsoid, &p);
        }

        let (x, y) = self.target.from_geodetic(lon, lat)?;
        Some((x, y, h))
    }

    /// Transform an `(n, 3)` array of points.
    pub fn transform_points(&self, points: &Array2<f64>) -> Array2<f64> {
        let mut out = points.clone();
        for mut row in out.rows_mut() {
            let (x, y, z) = self.transform_point(row[0], row[1], row[2]);
            row[0] = x;
            row[1] = y;
            row[2] = z;
        }
        out
    }
}

/// Transform coordinate arrays of any shape from one frame to another.
///
/// `x` and `y` must have the same shape, which the outputs keep. Empty
/// input comes straight back without building a transform.
pub fn transform<S, D>(
    x: &ArrayBase<S, D>,
    y: &ArrayBase<S, D>,
    from: &ReferenceFrame,
    to: &ReferenceFrame,
) -> CrsResult<(Array<f64, D>, Array<f64, D>)>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    if x.shape() != y.shape() {
        return Err(CrsError::ShapeMismatch {
            x: x.shape().to_vec(),
            y: y.shape().to_vec(),
        });
    }
    if x.is_empty() && y.is_empty() {
        return Ok((x.to_owned(), y.to_owned()));
    }
    if from == to {
        return Ok((x.to_owned(), y.to_owned()));
    }

    let transformer = Transformer::new(from, to)?;
    let n = x.len();
    debug!(points = n, shape = ?x.shape(), "Transforming coordinates");

    let mut points = Array2::<f64>::zeros((n, 3));
    for (mut row, (&xv, &yv)) in points.rows_mut().into_iter().zip(x.iter().zip(y.iter())) {
        row[0] = xv;
        row[1] = yv;
    }
    let points = transformer.transform_points(&points);

    let reshape = |column: usize| {
        Array::from_shape_vec(x.raw_dim(), points.column(column).to_vec()).map_err(|_| {
            CrsError::ShapeMismatch {
                x: x.shape().to_vec(),
                y: vec![n],
            }
        })
    };
    Ok((reshape(0)?, reshape(1)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr0, arr1, arr2, Array1};

    fn wgs84() -> ReferenceFrame {
        ReferenceFrame::from_epsg(4326).unwrap()
    }

    #[test]
    fn test_shape_mismatch() {
        let result = transform(&arr1(&[1.0, 2.0]), &arr1(&[1.0]), &wgs84(), &wgs84());
        assert!(matches!(result, Err(CrsError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_empty_input_keeps_shape() {
        let x = Array2::<f64>::zeros((0, 3));
        let (tx, ty) = transform(&x, &x, &wgs84(), &ReferenceFrame::nk800(false)).unwrap();
        assert_eq!(tx.shape(), &[0, 3]);
        assert_eq!(ty.shape(), &[0, 3]);
    }

    #[test]
    fn test_scalar_input() {
        let (x, y) = transform(&arr0(5.0), &arr0(60.0), &wgs84(), &ReferenceFrame::local(5.0, 60.0)).unwrap();
        assert_eq!(x.ndim(), 0);
        assert!(x.into_scalar().abs() < 1e-8);
        assert!(y.into_scalar().abs() < 1e-8);
    }

    #[test]
    fn test_local_frame_offsets() {
        let local = ReferenceFrame::local(5.0, 60.0);
        let lon = arr1(&[5.0, 5.0, 5.0 + 1.0 / 60.0]);
        let lat = arr1(&[60.0, 60.0 + 1.0 / 60.0, 60.0]);
        let (x, y) = transform(&lon, &lat, &wgs84(), &local).unwrap();

        assert!(x[0].abs() + y[0].abs() < 1e-8);
        assert!(x[1].abs() < 1e-6 && (y[1] - 1856.87).abs() < 0.01, "north: ({}, {})", x[1], y[1]);
        assert!((x[2] - 930.0).abs() < 0.1 && (y[2] - 0.117).abs() < 0.01, "east: ({}, {})", x[2], y[2]);
    }

    #[test]
    fn test_cells_to_metres() {
        let cells = ReferenceFrame::nk800(false);
        let metres = ReferenceFrame::nk800(true);
        let (x, y) = transform(&arr1(&[0.0, 1.0, 2.0]), &arr1(&[0.0, 0.0, 1.0]), &cells, &metres).unwrap();

        let expected_x = arr1(&[0.0, 800.0, 1600.0]);
        let expected_y = arr1(&[0.0, 0.0, 800.0]);
        for i in 0..3 {
            assert!((x[i] - expected_x[i]).abs() < 1e-6, "x[{}] = {}", i, x[i]);
            assert!((y[i] - expected_y[i]).abs() < 1e-6, "y[{}] = {}", i, y[i]);
        }
    }

    #[test]
    fn test_datum_shift_moves_points() {
        let ed50 = ReferenceFrame::from_proj4("+proj=longlat +ellps=intl +towgs84=-87,-98,-121").unwrap();
        let (lon, lat) = transform(&arr1(&[5.0]), &arr1(&[60.0]), &ed50, &wgs84()).unwrap();

        // ED50 to WGS 84 moves points in western Norway by roughly 100 m
        assert!((lon[0] - 5.0).abs() > 1e-4 && (lon[0] - 5.0).abs() < 1e-2, "lon {}", lon[0]);
        assert!((lat[0] - 60.0).abs() > 1e-4 && (lat[0] - 60.0).abs() < 1e-2, "lat {}", lat[0]);

        let (lon2, lat2) = transform(&lon, &lat, &wgs84(), &ed50).unwrap();
        assert!((lon2[0] - 5.0).abs() < 1e-6);
        assert!((lat2[0] - 60.0).abs() < 1e-6);
    }

    #[test]
    fn test_grs80_datums_are_not_shifted() {
        let transformer = Transformer::new(&wgs84(), &ReferenceFrame::from_epsg(4258).unwrap()).unwrap();
        assert!(transformer.shift.is_none());
        let (x, y, _) = transformer.transform_point(5.0, 60.0, 0.0);
        assert!((x - 5.0).abs() < 1e-12 && (y - 60.0).abs() < 1e-12);
    }

    #[test]
    fn test_unsupported_projection() {
        let wkt = ReferenceFrame::from_epsg(32633)
            .unwrap()
            .wkt()
            .replace("Transverse_Mercator", "Mercator_1SP");
        let mercator = ReferenceFrame::from_wkt(&wkt).unwrap();
        let result = transform(&arr1(&[5.0]), &arr1(&[60.0]), &wgs84(), &mercator);
        assert!(matches!(result, Err(CrsError::UnsupportedProjection(_))));
    }

    #[test]
    fn test_out_of_domain_is_nan() {
        let utm = ReferenceFrame::from_epsg(32633).unwrap();
        let (x, y) = transform(&arr1(&[105.0]), &arr1(&[0.0]), &wgs84(), &utm).unwrap();
        assert!(x[0].is_nan() && y[0].is_nan());
    }

    #[test]
    fn test_transform_points_array() {
        let transformer = Transformer::new(&ReferenceFrame::nk800(false), &wgs84()).unwrap();
        let points = arr2(&[[0.0, 0.0, 0.0], [1000.0, 500.0, 0.0]]);
        let out = transformer.transform_points(&points);
        assert_eq!(out.shape(), &[2, 3]);
        assert!((out[[0, 0]] - 9.19459011).abs() < 1e-6);
        assert!((out[[1, 1]] - 63.91826663).abs() < 1e-6);
    }

    #[test]
    fn test_wrap_longitude() {
        let wrapped: Array1<f64> = arr1(&[190.0, -190.0, 180.0, 45.0]).mapv(|v: f64| wrap_longitude(v.to_radians()).to_degrees());
        assert!((wrapped[0] + 170.0).abs() < 1e-9);
        assert!((wrapped[1] - 170.0).abs() < 1e-9);
        assert!((wrapped[2] - 180.0).abs() < 1e-9);
        assert!((wrapped[3] - 45.0).abs() < 1e-9);
    }
}
