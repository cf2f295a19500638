//! Geodetic/geocentric conversions and the seven-parameter Helmert shift.
//!
//! Datum changes go through earth-centred cartesian coordinates:
//! geodetic on the source ellipsoid, to geocentric, shifted to WGS 84,
//! shifted back out to the target datum and finally to geodetic on the
//! target ellipsoid.

use nalgebra::{Matrix3, Vector3};

use crate::Ellipsoid;

const ARC_SECONDS_TO_RADIANS: f64 = std::f64::consts::PI / (180.0 * 3600.0);

/// Convert geodetic coordinates (radians, meters) to geocentric cartesian.
pub fn geodetic_to_geocentric(ellipsoid: &Ellipsoid, lon: f64, lat: f64, h: f64) -> Vector3<f64> {
    let es = ellipsoid.es();
    let (sin_lat, cos_lat) = lat.sin_cos();
    let n = ellipsoid.a / (1.0 - es * sin_lat * sin_lat).sqrt();

    Vector3::new(
        (n + h) * cos_lat * lon.cos(),
        (n + h) * cos_lat * lon.sin(),
        (n * (1.0 - es) + h) * sin_lat,
    )
}

/// Convert geocentric cartesian coordinates to geodetic (lon, lat, h).
///
/// Uses fixed-point iteration on the latitude, which converges to well
/// below a micrometre in a handful of steps for terrestrial points.
pub fn geocentric_to_geodetic(ellipsoid: &Ellipsoid, p: &Vector3<f64>) -> (f64, f64, f64) {
    let es = ellipsoid.es();
    let a = ellipsoid.a;
    let rho = (p.x * p.x + p.y * p.y).sqrt();
    let lon = p.y.atan2(p.x);

    // On the polar axis the iteration below is ill-conditioned
    if rho < 1e-9 * a {
        let lat = if p.z >= 0.0 {
            std::f64::consts::FRAC_PI_2
        } else {
            -std::f64::consts::FRAC_PI_2
        };
        let h = p.z.abs() - ellipsoid.semi_minor();
        return (lon, lat, h);
    }

    let mut lat = p.z.atan2(rho * (1.0 - es));
    let mut h = 0.0;
    for _ in 0..16 {
        let sin_lat = lat.sin();
        let n = a / (1.0 - es * sin_lat * sin_lat).sqrt();
        h = rho / lat.cos() - n;
        let next = p.z.atan2(rho * (1.0 - es * n / (n + h)));
        let converged = (next - lat).abs() < 1e-14;
        lat = next;
        if converged {
            break;
        }
    }

    (lon, lat, h)
}

/// Seven-parameter Helmert transformation to WGS 84.
///
/// Parameters follow the `TOWGS84` convention: translations in metres,
/// rotations in arc-seconds (position vector convention) and scale
/// difference in parts per million.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Helmert {
    translation: Vector3<f64>,
    rotation: Matrix3<f64>,
    scale: f64,
}

impl Helmert {
    /// Build from the seven `TOWGS84` values.
    pub fn from_towgs84(params: &[f64; 7]) -> Self {
        let [dx, dy, dz, rx, ry, rz, ds] = *params;
        let (rx, ry, rz) = (
            rx * ARC_SECONDS_TO_RADIANS,
            ry * ARC_SECONDS_TO_RADIANS,
            rz * ARC_SECONDS_TO_RADIANS,
        );

        Self {
            translation: Vector3::new(dx, dy, dz),
            rotation: Matrix3::new(
                1.0, -rz, ry, //
                rz, 1.0, -rx, //
                -ry, rx, 1.0,
            ),
            scale: 1.0 + ds * 1e-6,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.translation == Vector3::zeros() && self.rotation == Matrix3::identity() && self.scale == 1.0
    }

    /// Shift a geocentric position from the local datum to WGS 84.
    pub fn to_wgs84(&self, p: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * p * self.scale + self.translation
    }

    /// Shift a geocentric position from WGS 84 to the local datum.
    ///
    /// Uses the transposed rotation, which is the exact inverse to first
    /// order in the (small) rotation angles.
    pub fn wgs84_to_local(&self, p: &Vector3<f64>) -> Vector3<f64> {
        self.rotation.transpose() * ((p - self.translation) / self.scale)
    }
}
