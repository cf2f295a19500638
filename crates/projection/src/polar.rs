//! Polar stereographic projection on the ellipsoid.
//!
//! The Norwegian coastal ocean models (NorKyst800, NorFjords160) run on
//! polar stereographic grids with true scale at 60°N and a central
//! meridian of 70°E.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::Ellipsoid;

/// Polar stereographic projection (variant B when a standard parallel is
/// given, variant A with a scale factor at the pole otherwise).
#[derive(Debug, Clone)]
pub struct PolarStereographic {
    /// True for the north polar aspect
    pub north: bool,
    /// Central meridian (radians)
    pub lon0: f64,
    /// False easting (meters)
    pub false_easting: f64,
    /// False northing (meters)
    pub false_northing: f64,
    e: f64,
    /// Radius scale: rho = akm1 * t
    akm1: f64,
}

impl PolarStereographic {
    /// Create a projection. Angles are given in degrees.
    ///
    /// The aspect is taken from the sign of `lat_ts`. When `lat_ts` is at
    /// the pole, `k0` is the scale factor there; otherwise `k0` is ignored
    /// and the scale is true along `lat_ts`.
    pub fn new(
        ellipsoid: &Ellipsoid,
        lat_ts_deg: f64,
        lon0_deg: f64,
        k0: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let north = lat_ts_deg >= 0.0;
        let e = ellipsoid.e();
        let phits = lat_ts_deg.abs().to_radians();

        let akm1 = if (phits - FRAC_PI_2).abs() < 1e-10 {
            2.0 * ellipsoid.a * k0 / ((1.0 + e).powf(1.0 + e) * (1.0 - e).powf(1.0 - e)).sqrt()
        } else {
            let sin_ts = phits.sin();
            let mc = phits.cos() / (1.0 - e * e * sin_ts * sin_ts).sqrt();
            ellipsoid.a * mc / tsfn(phits, e)
        };

        Self {
            north,
            lon0: lon0_deg.to_radians(),
            false_easting,
            false_northing,
            e,
            akm1,
        }
    }

    /// Project geodetic coordinates (radians) to easting/northing (meters).
    ///
    /// Returns `None` for the opposite pole.
    pub fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        let lat = if self.north { lat } else { -lat };
        if lat <= -FRAC_PI_2 + 1e-12 {
            return None;
        }

        let rho = self.akm1 * tsfn(lat, self.e);
        let dlon = lon - self.lon0;
        let x = rho * dlon.sin();
        let y = rho * dlon.cos();

        if self.north {
            Some((self.false_easting + x, self.false_northing - y))
        } else {
            Some((self.false_easting + x, self.false_northing + y))
        }
    }

    /// Inverse projection from easting/northing (meters) to radians.
    pub fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let dx = x - self.false_easting;
        let dy = y - self.false_northing;
        let rho = dx.hypot(dy);
        if !rho.is_finite() {
            return None;
        }

        let t = rho / self.akm1;
        let half_e = self.e / 2.0;
        let mut lat = FRAC_PI_2 - 2.0 * t.atan();
        for _ in 0..20 {
            let es = self.e * lat.sin();
            let next = FRAC_PI_2 - 2.0 * (t * ((1.0 - es) / (1.0 + es)).powf(half_e)).atan();
            let converged = (next - lat).abs() < 1e-15;
            lat = next;
            if converged {
                break;
            }
        }

        let dlon = if rho == 0.0 {
            0.0
        } else if self.north {
            dx.atan2(-dy)
        } else {
            dx.atan2(dy)
        };

        if self.north {
            Some((self.lon0 + dlon, lat))
        } else {
            Some((self.lon0 + dlon, -lat))
        }
    }
}

/// Isometric colatitude function t(phi) used by conformal projections.
fn tsfn(phi: f64, e: f64) -> f64 {
    let es = e * phi.sin();
    (FRAC_PI_4 - phi / 2.0).tan() / ((1.0 - es) / (1.0 + es)).powf(e / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CELL: f64 = 800.0;

    fn norkyst() -> PolarStereographic {
        PolarStereographic::new(&Ellipsoid::GRS80, 60.0, 70.0, 1.0, 3991.0 * CELL, 2230.0 * CELL)
    }

    #[test]
    fn test_norkyst_corner_cells() {
        let proj = norkyst();
        let cases = [
            ((0.0, 0.0), (9.19459011, 55.90836993)),
            ((1000.0, 0.0), (16.70710853, 61.91497602)),
            ((1000.0, 500.0), (10.04516874, 63.91826663)),
            ((0.0, 500.0), (3.43554155, 57.47693917)),
        ];

        for ((i, j), (lon, lat)) in cases {
            let (lon2, lat2) = proj.inverse(i * CELL, j * CELL).unwrap();
            assert!((lon2.to_degrees() - lon).abs() < 1e-6, "cell ({}, {}) lon {} vs {}", i, j, lon, lon2.to_degrees());
            assert!((lat2.to_degrees() - lat).abs() < 1e-6, "cell ({}, {}) lat {} vs {}", i, j, lat, lat2.to_degrees());
        }
    }

    #[test]
    fn test_forward_inverse_roundtrip() {
        let proj = norkyst();
        for (lon, lat) in [(5.0, 60.0), (15.0, 68.5), (-10.0, 50.0), (30.0, 80.0)] {
            let (x, y) = proj.forward(f64::to_radians(lon), f64::to_radians(lat)).unwrap();
            let (lon2, lat2) = proj.inverse(x, y).unwrap();
            assert!((lon2.to_degrees() - lon).abs() < 1e-9, "lon roundtrip: {} vs {}", lon, lon2.to_degrees());
            assert!((lat2.to_degrees() - lat).abs() < 1e-9, "lat roundtrip: {} vs {}", lat, lat2.to_degrees());
        }
    }

    #[test]
    fn test_pole_maps_to_false_origin() {
        let proj = norkyst();
        let (x, y) = proj.forward(0.0, FRAC_PI_2).unwrap();
        assert!((x - 3991.0 * CELL).abs() < 1e-6);
        assert!((y - 2230.0 * CELL).abs() < 1e-6);

        let (lon, lat) = proj.inverse(3991.0 * CELL, 2230.0 * CELL).unwrap();
        assert!((lat - FRAC_PI_2).abs() < 1e-12);
        assert!((lon - 70f64.to_radians()).abs() < 1e-12);
    }

    #[test]
    fn test_south_aspect_roundtrip() {
        let proj = PolarStereographic::new(&Ellipsoid::WGS84, -71.0, 0.0, 1.0, 0.0, 0.0);
        assert!(!proj.north);

        let (x, y) = proj.forward(f64::to_radians(45.0), f64::to_radians(-75.0)).unwrap();
        assert!(x > 0.0 && y > 0.0, "45E in the south aspect should be up and right: ({}, {})", x, y);

        let (lon, lat) = proj.inverse(x, y).unwrap();
        assert!((lon.to_degrees() - 45.0).abs() < 1e-9);
        assert!((lat.to_degrees() + 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_opposite_pole_is_undefined() {
        assert!(norkyst().forward(0.0, -FRAC_PI_2).is_none());
    }
}
