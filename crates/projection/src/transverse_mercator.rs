//! Transverse Mercator projection.
//!
//! Uses the Krüger series in the third flattening (Poder/Engsager form),
//! accurate to well below a millimetre within a few thousand kilometres of
//! the central meridian. This covers UTM and ETRS89-TM zones as well as the
//! small local frames centred on individual fish farms.

use std::f64::consts::FRAC_PI_4;

use crate::Ellipsoid;

/// Transverse Mercator projection parameters.
#[derive(Debug, Clone)]
pub struct TransverseMercator {
    /// Central meridian in radians
    pub lon0: f64,
    /// Latitude of origin in radians
    pub lat0: f64,
    /// Scale factor on the central meridian
    pub k0: f64,
    /// False easting (meters)
    pub false_easting: f64,
    /// False northing (meters)
    pub false_northing: f64,
    e: f64,
    /// Rectifying radius times the scale factor
    k_a: f64,
    alpha: [f64; 4],
    beta: [f64; 4],
    /// Northing of the latitude of origin on the central meridian
    y0: f64,
}

impl TransverseMercator {
    /// Create a projection. Angles are given in degrees.
    pub fn new(
        ellipsoid: &Ellipsoid,
        lon0_deg: f64,
        lat0_deg: f64,
        k0: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let n = ellipsoid.third_flattening();
        let n2 = n * n;
        let n3 = n2 * n;
        let n4 = n3 * n;

        let rectifying = ellipsoid.a / (1.0 + n) * (1.0 + n2 / 4.0 + n4 / 64.0);
        let alpha = [
            n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0 + 41.0 * n4 / 180.0,
            13.0 * n2 / 48.0 - 3.0 * n3 / 5.0 + 557.0 * n4 / 1440.0,
            61.0 * n3 / 240.0 - 103.0 * n4 / 140.0,
            49561.0 * n4 / 161280.0,
        ];
        let beta = [
            n / 2.0 - 2.0 * n2 / 3.0 + 37.0 * n3 / 96.0 - n4 / 360.0,
            n2 / 48.0 + n3 / 15.0 - 437.0 * n4 / 1440.0,
            17.0 * n3 / 480.0 - 37.0 * n4 / 840.0,
            4397.0 * n4 / 161280.0,
        ];

        let mut proj = Self {
            lon0: lon0_deg.to_radians(),
            lat0: lat0_deg.to_radians(),
            k0,
            false_easting,
            false_northing,
            e: ellipsoid.e(),
            k_a: k0 * rectifying,
            alpha,
            beta,
            y0: 0.0,
        };
        proj.y0 = proj.gauss_kruger(0.0, proj.lat0).1;
        proj
    }

    /// Standard UTM zone (1-60) on the given ellipsoid.
    pub fn utm(ellipsoid: &Ellipsoid, zone: u8, south: bool) -> Self {
        let lon0 = -183.0 + 6.0 * f64::from(zone);
        let false_northing = if south { 10_000_000.0 } else { 0.0 };
        Self::new(ellipsoid, lon0, 0.0, 0.9996, 500_000.0, false_northing)
    }

    /// Project geodetic coordinates (radians) to easting/northing (meters).
    ///
    /// Returns `None` for points on or beyond 90 degrees from the central
    /// meridian, where the projection is undefined.
    pub fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        let (x, y) = self.gauss_kruger(lon - self.lon0, lat);
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        Some((x + self.false_easting, y - self.y0 + self.false_northing))
    }

    /// Inverse projection from easting/northing (meters) to radians.
    pub fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let xi = (y - self.false_northing + self.y0) / self.k_a;
        let eta = (x - self.false_easting) / self.k_a;

        let mut xi_p = xi;
        let mut eta_p = eta;
        for (j, b) in self.beta.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            xi_p -= b * (k * xi).sin() * (k * eta).cosh();
            eta_p -= b * (k * xi).cos() * (k * eta).sinh();
        }

        let chi = (xi_p.sin() / eta_p.cosh()).asin();
        let dlon = eta_p.sinh().atan2(xi_p.cos());
        let lat = self.geodetic_latitude(chi);

        if !lat.is_finite() || !dlon.is_finite() {
            return None;
        }
        Some((self.lon0 + dlon, lat))
    }

    /// Scaled Gauss-Krüger coordinates relative to the equator on the
    /// central meridian.
    fn gauss_kruger(&self, dlon: f64, lat: f64) -> (f64, f64) {
        let chi = self.conformal_latitude(lat);
        let xi_p = chi.tan().atan2(dlon.cos());
        let eta_p = (chi.cos() * dlon.sin()).atanh();

        let mut xi = xi_p;
        let mut eta = eta_p;
        for (j, a) in self.alpha.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            xi += a * (k * xi_p).sin() * (k * eta_p).cosh();
            eta += a * (k * xi_p).cos() * (k * eta_p).sinh();
        }

        (self.k_a * eta, self.k_a * xi)
    }

    fn conformal_latitude(&self, lat: f64) -> f64 {
        let s = lat.sin();
        (s.atanh() - self.e * (self.e * s).atanh()).sinh().atan()
    }

    fn geodetic_latitude(&self, chi: f64) -> f64 {
        let t = (FRAC_PI_4 + chi / 2.0).tan();
        let half_e = self.e / 2.0;
        let mut lat = chi;
        for _ in 0..20 {
            let es = self.e * lat.sin();
            let next = 2.0 * (t * ((1.0 + es) / (1.0 - es)).powf(half_e)).atan() - 2.0 * FRAC_PI_4;
            let converged = (next - lat).abs() < 1e-15;
            lat = next;
            if converged {
                break;
            }
        }
        lat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utm31_reference_points() {
        let proj = TransverseMercator::utm(&Ellipsoid::GRS80, 31, false);

        let (x, y) = proj.forward(4f64.to_radians(), 59f64.to_radians()).unwrap();
        assert!((x - 557450.94).abs() < 0.01, "easting: {}", x);
        assert!((y - 6540481.78).abs() < 0.01, "northing: {}", y);

        let (x, y) = proj.forward(6f64.to_radians(), 60f64.to_radians()).unwrap();
        assert!((x - 667294.82).abs() < 0.01, "easting: {}", x);
        assert!((y - 6655205.48).abs() < 0.01, "northing: {}", y);
    }

    #[test]
    fn test_central_meridian_origin() {
        let proj = TransverseMercator::new(&Ellipsoid::GRS80, 5.0, 60.0, 1.0, 0.0, 0.0);
        let (x, y) = proj.forward(5f64.to_radians(), 60f64.to_radians()).unwrap();
        assert_eq!(x, 0.0);
        assert_eq!(y, 0.0);
    }

    #[test]
    fn test_local_arcminute_distances() {
        let proj = TransverseMercator::new(&Ellipsoid::GRS80, 5.0, 60.0, 1.0, 0.0, 0.0);

        let (x, y) = proj.forward(5f64.to_radians(), (60.0 + 1.0 / 60.0f64).to_radians()).unwrap();
        assert!(x.abs() < 1e-9, "northward step should not move east: {}", x);
        assert!((y - 1856.87).abs() < 0.01, "one arcminute north: {}", y);

        let (x, _) = proj.forward((5.0 + 1.0 / 60.0f64).to_radians(), 60f64.to_radians()).unwrap();
        assert!((x - 930.0).abs() < 0.1, "one arcminute east: {}", x);
    }

    #[test]
    fn test_roundtrip() {
        let proj = TransverseMercator::utm(&Ellipsoid::WGS84, 33, false);
        for (lon, lat) in [(15.0, 60.0), (9.0, 40.0), (21.0, 71.0), (12.5, -10.0)] {
            let (x, y) = proj.forward(f64::to_radians(lon), f64::to_radians(lat)).unwrap();
            let (lon2, lat2) = proj.inverse(x, y).unwrap();
            assert!((lon2.to_degrees() - lon).abs() < 1e-9, "lon roundtrip: {} vs {}", lon, lon2.to_degrees());
            assert!((lat2.to_degrees() - lat).abs() < 1e-9, "lat roundtrip: {} vs {}", lat, lat2.to_degrees());
        }
    }

    #[test]
    fn test_south_zone_false_northing() {
        let proj = TransverseMercator::utm(&Ellipsoid::WGS84, 33, true);
        let (_, y) = proj.forward(15f64.to_radians(), (-1f64).to_radians()).unwrap();
        assert!(y < 10_000_000.0 && y > 9_800_000.0, "southern northing: {}", y);
    }

    #[test]
    fn test_antipodal_meridian_is_undefined() {
        let proj = TransverseMercator::utm(&Ellipsoid::WGS84, 33, false);
        assert!(proj.forward(105f64.to_radians(), 0.0).is_none());
    }
}
