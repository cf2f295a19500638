//! Reference ellipsoids.

/// A reference ellipsoid given by its semi-major axis and inverse flattening.
///
/// An inverse flattening of zero denotes a sphere, following the WKT
/// convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    /// Semi-major axis (meters)
    pub a: f64,
    /// Inverse flattening, 0 for a sphere
    pub inv_f: f64,
}

impl Ellipsoid {
    pub const WGS84: Ellipsoid = Ellipsoid::new(6378137.0, 298.257223563);
    pub const GRS80: Ellipsoid = Ellipsoid::new(6378137.0, 298.257222101);
    pub const INTERNATIONAL_1924: Ellipsoid = Ellipsoid::new(6378388.0, 297.0);
    pub const BESSEL_1841: Ellipsoid = Ellipsoid::new(6377397.155, 299.1528128);
    pub const CLARKE_1866: Ellipsoid = Ellipsoid::new(6378206.4, 294.978698213898);

    pub const fn new(a: f64, inv_f: f64) -> Self {
        Self { a, inv_f }
    }

    pub const fn sphere(radius: f64) -> Self {
        Self { a: radius, inv_f: 0.0 }
    }

    /// Build an ellipsoid from its semi-major and semi-minor axes.
    pub fn from_axes(a: f64, b: f64) -> Self {
        if (a - b).abs() < f64::EPSILON * a {
            Self::sphere(a)
        } else {
            Self::new(a, a / (a - b))
        }
    }

    pub fn flattening(&self) -> f64 {
        if self.inv_f == 0.0 {
            0.0
        } else {
            1.0 / self.inv_f
        }
    }

    pub fn semi_minor(&self) -> f64 {
        self.a * (1.0 - self.flattening())
    }

    /// First eccentricity squared.
    pub fn es(&self) -> f64 {
        let f = self.flattening();
        f * (2.0 - f)
    }

    /// First eccentricity.
    pub fn e(&self) -> f64 {
        self.es().sqrt()
    }

    /// Third flattening, n = f / (2 - f).
    pub fn third_flattening(&self) -> f64 {
        let f = self.flattening();
        f / (2.0 - f)
    }

    /// True when both ellipsoids are the same to within the precision
    /// datum definitions are usually published with.
    ///
    /// GRS 1980 and WGS 84 compare equal under this test.
    pub fn is_equivalent(&self, other: &Ellipsoid) -> bool {
        self.a == other.a && (self.es() - other.es()).abs() < 5.0e-11
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wgs84_semi_minor() {
        let b = Ellipsoid::WGS84.semi_minor();
        assert!((b - 6356752.314245).abs() < 1e-5, "unexpected semi-minor axis {}", b);
    }

    #[test]
    fn test_from_axes_roundtrip() {
        let ell = Ellipsoid::from_axes(6378137.0, Ellipsoid::GRS80.semi_minor());
        assert!((ell.inv_f - 298.257222101).abs() < 1e-6);
    }

    #[test]
    fn test_sphere_has_zero_eccentricity() {
        let sphere = Ellipsoid::sphere(6371000.0);
        assert_eq!(sphere.flattening(), 0.0);
        assert_eq!(sphere.es(), 0.0);
        assert_eq!(sphere.semi_minor(), 6371000.0);
    }

    #[test]
    fn test_grs80_equivalent_to_wgs84() {
        assert!(Ellipsoid::GRS80.is_equivalent(&Ellipsoid::WGS84));
        assert!(!Ellipsoid::INTERNATIONAL_1924.is_equivalent(&Ellipsoid::WGS84));
    }
}
