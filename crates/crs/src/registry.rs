//! EPSG lookups and the short-name table.
//!
//! Codes resolve through the `crs-definitions` database. Its WKT is read
//! first; definitions our WKT reader cannot take fall back to the PROJ4 form.

use tracing::debug;

use crate::error::{CrsError, CrsResult};
use crate::frame::{Authority, Datum, Definition, GeographicCrs, PrimeMeridian, Spheroid, Unit};
use crate::{proj4, wkt};

/// Short names accepted by [`crate::ReferenceFrame::from_name`].
pub static EPSG_CODES: &[(&str, u32)] = &[
    ("wgs84", 4326),
    ("utm29n", 32629),
    ("utm30n", 32630),
    ("utm31n", 32631),
    ("utm32n", 32632),
    ("utm33n", 32633),
    ("utm34n", 32634),
    ("utm35n", 32635),
    ("utm36n", 32636),
    ("etrs89", 4258),
    ("etrs89_utm29n", 25829),
    ("etrs89_utm30n", 25830),
    ("etrs89_utm31n", 25831),
    ("etrs89_utm32n", 25832),
    ("etrs89_utm33n", 25833),
    ("etrs89_utm34n", 25834),
    ("etrs89_utm35n", 25835),
    ("etrs89_utm36n", 25836),
];

pub fn epsg_code(name: &str) -> Option<u32> {
    EPSG_CODES
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, code)| *code)
}

/// Whether `code` is in the EPSG database.
pub fn is_known_code(code: u32) -> bool {
    database_entry(code).is_some()
}

/// WKT and PROJ4 text of a database entry.
fn database_entry(code: u32) -> Option<(&'static str, &'static str)> {
    u16::try_from(code)
        .ok()
        .and_then(crs_definitions::from_code)
        .map(|def| (def.wkt, def.proj4))
}

pub(crate) fn lookup(code: u32) -> CrsResult<Definition> {
    let (wkt_text, proj4_text) = database_entry(code)
        .ok_or_else(|| CrsError::invalid(format!("EPSG:{} is not in the crs-definitions database", code)))?;

    let mut definition = match wkt::parse(wkt_text) {
        Ok(definition) => definition,
        Err(e) => {
            debug!(code, error = %e, "Reading EPSG definition from its PROJ4 form");
            proj4::parse(proj4_text)?
        }
    };

    let authority = match &mut definition {
        Definition::Geographic(geog) => &mut geog.authority,
        Definition::Projected(proj) => &mut proj.authority,
    };
    if authority.is_none() {
        *authority = Some(Authority::epsg(code));
    }
    Ok(definition)
}

pub(crate) fn wgs84_spheroid() -> Spheroid {
    Spheroid {
        name: "WGS 84".to_string(),
        semi_major: 6378137.0,
        inverse_flattening: 298.257223563,
        authority: Some(Authority::epsg(7030)),
    }
}

pub(crate) fn grs80_spheroid() -> Spheroid {
    Spheroid {
        name: "GRS 1980".to_string(),
        semi_major: 6378137.0,
        inverse_flattening: 298.257222101,
        authority: Some(Authority::epsg(7019)),
    }
}

/// Ellipsoid implied by a datum name when a WKT `DATUM` omits its `SPHEROID`.
pub(crate) fn spheroid_for_datum(datum: &str) -> Spheroid {
    match datum {
        "European_Terrestrial_Reference_System_1989" | "ETRS89" | "North_American_Datum_1983" => {
            grs80_spheroid()
        }
        "European_Datum_1950" => Spheroid {
            name: "International 1924".to_string(),
            semi_major: 6378388.0,
            inverse_flattening: 297.0,
            authority: Some(Authority::epsg(7022)),
        },
        _ => wgs84_spheroid(),
    }
}

/// Geographic frame of the ocean model grids and local frames.
pub(crate) fn etrs89() -> GeographicCrs {
    GeographicCrs {
        name: "ETRS89".to_string(),
        datum: Datum {
            name: "European_Terrestrial_Reference_System_1989".to_string(),
            spheroid: grs80_spheroid(),
            towgs84: Some([0.0; 7]),
            authority: Some(Authority::epsg(6258)),
        },
        prime_meridian: PrimeMeridian::greenwich(),
        angular_unit: Unit::degree(),
        authority: Some(Authority::epsg(4258)),
    }
}

/// Transverse Mercator parameters in WKT declaration order.
pub(crate) fn tm_parameters(
    latitude_of_origin: f64,
    central_meridian: f64,
    scale_factor: f64,
    false_easting: f64,
    false_northing: f64,
) -> Vec<(String, f64)> {
    vec![
        ("latitude_of_origin".to_string(), latitude_of_origin),
        ("central_meridian".to_string(), central_meridian),
        ("scale_factor".to_string(), scale_factor),
        ("false_easting".to_string(), false_easting),
        ("false_northing".to_string(), false_northing),
    ]
}

pub(crate) fn utm_central_meridian(zone: u32) -> f64 {
    -183.0 + 6.0 * zone as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_codes_resolve() {
        assert_eq!(epsg_code("wgs84"), Some(4326));
        assert_eq!(epsg_code("UTM33N"), Some(32633));
        assert_eq!(epsg_code("etrs89_utm31n"), Some(25831));
        assert_eq!(epsg_code("utm37n"), None);
    }

    #[test]
    fn test_every_named_code_is_known() {
        for (name, code) in EPSG_CODES {
            assert!(is_known_code(*code), "{} ({}) is not in the database", name, code);
        }
    }

    #[test]
    fn test_lookup_reads_database_entries() {
        for code in [3857, 4230, 23032, 32661, 32760, 25838] {
            let definition = lookup(code).unwrap();
            let authority = match &definition {
                Definition::Geographic(geog) => geog.authority.clone(),
                Definition::Projected(proj) => proj.authority.clone(),
            };
            assert_eq!(authority, Some(Authority::epsg(code)), "EPSG:{}", code);
        }
    }

    #[test]
    fn test_lookup_rejects_unknown_codes() {
        for code in [0, 1, 99999, 900913] {
            assert!(
                matches!(lookup(code), Err(CrsError::InvalidDefinition(_))),
                "EPSG:{} should be unknown",
                code
            );
        }
    }

    #[test]
    fn test_utm_central_meridians() {
        assert_eq!(utm_central_meridian(31), 3.0);
        assert_eq!(utm_central_meridian(33), 15.0);
        assert_eq!(utm_central_meridian(1), -177.0);
    }
}
