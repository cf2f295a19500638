//! PROJ4 definition strings.
//!
//! Text is validated with `proj4rs` and then mapped onto WKT nodes.
//! Geographic, transverse Mercator, UTM and polar stereographic forms become
//! evaluable frames; any other projection is carried as
//! [`ProjectionMethod::Other`] with its parameters under their WKT names.

use std::collections::HashMap;

use proj4rs::proj::Proj;

use crate::error::{CrsError, CrsResult};
use crate::frame::{
    Datum, Definition, GeographicCrs, PrimeMeridian, ProjectedCrs, ProjectionMethod, Spheroid, Unit,
};
use crate::registry;
use crate::wkt::format_number;

fn named_spheroid(name: &str, semi_major: f64, inverse_flattening: f64) -> Spheroid {
    Spheroid {
        name: name.to_string(),
        semi_major,
        inverse_flattening,
        authority: None,
    }
}

fn ellps(name: &str) -> Option<Spheroid> {
    let (full_name, a, rf) = match name {
        "WGS84" => return Some(registry::wgs84_spheroid()),
        "GRS80" => return Some(registry::grs80_spheroid()),
        "intl" => ("International 1924", 6378388.0, 297.0),
        "bessel" => ("Bessel 1841", 6377397.155, 299.1528128),
        "clrk66" => ("Clarke 1866", 6378206.4, 294.978698213898),
        "clrk80" => ("Clarke 1880 mod.", 6378249.145, 293.4663),
        "clrk80ign" => ("Clarke 1880 (IGN)", 6378249.2, 293.4660212936269),
        "airy" => ("Airy 1830", 6377563.396, 299.3249646),
        "mod_airy" => ("Airy Modified 1849", 6377340.189, 299.3249646),
        "krass" => ("Krassovsky 1940", 6378245.0, 298.3),
        "WGS72" => ("WGS 72", 6378135.0, 298.26),
        "GRS67" => ("GRS 1967", 6378160.0, 298.247167427),
        "aust_SA" => ("Australian Natl & S. Amer. 1969", 6378160.0, 298.25),
        "helmert" => ("Helmert 1906", 6378200.0, 298.3),
        "evrst30" => ("Everest 1830", 6377276.345, 300.8017),
        "sphere" => ("Normal Sphere", 6370997.0, 0.0),
        _ => return None,
    };
    Some(named_spheroid(full_name, a, rf))
}

/// PROJ's named datums: CRS name, WKT datum name, ellipsoid and shift.
fn named_datum(name: &str) -> Option<(&'static str, &'static str, &'static str, Option<[f64; 7]>)> {
    let datum = match name {
        "WGS84" => ("WGS 84", "WGS_1984", "WGS84", Some([0.0; 7])),
        "NAD83" => ("NAD83", "North_American_Datum_1983", "GRS80", Some([0.0; 7])),
        "NAD27" => ("NAD27", "North_American_Datum_1927", "clrk66", None),
        "GGRS87" => (
            "GGRS87",
            "Greek_Geodetic_Reference_System_1987",
            "GRS80",
            Some([-199.87, 74.79, 246.62, 0.0, 0.0, 0.0, 0.0]),
        ),
        "potsdam" => (
            "DHDN",
            "Deutsches_Hauptdreiecksnetz",
            "bessel",
            Some([598.1, 73.7, 418.2, 0.202, 0.045, -2.455, 6.7]),
        ),
        "carthage" => (
            "Carthage",
            "Carthage",
            "clrk80ign",
            Some([-263.0, 6.0, 431.0, 0.0, 0.0, 0.0, 0.0]),
        ),
        "hermannskogel" => (
            "MGI",
            "Militar_Geographische_Institut",
            "bessel",
            Some([577.326, 90.129, 463.919, 5.137, 1.474, 5.297, 2.4232]),
        ),
        "ire65" => (
            "TM65",
            "TM65",
            "mod_airy",
            Some([482.530, -130.596, 564.557, -1.042, -0.214, -0.631, 8.15]),
        ),
        "nzgd49" => (
            "NZGD49",
            "New_Zealand_Geodetic_Datum_1949",
            "intl",
            Some([59.47, -5.04, 187.44, 0.47, -0.1, 1.024, -4.5993]),
        ),
        "OSGB36" => (
            "OSGB 1936",
            "OSGB_1936",
            "airy",
            Some([446.448, -125.157, 542.060, 0.1502, 0.2470, 0.8421, -20.4894]),
        ),
        _ => return None,
    };
    Some(datum)
}

fn prime_meridian(value: &str) -> CrsResult<PrimeMeridian> {
    let (name, longitude) = match value {
        "greenwich" => return Ok(PrimeMeridian::greenwich()),
        "oslo" => ("Oslo", 10.7229166666667),
        "paris" => ("Paris", 2.33722916666667),
        other => ("unnamed", number(other, "pm")?),
    };
    Ok(PrimeMeridian {
        name: name.to_string(),
        longitude,
        authority: None,
    })
}

fn linear_unit(params: &Params) -> CrsResult<Unit> {
    if let Some(factor) = params.number("to_meter")? {
        return Ok(Unit {
            name: "unknown".to_string(),
            factor,
            authority: None,
        });
    }
    match params.text("units") {
        None | Some("m") => Ok(Unit::metre()),
        Some("km") => Ok(Unit {
            name: "kilometre".to_string(),
            factor: 1000.0,
            authority: None,
        }),
        Some("ft") => Ok(Unit {
            name: "foot".to_string(),
            factor: 0.3048,
            authority: None,
        }),
        Some("us-ft") => Ok(Unit {
            name: "US survey foot".to_string(),
            factor: 1200.0 / 3937.0,
            authority: None,
        }),
        Some(other) => Err(CrsError::invalid(format!("unknown PROJ4 unit '{}'", other))),
    }
}

fn number(value: &str, key: &str) -> CrsResult<f64> {
    value
        .trim()
        .parse()
        .map_err(|_| CrsError::invalid(format!("+{} expects a number, got '{}'", key, value)))
}

struct Params {
    values: HashMap<String, Option<String>>,
}

impl Params {
    fn parse(text: &str) -> CrsResult<Self> {
        let mut values = HashMap::new();
        for token in text.split_whitespace() {
            let token = token.strip_prefix('+').unwrap_or(token);
            if token.is_empty() {
                return Err(CrsError::invalid("empty PROJ4 parameter"));
            }
            match token.split_once('=') {
                Some((key, value)) => values.insert(key.to_string(), Some(value.to_string())),
                None => values.insert(token.to_string(), None),
            };
        }
        Ok(Self { values })
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(|v| v.as_deref())
    }

    fn flag(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    fn number(&self, key: &str) -> CrsResult<Option<f64>> {
        self.text(key).map(|v| number(v, key)).transpose()
    }

    fn number_or(&self, key: &str, default: f64) -> CrsResult<f64> {
        Ok(self.number(key)?.unwrap_or(default))
    }
}

fn geographic(params: &Params) -> CrsResult<GeographicCrs> {
    let towgs84 = match params.text("towgs84") {
        Some(list) => {
            let values = list
                .split(',')
                .map(|v| number(v, "towgs84"))
                .collect::<CrsResult<Vec<f64>>>()?;
            if values.len() != 3 && values.len() != 7 {
                return Err(CrsError::invalid("+towgs84 expects 3 or 7 values"));
            }
            let mut shift = [0.0; 7];
            shift[..values.len()].copy_from_slice(&values);
            Some(shift)
        }
        None => None,
    };

    let (name, datum_name, spheroid, towgs84) = match params.text("datum") {
        Some(datum) => {
            let (name, datum_name, ellipsoid, shift) = named_datum(datum)
                .ok_or_else(|| CrsError::invalid(format!("unknown PROJ4 datum '{}'", datum)))?;
            let spheroid = ellps(ellipsoid)
                .ok_or_else(|| CrsError::invalid(format!("unknown ellipsoid '{}'", ellipsoid)))?;
            (name.to_string(), datum_name.to_string(), spheroid, towgs84.or(shift))
        }
        None => {
            let spheroid = spheroid(params)?;
            let datum_name = format!("Unknown based on {} ellipsoid", spheroid.name);
            ("unknown".to_string(), datum_name, spheroid, towgs84)
        }
    };

    Ok(GeographicCrs {
        name,
        datum: Datum {
            name: datum_name,
            spheroid,
            towgs84,
            authority: None,
        },
        prime_meridian: match params.text("pm") {
            Some(pm) => prime_meridian(pm)?,
            None => PrimeMeridian::greenwich(),
        },
        angular_unit: Unit::degree(),
        authority: None,
    })
}

fn spheroid(params: &Params) -> CrsResult<Spheroid> {
    if let Some(name) = params.text("ellps") {
        return ellps(name).ok_or_else(|| CrsError::invalid(format!("unknown ellipsoid '{}'", name)));
    }
    if let Some(radius) = params.number("R")? {
        return Ok(named_spheroid("unnamed", radius, 0.0));
    }
    if let Some(a) = params.number("a")? {
        let inverse_flattening = if let Some(rf) = params.number("rf")? {
            rf
        } else if let Some(f) = params.number("f")? {
            if f == 0.0 {
                0.0
            } else {
                1.0 / f
            }
        } else if let Some(b) = params.number("b")? {
            projection::Ellipsoid::from_axes(a, b).inv_f
        } else {
            0.0
        };
        return Ok(named_spheroid("unnamed", a, inverse_flattening));
    }
    Ok(registry::wgs84_spheroid())
}

fn scale_factor(params: &Params) -> CrsResult<f64> {
    match params.number("k")? {
        Some(k) => Ok(k),
        None => params.number_or("k_0", 1.0),
    }
}

/// WKT method name of a projection carried as [`ProjectionMethod::Other`].
fn other_method_name(proj: &str, params: &Params) -> String {
    let name = match proj {
        "merc" if params.flag("lat_ts") => "Mercator_2SP",
        "merc" => "Mercator_1SP",
        "stere" => "Stereographic",
        "sterea" => "Oblique_Stereographic",
        "lcc" if params.flag("lat_2") => "Lambert_Conformal_Conic_2SP",
        "lcc" => "Lambert_Conformal_Conic_1SP",
        "laea" => "Lambert_Azimuthal_Equal_Area",
        "aea" => "Albers_Conic_Equal_Area",
        "eqc" => "Equirectangular",
        "omerc" => "Hotine_Oblique_Mercator",
        "cea" => "Cylindrical_Equal_Area",
        other => other,
    };
    name.to_string()
}

/// PROJ4 keys in the order their WKT parameters are declared. Later keys
/// mapping to an already present name are skipped.
const OTHER_PARAMETERS: &[(&str, &str)] = &[
    ("lat_0", "latitude_of_origin"),
    ("lat_1", "standard_parallel_1"),
    ("lat_ts", "standard_parallel_1"),
    ("lat_2", "standard_parallel_2"),
    ("lon_0", "central_meridian"),
    ("alpha", "azimuth"),
    ("k", "scale_factor"),
    ("k_0", "scale_factor"),
    ("x_0", "false_easting"),
    ("y_0", "false_northing"),
];

fn other_projection(proj: &str, params: &Params, geographic: GeographicCrs) -> CrsResult<ProjectedCrs> {
    let unit = linear_unit(params)?;
    let mut parameters: Vec<(String, f64)> = Vec::new();
    for (key, name) in OTHER_PARAMETERS {
        let Some(mut value) = params.number(key)? else {
            continue;
        };
        if parameters.iter().any(|(existing, _)| existing == name) {
            continue;
        }
        if matches!(*key, "x_0" | "y_0") {
            value /= unit.factor;
        }
        parameters.push((name.to_string(), value));
    }
    Ok(ProjectedCrs {
        name: "unknown".to_string(),
        geographic,
        method: ProjectionMethod::Other(other_method_name(proj, params)),
        parameters,
        linear_unit: unit,
        authority: None,
    })
}

pub(crate) fn parse(text: &str) -> CrsResult<Definition> {
    let params = Params::parse(text)?;
    let proj = params
        .text("proj")
        .ok_or_else(|| CrsError::invalid("PROJ4 definition without +proj"))?;
    Proj::from_proj_string(text)
        .map_err(|e| CrsError::invalid(format!("invalid PROJ4 definition '{}': {:?}", text, e)))?;
    let geog = geographic(&params)?;
    let polar = (params.number_or("lat_0", 0.0)?.abs() - 90.0).abs() < 1e-10;

    match proj {
        "longlat" | "latlong" | "lonlat" | "latlon" => Ok(Definition::Geographic(geog)),
        "tmerc" | "etmerc" => {
            let unit = linear_unit(&params)?;
            let parameters = registry::tm_parameters(
                params.number_or("lat_0", 0.0)?,
                params.number_or("lon_0", 0.0)?,
                scale_factor(&params)?,
                params.number_or("x_0", 0.0)? / unit.factor,
                params.number_or("y_0", 0.0)? / unit.factor,
            );
            Ok(Definition::Projected(ProjectedCrs {
                name: "unknown".to_string(),
                geographic: geog,
                method: ProjectionMethod::TransverseMercator,
                parameters,
                linear_unit: unit,
                authority: None,
            }))
        }
        "utm" => {
            let zone = params
                .text("zone")
                .and_then(|z| z.parse::<u32>().ok())
                .filter(|z| (1..=60).contains(z))
                .ok_or_else(|| CrsError::invalid("+proj=utm requires +zone between 1 and 60"))?;
            let south = params.flag("south");
            let unit = linear_unit(&params)?;
            let name = if geog.name == "unknown" {
                format!(
                    "UTM Zone {}, {} Hemisphere",
                    zone,
                    if south { "Southern" } else { "Northern" }
                )
            } else {
                format!("{} / UTM zone {}{}", geog.name, zone, if south { 'S' } else { 'N' })
            };
            let false_northing = if south { 10_000_000.0 } else { 0.0 };
            Ok(Definition::Projected(ProjectedCrs {
                name,
                geographic: geog,
                method: ProjectionMethod::TransverseMercator,
                parameters: registry::tm_parameters(
                    0.0,
                    registry::utm_central_meridian(zone),
                    0.9996,
                    500_000.0 / unit.factor,
                    false_northing / unit.factor,
                ),
                linear_unit: unit,
                authority: None,
            }))
        }
        "stere" if polar => {
            let lat_0 = params.number_or("lat_0", 0.0)?;
            let lat_ts = params.number_or("lat_ts", lat_0)?.abs() * lat_0.signum();
            let unit = linear_unit(&params)?;
            Ok(Definition::Projected(ProjectedCrs {
                name: "unknown".to_string(),
                geographic: geog,
                method: ProjectionMethod::PolarStereographic,
                parameters: vec![
                    ("latitude_of_origin".to_string(), lat_ts),
                    ("central_meridian".to_string(), params.number_or("lon_0", 0.0)?),
                    ("scale_factor".to_string(), scale_factor(&params)?),
                    ("false_easting".to_string(), params.number_or("x_0", 0.0)? / unit.factor),
                    ("false_northing".to_string(), params.number_or("y_0", 0.0)? / unit.factor),
                ],
                linear_unit: unit,
                authority: None,
            }))
        }
        other => other_projection(other, &params, geog).map(Definition::Projected),
    }
}

fn write_geographic(out: &mut Vec<String>, geog: &GeographicCrs) {
    let spheroid = &geog.datum.spheroid;
    if spheroid.inverse_flattening == 0.0 {
        out.push(format!("+R={}", format_number(spheroid.semi_major)));
    } else {
        out.push(format!("+a={}", format_number(spheroid.semi_major)));
        out.push(format!("+rf={}", format_number(spheroid.inverse_flattening)));
    }
    if let Some(shift) = &geog.datum.towgs84 {
        let values: Vec<String> = shift.iter().map(|v| format_number(*v)).collect();
        out.push(format!("+towgs84={}", values.join(",")));
    }
    if geog.prime_meridian.longitude != 0.0 {
        let degrees = geog
            .angular_unit
            .angle_to_radians(geog.prime_meridian.longitude)
            .to_degrees();
        out.push(format!("+pm={}", format_number(degrees)));
    }
}

pub(crate) fn write(definition: &Definition) -> CrsResult<String> {
    let mut out = Vec::new();
    match definition {
        Definition::Geographic(geog) => {
            out.push("+proj=longlat".to_string());
            write_geographic(&mut out, geog);
        }
        Definition::Projected(proj) => {
            let factor = proj.linear_unit.factor;
            let lat_0 = proj.parameter_or("latitude_of_origin", 0.0);
            let lon_0 = proj.parameter_or("central_meridian", 0.0);
            let k = proj.parameter_or("scale_factor", 1.0);
            let x_0 = proj.parameter_or("false_easting", 0.0) * factor;
            let y_0 = proj.parameter_or("false_northing", 0.0) * factor;

            match &proj.method {
                ProjectionMethod::TransverseMercator => {
                    out.push("+proj=tmerc".to_string());
                    out.push(format!("+lat_0={}", format_number(lat_0)));
                }
                ProjectionMethod::PolarStereographic => {
                    out.push("+proj=stere".to_string());
                    out.push(format!("+lat_0={}", if lat_0 < 0.0 { -90 } else { 90 }));
                    out.push(format!("+lat_ts={}", format_number(lat_0)));
                }
                ProjectionMethod::Other(name) => {
                    return Err(CrsError::UnsupportedProjection(name.clone()));
                }
            }
            out.push(format!("+lon_0={}", format_number(lon_0)));
            out.push(format!("+k={}", format_number(k)));
            out.push(format!("+x_0={}", format_number(x_0)));
            out.push(format!("+y_0={}", format_number(y_0)));
            write_geographic(&mut out, &proj.geographic);
            if factor == 1.0 {
                out.push("+units=m".to_string());
            } else {
                out.push(format!("+to_meter={}", format_number(factor)));
            }
        }
    }
    out.push("+no_defs".to_string());
    Ok(out.join(" "))
}
