//! OGC WKT1 (GDAL flavour) reader and canonical writer.
//!
//! The writer emits a fixed node order without `AXIS` nodes, and numbers in
//! their shortest round-tripping decimal form, so that parsing and
//! re-writing a canonical string reproduces it byte for byte.

use std::fmt::Write;
use std::iter::Peekable;
use std::str::Chars;

use crate::error::{CrsError, CrsResult};
use crate::frame::{
    Authority, Datum, Definition, GeographicCrs, PrimeMeridian, ProjectedCrs, ProjectionMethod,
    Spheroid, Unit,
};
use crate::registry;

// ============================================================================
// Writer
// ============================================================================

pub(crate) fn write(definition: &Definition) -> String {
    let mut out = String::new();
    match definition {
        Definition::Geographic(geog) => write_geographic(&mut out, geog),
        Definition::Projected(proj) => write_projected(&mut out, proj),
    }
    out
}

/// Format a number the way it is written into WKT.
pub(crate) fn format_number(value: f64) -> String {
    if value == 0.0 {
        // Normalises -0
        "0".to_string()
    } else {
        format!("{}", value)
    }
}

fn write_authority(out: &mut String, authority: &Option<Authority>) {
    if let Some(auth) = authority {
        let _ = write!(out, ",AUTHORITY[\"{}\",\"{}\"]", auth.name, auth.code);
    }
}

fn write_unit(out: &mut String, unit: &Unit) {
    let _ = write!(out, "UNIT[\"{}\",{}", unit.name, format_number(unit.factor));
    write_authority(out, &unit.authority);
    out.push(']');
}

fn write_geographic(out: &mut String, geog: &GeographicCrs) {
    let datum = &geog.datum;
    let spheroid = &datum.spheroid;

    let _ = write!(out, "GEOGCS[\"{}\",DATUM[\"{}\",", geog.name, datum.name);
    let _ = write!(
        out,
        "SPHEROID[\"{}\",{},{}",
        spheroid.name,
        format_number(spheroid.semi_major),
        format_number(spheroid.inverse_flattening)
    );
    write_authority(out, &spheroid.authority);
    out.push(']');

    if let Some(params) = &datum.towgs84 {
        let values: Vec<String> = params.iter().map(|v| format_number(*v)).collect();
        let _ = write!(out, ",TOWGS84[{}]", values.join(","));
    }
    write_authority(out, &datum.authority);
    out.push(']');

    let pm = &geog.prime_meridian;
    let _ = write!(out, ",PRIMEM[\"{}\",{}", pm.name, format_number(pm.longitude));
    write_authority(out, &pm.authority);
    out.push_str("],");

    write_unit(out, &geog.angular_unit);
    write_authority(out, &geog.authority);
    out.push(']');
}

fn write_projected(out: &mut String, proj: &ProjectedCrs) {
    let _ = write!(out, "PROJCS[\"{}\",", proj.name);
    write_geographic(out, &proj.geographic);
    let _ = write!(out, ",PROJECTION[\"{}\"]", proj.method.wkt_name());
    for (name, value) in &proj.parameters {
        let _ = write!(out, ",PARAMETER[\"{}\",{}]", name, format_number(*value));
    }
    out.push(',');
    write_unit(out, &proj.linear_unit);
    write_authority(out, &proj.authority);
    out.push(']');
}

// ============================================================================
// Reader
// ============================================================================

#[derive(Debug, Clone)]
enum Value {
    Text(String),
    Number(f64),
    /// Bare enumeration words such as `NORTH` in `AXIS["X",NORTH]`
    Word(String),
    Node(Node),
}

#[derive(Debug, Clone)]
struct Node {
    keyword: String,
    args: Vec<Value>,
}

impl Node {
    fn text(&self, index: usize) -> CrsResult<&str> {
        match self.args.get(index) {
            Some(Value::Text(text)) => Ok(text),
            _ => Err(CrsError::invalid(format!(
                "{} expects a quoted name as argument {}",
                self.keyword,
                index + 1
            ))),
        }
    }

    fn number(&self, index: usize) -> CrsResult<f64> {
        match self.args.get(index) {
            Some(Value::Number(value)) => Ok(*value),
            _ => Err(CrsError::invalid(format!(
                "{} expects a number as argument {}",
                self.keyword,
                index + 1
            ))),
        }
    }

    fn word(&self, index: usize) -> CrsResult<&str> {
        match self.args.get(index) {
            Some(Value::Word(word)) => Ok(word),
            _ => Err(CrsError::invalid(format!(
                "{} expects a direction as argument {}",
                self.keyword,
                index + 1
            ))),
        }
    }

    fn children(&self) -> impl Iterator<Item = &Node> {
        self.args.iter().filter_map(|value| match value {
            Value::Node(node) => Some(node),
            _ => None,
        })
    }

    fn child(&self, keyword: &str) -> Option<&Node> {
        self.children()
            .find(|node| node.keyword.eq_ignore_ascii_case(keyword))
    }

    fn authority(&self) -> CrsResult<Option<Authority>> {
        self.child("AUTHORITY")
            .map(|node| {
                let code = match node.args.get(1) {
                    Some(Value::Text(code)) => code.clone(),
                    Some(Value::Number(code)) => format_number(*code),
                    _ => return Err(CrsError::invalid("AUTHORITY expects a code")),
                };
                Ok(Authority {
                    name: node.text(0)?.to_string(),
                    code,
                })
            })
            .transpose()
    }
}

struct Parser<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.chars.peek().map_or(false, |c| c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn word(&mut self) -> String {
        let mut word = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                word.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        word
    }

    fn quoted(&mut self) -> CrsResult<String> {
        self.chars.next();
        let mut text = String::new();
        loop {
            match self.chars.next() {
                Some('"') => {
                    // A doubled quote is an escaped quote
                    if self.chars.peek() == Some(&'"') {
                        self.chars.next();
                        text.push('"');
                    } else {
                        return Ok(text);
                    }
                }
                Some(c) => text.push(c),
                None => return Err(CrsError::invalid("unterminated string in WKT")),
            }
        }
    }

    fn number(&mut self) -> CrsResult<f64> {
        let mut literal = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E') {
                literal.push(c);
                self.chars.next();
            } else {
                break;
            }
        }
        literal
            .parse()
            .map_err(|_| CrsError::invalid(format!("invalid number '{}' in WKT", literal)))
    }

    fn value(&mut self) -> CrsResult<Value> {
        self.skip_whitespace();
        match self.chars.peek().copied() {
            Some('"') => self.quoted().map(Value::Text),
            Some(c) if c.is_ascii_digit() || matches!(c, '+' | '-' | '.') => {
                self.number().map(Value::Number)
            }
            Some(c) if c.is_ascii_alphabetic() => {
                let word = self.word();
                self.skip_whitespace();
                if matches!(self.chars.peek(), Some('[') | Some('(')) {
                    self.node_body(word).map(Value::Node)
                } else {
                    Ok(Value::Word(word))
                }
            }
            Some(c) => Err(CrsError::invalid(format!("unexpected character '{}' in WKT", c))),
            None => Err(CrsError::invalid("unexpected end of WKT")),
        }
    }

    fn node_body(&mut self, keyword: String) -> CrsResult<Node> {
        // Opening bracket
        self.chars.next();
        let mut args = Vec::new();

        self.skip_whitespace();
        if matches!(self.chars.peek(), Some(']') | Some(')')) {
            self.chars.next();
            return Ok(Node { keyword, args });
        }

        loop {
            args.push(self.value()?);
            self.skip_whitespace();
            match self.chars.next() {
                Some(',') => continue,
                Some(']') | Some(')') => return Ok(Node { keyword, args }),
                Some(c) => {
                    return Err(CrsError::invalid(format!(
                        "unexpected '{}' in {} node",
                        c, keyword
                    )))
                }
                None => return Err(CrsError::invalid(format!("unterminated {} node", keyword))),
            }
        }
    }

    fn document(mut self) -> CrsResult<Node> {
        let root = match self.value()? {
            Value::Node(node) => node,
            _ => return Err(CrsError::invalid("WKT must start with a CRS node")),
        };
        self.skip_whitespace();
        if self.chars.next().is_some() {
            return Err(CrsError::invalid("trailing characters after WKT"));
        }
        Ok(root)
    }
}

pub(crate) fn parse(text: &str) -> CrsResult<Definition> {
    let root = Parser::new(text).document()?;
    match root.keyword.to_ascii_uppercase().as_str() {
        "GEOGCS" => geographic(&root).map(Definition::Geographic),
        "PROJCS" => projected(&root).map(Definition::Projected),
        other => Err(CrsError::invalid(format!("unsupported WKT root node {}", other))),
    }
}

/// Axes are dropped from the canonical form, but their directions must be
/// valid WKT1 enumeration words.
fn check_axes(node: &Node) -> CrsResult<()> {
    for axis in node
        .children()
        .filter(|child| child.keyword.eq_ignore_ascii_case("AXIS"))
    {
        axis.text(0)?;
        let direction = axis.word(1)?;
        if !["NORTH", "SOUTH", "EAST", "WEST", "UP", "DOWN", "OTHER"]
            .iter()
            .any(|valid| direction.eq_ignore_ascii_case(valid))
        {
            return Err(CrsError::invalid(format!("unknown AXIS direction {}", direction)));
        }
    }
    Ok(())
}

fn unit(node: &Node) -> CrsResult<Unit> {
    Ok(Unit {
        name: node.text(0)?.to_string(),
        factor: node.number(1)?,
        authority: node.authority()?,
    })
}

fn spheroid(node: &Node) -> CrsResult<Spheroid> {
    Ok(Spheroid {
        name: node.text(0)?.to_string(),
        semi_major: node.number(1)?,
        inverse_flattening: node.number(2)?,
        authority: node.authority()?,
    })
}

fn towgs84(node: &Node) -> CrsResult<[f64; 7]> {
    let mut params = [0.0; 7];
    let count = node.args.len();
    if count != 3 && count != 7 {
        return Err(CrsError::invalid(format!(
            "TOWGS84 expects 3 or 7 values, got {}",
            count
        )));
    }
    for (i, slot) in params.iter_mut().enumerate().take(count) {
        *slot = node.number(i)?;
    }
    Ok(params)
}

fn datum(node: &Node) -> CrsResult<Datum> {
    let name = node.text(0)?.to_string();
    let spheroid = match node.child("SPHEROID").or_else(|| node.child("ELLIPSOID")) {
        Some(sph) => spheroid(sph)?,
        // Abbreviated forms leave the ellipsoid implied by the datum
        None => registry::spheroid_for_datum(&name),
    };
    Ok(Datum {
        spheroid,
        towgs84: node.child("TOWGS84").map(towgs84).transpose()?,
        authority: node.authority()?,
        name,
    })
}

fn geographic(node: &Node) -> CrsResult<GeographicCrs> {
    check_axes(node)?;
    let datum_node = node
        .child("DATUM")
        .ok_or_else(|| CrsError::invalid("GEOGCS without DATUM"))?;

    let prime_meridian = match node.child("PRIMEM") {
        Some(pm) => PrimeMeridian {
            name: pm.text(0)?.to_string(),
            longitude: pm.number(1)?,
            authority: pm.authority()?,
        },
        None => PrimeMeridian::greenwich(),
    };

    Ok(GeographicCrs {
        name: node.text(0)?.to_string(),
        datum: datum(datum_node)?,
        prime_meridian,
        angular_unit: node.child("UNIT").map(unit).transpose()?.unwrap_or_else(Unit::degree),
        authority: node.authority()?,
    })
}

fn projected(node: &Node) -> CrsResult<ProjectedCrs> {
    check_axes(node)?;
    let geog_node = node
        .child("GEOGCS")
        .ok_or_else(|| CrsError::invalid("PROJCS without GEOGCS"))?;
    let method = node
        .child("PROJECTION")
        .ok_or_else(|| CrsError::invalid("PROJCS without PROJECTION"))?
        .text(0)?;

    let mut parameters = Vec::new();
    for param in node
        .children()
        .filter(|child| child.keyword.eq_ignore_ascii_case("PARAMETER"))
    {
        parameters.push((param.text(0)?.to_string(), param.number(1)?));
    }

    Ok(ProjectedCrs {
        name: node.text(0)?.to_string(),
        geographic: geographic(geog_node)?,
        method: ProjectionMethod::from_wkt_name(method),
        parameters,
        linear_unit: node.child("UNIT").map(unit).transpose()?.unwrap_or_else(Unit::metre),
        authority: node.authority()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ED50_UTM32: &str = r#"PROJCS["ED50 / UTM zone 32N",
        GEOGCS["ED50",
            DATUM["European_Datum_1950",
                SPHEROID["International 1924",6378388,297,AUTHORITY["EPSG","7022"]],
                TOWGS84[-87,-98,-121,0,0,0,0],
                AUTHORITY["EPSG","6230"]],
            PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],
            UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],
            AUTHORITY["EPSG","4230"]],
        PROJECTION["Transverse_Mercator"],
        PARAMETER["latitude_of_origin",0],
        PARAMETER["central_meridian",9],
        PARAMETER["scale_factor",0.9996],
        PARAMETER["false_easting",500000],
        PARAMETER["false_northing",0],
        UNIT["metre",1,AUTHORITY["EPSG","9001"]],
        AXIS["Easting",EAST],
        AXIS["Northing",NORTH],
        AUTHORITY["EPSG","23032"]]"#;

    #[test]
    fn test_parse_pretty_printed_projcs() {
        let definition = parse(ED50_UTM32).unwrap();
        let Definition::Projected(proj) = definition else {
            panic!("expected a projected CRS");
        };
        assert_eq!(proj.name, "ED50 / UTM zone 32N");
        assert_eq!(proj.geographic.datum.spheroid.semi_major, 6378388.0);
        assert_eq!(proj.geographic.datum.towgs84, Some([-87.0, -98.0, -121.0, 0.0, 0.0, 0.0, 0.0]));
        assert_eq!(proj.method, ProjectionMethod::TransverseMercator);
        assert_eq!(proj.parameter("central_meridian"), Some(9.0));
        assert_eq!(proj.authority.as_ref().map(|a| a.code.as_str()), Some("23032"));
    }

    #[test]
    fn test_canonical_output_drops_axes_and_whitespace() {
        let written = write(&parse(ED50_UTM32).unwrap());
        assert!(!written.contains("AXIS"));
        assert!(!written.contains('\n'));
        assert!(written.starts_with("PROJCS[\"ED50 / UTM zone 32N\",GEOGCS[\"ED50\",DATUM["));
        assert!(written.contains("TOWGS84[-87,-98,-121,0,0,0,0]"));
        assert_eq!(write(&parse(&written).unwrap()), written);
    }

    #[test]
    fn test_axis_directions_are_read() {
        let text = r#"GEOGCS["WGS 84",DATUM["WGS_1984"],AXIS["Latitude",NORTH],AXIS["Longitude",east]]"#;
        let written = write(&parse(text).unwrap());
        assert!(!written.contains("AXIS"));
    }

    #[test]
    fn test_abbreviated_geogcs_defaults() {
        let Definition::Geographic(geog) = parse(r#"GEOGCS["WGS 84",DATUM["WGS_1984"]]"#).unwrap() else {
            panic!("expected a geographic CRS");
        };
        assert_eq!(geog.datum.spheroid.inverse_flattening, 298.257223563);
        assert_eq!(geog.prime_meridian.name, "Greenwich");
        assert_eq!(geog.angular_unit.name, "degree");
    }

    #[test]
    fn test_three_parameter_towgs84_is_padded() {
        let text = r#"GEOGCS["x",DATUM["y",SPHEROID["International 1924",6378388,297],TOWGS84[1,2,3]]]"#;
        let Definition::Geographic(geog) = parse(text).unwrap() else {
            panic!("expected a geographic CRS");
        };
        assert_eq!(geog.datum.towgs84, Some([1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 0.0]));
    }

    #[test]
    fn test_escaped_quotes_in_names() {
        let text = r#"GEOGCS["say ""hi""",DATUM["WGS_1984"]]"#;
        let Definition::Geographic(geog) = parse(text).unwrap() else {
            panic!("expected a geographic CRS");
        };
        assert_eq!(geog.name, "say \"hi\"");
    }

    #[test]
    fn test_rejects_malformed_text() {
        for text in [
            "",
            "not wkt",
            "GEOGCS[",
            r#"GEOGCS["WGS 84""#,
            r#"GEOGCS["WGS 84",DATUM["WGS_1984"]] trailing"#,
            r#"GEOGCS["no datum"]"#,
            r#"PROJCS["p",PROJECTION["Transverse_Mercator"]]"#,
            r#"GEOGCS["x",DATUM["y",SPHEROID["s","a",1]]]"#,
            r#"VERT_CS["height",VERT_DATUM["x",2005]]"#,
            r#"GEOGCS["x",DATUM["WGS_1984"],AXIS["Lat",SIDEWAYS]]"#,
            r#"GEOGCS["x",DATUM["WGS_1984"],AXIS["Lat","NORTH"]]"#,
        ] {
            assert!(
                matches!(parse(text), Err(CrsError::InvalidDefinition(_))),
                "should reject {:?}",
                text
            );
        }
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_number(6378137.0), "6378137");
        assert_eq!(format_number(0.9996), "0.9996");
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(298.257223563), "298.257223563");
    }
}
