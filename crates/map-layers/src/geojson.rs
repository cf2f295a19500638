//! GeoJSON feature collections as written by `ogr2ogr`.

use std::path::Path;

use geo::{Coord, LineString, Point, Polygon};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{LayerError, LayerResult};

/// A GeoJSON `FeatureCollection`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,

    /// Layer name, written by GDAL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Legacy named CRS member, written by GDAL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crs: Option<Value>,

    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(name: Option<String>, features: Vec<Feature>) -> Self {
        Self {
            kind: "FeatureCollection".to_string(),
            name,
            crs: None,
            features,
        }
    }

    /// Read a collection from a GeoJSON file.
    pub async fn read(path: &Path) -> LayerResult<Self> {
        let bytes = tokio::fs::read(path).await?;
        let collection: Self = serde_json::from_slice(&bytes)?;
        debug!(
            path = %path.display(),
            features = collection.features.len(),
            "Read feature collection"
        );
        Ok(collection)
    }

    /// Write the collection as GeoJSON, replacing any existing file.
    pub async fn write(&self, path: &Path) -> LayerResult<()> {
        let bytes = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    /// All areal parts of all features.
    pub fn polygons(&self) -> LayerResult<Vec<Polygon<f64>>> {
        let mut polygons = Vec::new();
        for feature in &self.features {
            if let Some(geometry) = &feature.geometry {
                polygons.extend(geometry.polygons()?);
            }
        }
        Ok(polygons)
    }
}

/// A GeoJSON `Feature`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub properties: Option<Map<String, Value>>,

    #[serde(default)]
    pub geometry: Option<Geometry>,
}

impl Feature {
    pub fn new(properties: Map<String, Value>, geometry: Option<Geometry>) -> Self {
        Self {
            kind: "Feature".to_string(),
            properties: Some(properties),
            geometry,
        }
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.as_ref().and_then(|props| props.get(key))
    }

    /// Property as an integer. Whole floats and numeric strings count.
    pub fn integer_property(&self, key: &str) -> Option<i64> {
        self.property(key).and_then(as_integer)
    }
}

/// A GeoJSON geometry. Positions are `[lon, lat]` or `[lon, lat, z]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Vec<f64> },
    MultiPoint { coordinates: Vec<Vec<f64>> },
    LineString { coordinates: Vec<Vec<f64>> },
    MultiLineString { coordinates: Vec<Vec<Vec<f64>>> },
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Vec<f64>>>> },
    GeometryCollection { geometries: Vec<Geometry> },
}

impl Geometry {
    /// The position of a `Point`.
    pub fn point(&self) -> Option<Point<f64>> {
        match self {
            Geometry::Point { coordinates } => to_coord(coordinates).ok().map(Point::from),
            _ => None,
        }
    }

    /// Areal parts of the geometry. Points and lines have none.
    pub fn polygons(&self) -> LayerResult<Vec<Polygon<f64>>> {
        match self {
            Geometry::Polygon { coordinates } => Ok(vec![to_polygon(coordinates)?]),
            Geometry::MultiPolygon { coordinates } => {
                coordinates.iter().map(|rings| to_polygon(rings)).collect()
            }
            Geometry::GeometryCollection { geometries } => {
                let mut polygons = Vec::new();
                for geometry in geometries {
                    polygons.extend(geometry.polygons()?);
                }
                Ok(polygons)
            }
            _ => Ok(Vec::new()),
        }
    }
}

impl From<&Polygon<f64>> for Geometry {
    fn from(polygon: &Polygon<f64>) -> Self {
        let ring = |line: &LineString<f64>| -> Vec<Vec<f64>> {
            line.coords().map(|c| vec![c.x, c.y]).collect()
        };
        let mut coordinates = vec![ring(polygon.exterior())];
        coordinates.extend(polygon.interiors().iter().map(ring));
        Geometry::Polygon { coordinates }
    }
}

fn to_coord(position: &[f64]) -> LayerResult<Coord<f64>> {
    match position {
        [x, y, ..] => Ok(Coord { x: *x, y: *y }),
        _ => Err(LayerError::Geometry(format!(
            "position needs at least 2 numbers, got {}",
            position.len()
        ))),
    }
}

fn to_polygon(rings: &[Vec<Vec<f64>>]) -> LayerResult<Polygon<f64>> {
    let mut lines = Vec::with_capacity(rings.len());
    for ring in rings {
        let coords = ring
            .iter()
            .map(|position| to_coord(position))
            .collect::<LayerResult<Vec<_>>>()?;
        lines.push(LineString::from(coords));
    }
    let mut lines = lines.into_iter();
    let exterior = lines
        .next()
        .ok_or_else(|| LayerError::Geometry("polygon without rings".to_string()))?;
    Ok(Polygon::new(exterior, lines.collect()))
}

pub(crate) fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square() -> Value {
        json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]]
        })
    }

    #[test]
    fn test_parse_collection() {
        let doc = json!({
            "type": "FeatureCollection",
            "name": "layer_262",
            "features": [
                {"type": "Feature", "properties": {"loknr": 10001}, "geometry": {"type": "Point", "coordinates": [5.1, 60.2]}},
                {"type": "Feature", "properties": null, "geometry": square()},
                {"type": "Feature", "properties": {}, "geometry": null}
            ]
        });
        let collection: FeatureCollection = serde_json::from_value(doc).unwrap();
        assert_eq!(collection.name.as_deref(), Some("layer_262"));
        assert_eq!(collection.features.len(), 3);
        assert_eq!(collection.features[0].integer_property("loknr"), Some(10001));
        assert!(collection.features[1].properties.is_none());
        assert!(collection.features[2].geometry.is_none());

        let point = collection.features[0].geometry.as_ref().unwrap().point().unwrap();
        assert_eq!((point.x(), point.y()), (5.1, 60.2));
        assert_eq!(collection.polygons().unwrap().len(), 1);
    }

    #[test]
    fn test_multipolygon_and_collection_parts() {
        let multi: Geometry = serde_json::from_value(json!({
            "type": "MultiPolygon",
            "coordinates": [
                [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]],
                [[[5.0, 5.0], [6.0, 5.0], [6.0, 6.0], [5.0, 5.0]]]
            ]
        }))
        .unwrap();
        assert_eq!(multi.polygons().unwrap().len(), 2);

        let mixed = Geometry::GeometryCollection {
            geometries: vec![
                Geometry::LineString { coordinates: vec![vec![0.0, 0.0], vec![1.0, 1.0]] },
                serde_json::from_value(square()).unwrap(),
            ],
        };
        assert_eq!(mixed.polygons().unwrap().len(), 1);
    }

    #[test]
    fn test_third_coordinate_is_ignored() {
        let geometry = Geometry::Point { coordinates: vec![1.0, 2.0, 30.0] };
        let point = geometry.point().unwrap();
        assert_eq!((point.x(), point.y()), (1.0, 2.0));
    }

    #[test]
    fn test_short_position_is_error() {
        let geometry = Geometry::Polygon { coordinates: vec![vec![vec![1.0]]] };
        assert!(matches!(geometry.polygons(), Err(LayerError::Geometry(_))));
    }

    #[test]
    fn test_integer_property_forms() {
        let feature = Feature::new(
            serde_json::from_value(json!({"a": 10, "b": 10.0, "c": " 11 ", "d": 10.5, "e": "x"})).unwrap(),
            None,
        );
        assert_eq!(feature.integer_property("a"), Some(10));
        assert_eq!(feature.integer_property("b"), Some(10));
        assert_eq!(feature.integer_property("c"), Some(11));
        assert_eq!(feature.integer_property("d"), None);
        assert_eq!(feature.integer_property("e"), None);
        assert_eq!(feature.integer_property("missing"), None);
    }

    #[test]
    fn test_polygon_geometry_from_geo() {
        let polygon = Polygon::new(
            LineString::from(vec![(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 0.0)]),
            vec![],
        );
        let geometry = Geometry::from(&polygon);
        assert_eq!(geometry.polygons().unwrap(), vec![polygon]);
    }
}
