//! Aquaculture sites from the Directorate of Fisheries.
//!
//! Sites are published as two layers: one point per site and one polygon
//! per licensed area. Both are indexed by the site's location number
//! (`loknr`).

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};
use wfs::ResourceCache;

use crate::error::{LayerError, LayerResult};
use crate::geojson::{as_integer, Feature, FeatureCollection, Geometry};

/// Server publishing the aquaculture layers.
pub const FARM_SERVER: &str = "fiskdir";

/// Site positions.
pub const LOCATIONS_LAYER: &str = "layer_262";

/// Site areas.
pub const AREAS_LAYER: &str = "layer_203";

/// One site in a [`FarmTable`].
#[derive(Debug, Clone, PartialEq)]
pub struct FarmRecord {
    pub properties: Map<String, Value>,
    pub geometry: Option<Geometry>,
}

impl FarmRecord {
    fn from_feature(feature: &Feature) -> Self {
        Self {
            properties: feature.properties.clone().unwrap_or_default(),
            geometry: feature.geometry.clone(),
        }
    }

    /// Properties of the record, plus `longitude` and `latitude` when the
    /// geometry is a point.
    pub fn summary(&self) -> Map<String, Value> {
        let mut summary = self.properties.clone();
        if let Some(point) = self.geometry.as_ref().and_then(Geometry::point) {
            summary.insert("longitude".to_string(), Value::from(point.x()));
            summary.insert("latitude".to_string(), Value::from(point.y()));
        }
        summary
    }
}

/// Sites keyed by location number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FarmTable {
    records: BTreeMap<i64, FarmRecord>,
}

impl FarmTable {
    /// Index features by their `loknr` property.
    pub fn from_locations(collection: &FeatureCollection) -> Self {
        Self::index(collection, |feature| feature.integer_property("loknr"))
    }

    /// Index area features by the number leading their `lokalitet`
    /// property (`"12345 Name"`). The number is also stored as `loknr`.
    pub fn from_areas(collection: &FeatureCollection) -> Self {
        let mut table = Self::index(collection, |feature| {
            feature
                .property("lokalitet")
                .and_then(Value::as_str)
                .and_then(leading_number)
        });
        for (loknr, record) in table.records.iter_mut() {
            record.properties.insert("loknr".to_string(), Value::from(*loknr));
        }
        table
    }

    fn index(collection: &FeatureCollection, key: impl Fn(&Feature) -> Option<i64>) -> Self {
        let mut records = BTreeMap::new();
        let mut skipped = 0usize;
        for feature in &collection.features {
            match key(feature) {
                // First feature wins for repeated numbers
                Some(loknr) => {
                    records
                        .entry(loknr)
                        .or_insert_with(|| FarmRecord::from_feature(feature));
                }
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!(skipped, "Features without a location number");
        }
        Self { records }
    }

    pub fn get(&self, loknr: i64) -> Option<&FarmRecord> {
        self.records.get(&loknr)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Location numbers in ascending order.
    pub fn loknrs(&self) -> impl Iterator<Item = i64> + '_ {
        self.records.keys().copied()
    }
}

/// The number at the start of `text`, up to the first space.
fn leading_number(text: &str) -> Option<i64> {
    text.trim_start()
        .split(' ')
        .next()
        .and_then(|word| as_integer(&Value::from(word)))
}

/// Site positions, downloaded when `reload` is set or not cached yet.
#[instrument(skip(cache))]
pub async fn locations(cache: &ResourceCache, reload: bool) -> LayerResult<FarmTable> {
    let path = cache.resource(LOCATIONS_LAYER, FARM_SERVER, reload, None).await?;
    let table = FarmTable::from_locations(&FeatureCollection::read(&path).await?);
    debug!(sites = table.len(), "Loaded farm locations");
    Ok(table)
}

/// Site areas, downloaded when `reload` is set or not cached yet.
#[instrument(skip(cache))]
pub async fn areas(cache: &ResourceCache, reload: bool) -> LayerResult<FarmTable> {
    let path = cache.resource(AREAS_LAYER, FARM_SERVER, reload, None).await?;
    let table = FarmTable::from_areas(&FeatureCollection::read(&path).await?);
    debug!(sites = table.len(), "Loaded farm areas");
    Ok(table)
}

/// Everything known about one site.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FarmReport {
    pub location: Map<String, Value>,
    pub area: Map<String, Value>,
}

impl FarmReport {
    pub fn to_yaml(&self) -> LayerResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Report for site `loknr`. The site must be in both tables.
pub fn farm_report(locations: &FarmTable, areas: &FarmTable, loknr: i64) -> LayerResult<FarmReport> {
    match (locations.get(loknr), areas.get(loknr)) {
        (Some(location), Some(area)) => Ok(FarmReport {
            location: location.summary(),
            area: area.summary(),
        }),
        _ => Err(LayerError::LocationNotFound(loknr)),
    }
}

/// Load both layers through `cache` and report on site `loknr`.
pub async fn fetch_farm_report(cache: &ResourceCache, loknr: i64, reload: bool) -> LayerResult<FarmReport> {
    let locations = locations(cache, reload).await?;
    let areas = areas(cache, reload).await?;
    farm_report(&locations, &areas, loknr)
}
