//! Farms, spawning areas and coastlines against recorded layers.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use geo::{LineString, Polygon};
use map_layers::{
    area, areas, coastlines, fetch_farm_report, layer_for_species, locations, CoastConfig, CoastSource,
    CoastlineClipper, FeatureCollection, LayerError, LayerResult, DEFAULT_WMS_CODES,
};
use test_utils::{assert_coords_approx_eq, require_test_file, temp_cache_dir};
use wfs::{LayerDownloader, ResourceCache, WfsConfig, WfsError, WfsResult};

/// Serves layers from local GeoJSON files; any other layer fails like a
/// missing layer on the server.
struct FixtureDownloader {
    layers: HashMap<String, PathBuf>,
}

#[async_trait]
impl LayerDownloader for FixtureDownloader {
    async fn download(&self, layer: &str, url: &str, outfile: &Path) -> WfsResult<()> {
        match self.layers.get(layer) {
            Some(source) => {
                tokio::fs::copy(source, outfile).await?;
                Ok(())
            }
            None => Err(WfsError::DownloadFailed {
                layer: layer.to_string(),
                server: url.to_string(),
                reason: "Couldn't fetch requested layer".to_string(),
            }),
        }
    }
}

fn cache(dir: &Path, layers: &[(&str, PathBuf)]) -> ResourceCache {
    let downloader = FixtureDownloader {
        layers: layers
            .iter()
            .map(|(name, path)| (name.to_string(), path.clone()))
            .collect(),
    };
    ResourceCache::new(WfsConfig::default().with_cache_dir(dir), Arc::new(downloader))
}

// ============================================================================
// Farms
// ============================================================================

#[tokio::test]
async fn test_farm_tables() {
    let locations_file = require_test_file!("farm_locations.geojson");
    let areas_file = require_test_file!("farm_areas.geojson");
    let dir = temp_cache_dir();
    let cache = cache(
        dir.path(),
        &[("layer_262", locations_file), ("layer_203", areas_file)],
    );

    let locations = locations(&cache, false).await.unwrap();
    assert_eq!(locations.loknrs().collect::<Vec<_>>(), vec![10033, 13246, 31477]);

    let areas = areas(&cache, false).await.unwrap();
    assert_eq!(areas.len(), 2);
    assert_eq!(areas.get(10033).unwrap().properties["loknr"], 10033);
}

#[tokio::test]
async fn test_farm_report() {
    let locations_file = require_test_file!("farm_locations.geojson");
    let areas_file = require_test_file!("farm_areas.geojson");
    let dir = temp_cache_dir();
    let cache = cache(
        dir.path(),
        &[("layer_262", locations_file), ("layer_203", areas_file)],
    );

    let report = fetch_farm_report(&cache, 13246, false).await.unwrap();
    assert_eq!(report.location["navn"], "Hjartholm");
    assert_coords_approx_eq!(
        (
            report.location["longitude"].as_f64().unwrap(),
            report.location["latitude"].as_f64().unwrap()
        ),
        (5.4391, 60.5172),
        1e-12
    );
    assert_eq!(report.area["lokalitet"], "13246 Hjartholm");

    let yaml = report.to_yaml().unwrap();
    assert!(yaml.contains("kommune: Osterøy"));
    assert!(yaml.contains("arealtype: Akvakulturområde"));
}

#[tokio::test]
async fn test_farm_without_area_is_not_found() {
    let locations_file = require_test_file!("farm_locations.geojson");
    let areas_file = require_test_file!("farm_areas.geojson");
    let dir = temp_cache_dir();
    let cache = cache(
        dir.path(),
        &[("layer_262", locations_file), ("layer_203", areas_file)],
    );

    let result = fetch_farm_report(&cache, 31477, false).await;
    assert!(matches!(result, Err(LayerError::LocationNotFound(31477))));
    assert_eq!(result.unwrap_err().to_string(), "Location 31477 not found");
}

// ============================================================================
// Spawning areas
// ============================================================================

#[tokio::test]
async fn test_spawning_area_written_as_geojson() {
    let spawn_file = require_test_file!("spawn_torsk.geojson");
    let dir = temp_cache_dir();
    let layer = layer_for_species("torsk_nea");
    let cache = cache(&dir.path().join("cache"), &[(layer.as_str(), spawn_file)]);
    let outfile = dir.path().join("torsk.geojson");

    let selected = area(&cache, &layer, &DEFAULT_WMS_CODES, Some(&outfile)).await.unwrap();
    assert_eq!(selected.features.len(), 2);

    let written = FeatureCollection::read(&outfile).await.unwrap();
    assert_eq!(written, selected);
    let ids: Vec<i64> = written
        .features
        .iter()
        .filter_map(|feature| feature.integer_property("id"))
        .collect();
    assert_eq!(ids, vec![1, 3]);
}

#[tokio::test]
async fn test_spawning_area_with_several_codes() {
    let spawn_file = require_test_file!("spawn_torsk.geojson");
    let dir = temp_cache_dir();
    let cache = cache(dir.path(), &[("utbredelseskart:torsk_nea", spawn_file)]);

    let selected = area(&cache, "utbredelseskart:torsk_nea", &[10, 11], None).await.unwrap();
    assert_eq!(selected.features.len(), 3);
}

#[tokio::test]
async fn test_unknown_species() {
    let dir = temp_cache_dir();
    let cache = cache(dir.path(), &[]);

    let layer = layer_for_species("sjøorm");
    assert_eq!(layer, "sjøorm");
    let outfile = dir.path().join("out.geojson");
    let result = area(&cache, &layer, &DEFAULT_WMS_CODES, Some(&outfile)).await;
    assert!(matches!(result, Err(LayerError::UnknownSpecies(ref name)) if name == "sjøorm"));
    assert!(!outfile.exists());
}

// ============================================================================
// Coastlines
// ============================================================================

/// Returns fixed polygons and records what it was asked to clip.
struct FakeClipper {
    polygons: Vec<Polygon<f64>>,
    requests: Mutex<Vec<(PathBuf, (f64, f64), (f64, f64))>>,
}

#[async_trait]
impl CoastlineClipper for FakeClipper {
    async fn clip(
        &self,
        source: &Path,
        lat_range: (f64, f64),
        lon_range: (f64, f64),
    ) -> LayerResult<Vec<Polygon<f64>>> {
        self.requests
            .lock()
            .unwrap()
            .push((source.to_path_buf(), lat_range, lon_range));
        Ok(self.polygons.clone())
    }
}

fn island(x: f64, y: f64, size: f64) -> Polygon<f64> {
    Polygon::new(
        LineString::from(vec![(x, y), (x + size, y), (x + size, y + size), (x, y + size), (x, y)]),
        vec![],
    )
}

fn coast_config(dir: &Path, source: CoastSource) -> CoastConfig {
    let config = CoastConfig {
        data_dir: dir.to_path_buf(),
        ..CoastConfig::default()
    };
    let source_dir = config.source_dir(source);
    std::fs::create_dir_all(&source_dir).unwrap();
    std::fs::write(source_dir.join(format!("{}.shp", source.file_stem())), b"").unwrap();
    config
}

#[tokio::test]
async fn test_coastlines_merges_clipped_polygons() {
    let dir = temp_cache_dir();
    let config = coast_config(dir.path(), CoastSource::Kartverket);
    let clipper = FakeClipper {
        polygons: vec![island(5.0, 60.0, 0.2), island(5.1, 60.1, 0.2), island(6.0, 61.0, 0.1)],
        requests: Mutex::new(Vec::new()),
    };

    let dataset = coastlines(&clipper, &config, (59.0, 62.0), (4.0, 7.0), CoastSource::Kartverket)
        .await
        .unwrap();
    assert_eq!(dataset.dims()["patch_num"], 2);

    let sizes = &dataset.data_var("patchsize").unwrap().data;
    let total: f64 = sizes.iter().sum();
    assert_eq!(total as usize, dataset.dims()["node_num"]);

    let requests = clipper.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0],
        (
            config.source_dir(CoastSource::Kartverket).join("landomr4.shp"),
            (59.0, 62.0),
            (4.0, 7.0)
        )
    );
}

#[tokio::test]
async fn test_coastlines_without_land() {
    let dir = temp_cache_dir();
    let config = coast_config(dir.path(), CoastSource::Gshhs);
    let clipper = FakeClipper {
        polygons: Vec::new(),
        requests: Mutex::new(Vec::new()),
    };

    let dataset = coastlines(&clipper, &config, (70.0, 71.0), (0.0, 1.0), CoastSource::Gshhs)
        .await
        .unwrap();
    assert_eq!(dataset.dims()["node_num"], 0);
    assert_eq!(dataset.dims()["patch_num"], 0);
}

#[tokio::test]
async fn test_coastlines_missing_data() {
    let dir = temp_cache_dir();
    let config = CoastConfig {
        data_dir: dir.path().to_path_buf(),
        ..CoastConfig::default()
    };
    let clipper = FakeClipper {
        polygons: Vec::new(),
        requests: Mutex::new(Vec::new()),
    };

    let result = coastlines(&clipper, &config, (59.0, 60.0), (4.0, 5.0), CoastSource::Gshhs).await;
    assert!(matches!(result, Err(LayerError::CoastDataMissing(_))));
    assert!(clipper.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_coastlines_rejects_empty_box() {
    let dir = temp_cache_dir();
    let config = coast_config(dir.path(), CoastSource::Kartverket);
    let clipper = FakeClipper {
        polygons: Vec::new(),
        requests: Mutex::new(Vec::new()),
    };

    let result = coastlines(&clipper, &config, (60.0, 59.0), (4.0, 5.0), CoastSource::Kartverket).await;
    assert!(matches!(result, Err(LayerError::Geometry(_))));
}
