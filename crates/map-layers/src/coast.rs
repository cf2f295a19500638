//! Coastlines clipped to a lat/lon box.
//!
//! Land polygons are read from a local copy of a coastline data set
//! (Kartverket's high-resolution land areas or the GSHHS full-resolution
//! shorelines), clipped with `ogr2ogr` and merged so that touching patches
//! form one outline. The result is a CF ragged-array dataset: node
//! coordinates along `node_num` and the node count of each patch along
//! `patch_num`.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use cf_dataset::{DataType, Dataset, Variable};
use geo::{BooleanOps, MultiPolygon, Polygon};
use ndarray::Array1;
use tokio::process::Command;
use tracing::{debug, info, instrument};
use wfs::WfsConfig;

use crate::error::{LayerError, LayerResult};
use crate::geojson::FeatureCollection;

/// Coastline data sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoastSource {
    /// Kartverket land areas (high resolution)
    #[default]
    Kartverket,
    /// GSHHS level 1 shorelines (low resolution)
    Gshhs,
}

impl CoastSource {
    pub fn name(&self) -> &'static str {
        match self {
            CoastSource::Kartverket => "kartverket",
            CoastSource::Gshhs => "gshhs",
        }
    }

    /// Stem of the source files in the data directory.
    pub fn file_stem(&self) -> &'static str {
        match self {
            CoastSource::Kartverket => "landomr4",
            CoastSource::Gshhs => "GSHHS_f_L1",
        }
    }
}

impl fmt::Display for CoastSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CoastSource {
    type Err = LayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kartverket" => Ok(CoastSource::Kartverket),
            "gshhs" => Ok(CoastSource::Gshhs),
            _ => Err(LayerError::UnknownCoastSource(s.to_string())),
        }
    }
}

/// Where coastline data is kept and how it is clipped.
#[derive(Debug, Clone, PartialEq)]
pub struct CoastConfig {
    /// Directory with one subdirectory per [`CoastSource`]
    pub data_dir: PathBuf,

    /// `ogr2ogr` executable
    pub ogr2ogr_path: PathBuf,
}

impl Default for CoastConfig {
    fn default() -> Self {
        Self::under(&WfsConfig::default())
    }
}

impl CoastConfig {
    /// Coastline data in the `coast` directory of the layer cache.
    pub fn under(wfs: &WfsConfig) -> Self {
        Self {
            data_dir: wfs.cache_dir.join("coast"),
            ogr2ogr_path: wfs.ogr2ogr_path.clone(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::under(&WfsConfig::from_env());

        if let Ok(val) = std::env::var("COAST_DATA_DIR") {
            if !val.is_empty() {
                config.data_dir = PathBuf::from(val);
            }
        }

        config
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.data_dir.as_os_str().is_empty() {
            return Err("data_dir must not be empty".to_string());
        }
        if self.ogr2ogr_path.as_os_str().is_empty() {
            return Err("ogr2ogr_path must not be empty".to_string());
        }
        Ok(())
    }

    pub fn source_dir(&self, source: CoastSource) -> PathBuf {
        self.data_dir.join(source.name())
    }

    /// The file to clip for `source`: the first shapefile in its
    /// directory, else the first file of any kind.
    pub fn source_file(&self, source: CoastSource) -> LayerResult<PathBuf> {
        let dir = self.source_dir(source);
        if !dir.is_dir() {
            return Err(LayerError::CoastDataMissing(dir));
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect();
        files.sort();

        let shapefile = files
            .iter()
            .find(|path| path.extension().is_some_and(|ext| ext == "shp"))
            .cloned();
        shapefile
            .or_else(|| files.into_iter().next())
            .ok_or(LayerError::CoastDataMissing(dir))
    }
}

/// Something that can cut land polygons out of a coastline file.
#[async_trait]
pub trait CoastlineClipper: Send + Sync {
    /// Polygons of `source` inside the box, in lon/lat degrees.
    async fn clip(
        &self,
        source: &Path,
        lat_range: (f64, f64),
        lon_range: (f64, f64),
    ) -> LayerResult<Vec<Polygon<f64>>>;
}

/// Clips with `ogr2ogr -spat ... -clipsrc spat_extent`.
#[derive(Debug, Clone)]
pub struct Ogr2OgrClipper {
    program: PathBuf,
}

impl Ogr2OgrClipper {
    pub fn new(config: &CoastConfig) -> Self {
        Self {
            program: config.ogr2ogr_path.clone(),
        }
    }

    pub fn args(
        &self,
        source: &Path,
        outfile: &Path,
        lat_range: (f64, f64),
        lon_range: (f64, f64),
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-f", "GeoJSON", "-spat"].iter().map(OsString::from).collect();
        for bound in [lon_range.0, lat_range.0, lon_range.1, lat_range.1] {
            args.push(OsString::from(bound.to_string()));
        }
        args.push(OsString::from("-clipsrc"));
        args.push(OsString::from("spat_extent"));
        args.push(outfile.as_os_str().to_owned());
        args.push(source.as_os_str().to_owned());
        args
    }
}

#[async_trait]
impl CoastlineClipper for Ogr2OgrClipper {
    #[instrument(skip(self), fields(program = %self.program.display()))]
    async fn clip(
        &self,
        source: &Path,
        lat_range: (f64, f64),
        lon_range: (f64, f64),
    ) -> LayerResult<Vec<Polygon<f64>>> {
        let workdir = tempfile::Builder::new().prefix("clip_layer_").tempdir()?;
        let outfile = workdir.path().join("clip_layer.geojson");

        let output = Command::new(&self.program)
            .args(self.args(source, &outfile, lat_range, lon_range))
            .output()
            .await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LayerError::ClipFailed(format!(
                "ogr2ogr exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let polygons = FeatureCollection::read(&outfile).await?.polygons()?;
        debug!(polygons = polygons.len(), "Clipped coastline");
        Ok(polygons)
    }
}

/// Merge overlapping polygons and store their outlines as a CF ragged
/// array: `latitude` and `longitude` along `node_num`, and `patchsize`
/// (nodes per patch) along `patch_num`. Holes are dropped.
pub fn merged_areas(polygons: Vec<Polygon<f64>>) -> LayerResult<Dataset> {
    let merged = polygons
        .into_iter()
        .fold(MultiPolygon::new(Vec::new()), |acc, polygon| {
            acc.union(&MultiPolygon::new(vec![polygon]))
        });

    let mut longitudes = Vec::new();
    let mut latitudes = Vec::new();
    let mut sizes = Vec::with_capacity(merged.0.len());
    for polygon in &merged {
        let ring = polygon.exterior();
        sizes.push(ring.0.len() as f64);
        for coord in ring.coords() {
            longitudes.push(coord.x);
            latitudes.push(coord.y);
        }
    }

    let latitude = Variable::new(&["node_num"], Array1::from(latitudes))?
        .with_attr("standard_name", "latitude")
        .with_attr("units", "degrees_north");
    let longitude = Variable::new(&["node_num"], Array1::from(longitudes))?
        .with_attr("standard_name", "longitude")
        .with_attr("units", "degrees_east");
    let patchsize = Variable::new(&["patch_num"], Array1::from(sizes))?
        .with_dtype(DataType::Int32)
        .with_attr("sample_dimension", "node_num");

    Ok(Dataset::new()
        .with_data_var("latitude", latitude)?
        .with_data_var("longitude", longitude)?
        .with_data_var("patchsize", patchsize)?)
}

/// Land patches of `source` inside the box.
#[instrument(skip(clipper, config))]
pub async fn coastlines(
    clipper: &dyn CoastlineClipper,
    config: &CoastConfig,
    lat_range: (f64, f64),
    lon_range: (f64, f64),
    source: CoastSource,
) -> LayerResult<Dataset> {
    if !(lat_range.0 < lat_range.1 && lon_range.0 < lon_range.1) {
        return Err(LayerError::Geometry(format!(
            "empty box: latitude {:?}, longitude {:?}",
            lat_range, lon_range
        )));
    }

    let file = config.source_file(source)?;
    let polygons = clipper.clip(&file, lat_range, lon_range).await?;
    let clipped = polygons.len();
    let dataset = merged_areas(polygons)?;
    info!(
        source = %source,
        clipped,
        patches = dataset.dims().get("patch_num").copied().unwrap_or(0),
        "Built coastlines"
    );
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::LineString;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]),
            vec![],
        )
    }

    fn sizes(dataset: &Dataset) -> Vec<f64> {
        dataset.data_var("patchsize").unwrap().data.iter().copied().collect()
    }

    #[test]
    fn test_source_names() {
        assert_eq!("kartverket".parse::<CoastSource>().unwrap(), CoastSource::Kartverket);
        assert_eq!("GSHHS".parse::<CoastSource>().unwrap(), CoastSource::Gshhs);
        assert!(matches!(
            "osm".parse::<CoastSource>(),
            Err(LayerError::UnknownCoastSource(_))
        ));
        assert_eq!(CoastSource::default().to_string(), "kartverket");
    }

    #[test]
    fn test_clip_args() {
        let clipper = Ogr2OgrClipper::new(&CoastConfig::default());
        let args = clipper.args(
            Path::new("/data/landomr4.shp"),
            Path::new("/tmp/out.geojson"),
            (59.0, 61.5),
            (4.0, 6.0),
        );
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            [
                "-f", "GeoJSON", "-spat", "4", "59", "6", "61.5", "-clipsrc", "spat_extent",
                "/tmp/out.geojson", "/data/landomr4.shp"
            ]
        );
    }

    #[test]
    fn test_merged_areas_disjoint() {
        let dataset = merged_areas(vec![rect(0.0, 0.0, 1.0, 1.0), rect(5.0, 5.0, 6.0, 6.0)]).unwrap();
        assert_eq!(dataset.dims()["patch_num"], 2);
        assert_eq!(dataset.dims()["node_num"], 10);
        assert_eq!(sizes(&dataset), vec![5.0, 5.0]);
    }

    #[test]
    fn test_merged_areas_overlapping() {
        let dataset = merged_areas(vec![rect(0.0, 0.0, 2.0, 1.0), rect(1.0, 0.0, 3.0, 1.0)]).unwrap();
        assert_eq!(dataset.dims()["patch_num"], 1);
        let lons = &dataset.data_var("longitude").unwrap().data;
        let min = lons.iter().copied().fold(f64::INFINITY, f64::min);
        let max = lons.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert_eq!((min, max), (0.0, 3.0));
    }

    #[test]
    fn test_merged_areas_attributes() {
        let dataset = merged_areas(vec![rect(4.0, 59.0, 5.0, 60.0)]).unwrap();
        let lat = dataset.data_var("latitude").unwrap();
        assert_eq!(lat.text_attr("standard_name"), Some("latitude"));
        assert_eq!(lat.text_attr("units"), Some("degrees_north"));
        let lon = dataset.data_var("longitude").unwrap();
        assert_eq!(lon.text_attr("units"), Some("degrees_east"));
        let patchsize = dataset.data_var("patchsize").unwrap();
        assert_eq!(patchsize.text_attr("sample_dimension"), Some("node_num"));
        assert_eq!(patchsize.dtype, DataType::Int32);

        // Rings are closed
        let lats = &lat.data;
        assert_eq!(lats[0], lats[lats.len() - 1]);
    }

    #[test]
    fn test_merged_areas_empty() {
        let dataset = merged_areas(Vec::new()).unwrap();
        assert_eq!(dataset.dims()["node_num"], 0);
        assert_eq!(dataset.dims()["patch_num"], 0);
    }

    #[test]
    fn test_source_file_prefers_shapefile() {
        let dir = tempfile::tempdir().unwrap();
        let config = CoastConfig {
            data_dir: dir.path().to_path_buf(),
            ..CoastConfig::default()
        };
        assert!(matches!(
            config.source_file(CoastSource::Gshhs),
            Err(LayerError::CoastDataMissing(_))
        ));

        let source_dir = config.source_dir(CoastSource::Gshhs);
        std::fs::create_dir_all(&source_dir).unwrap();
        for name in ["GSHHS_f_L1.dbf", "GSHHS_f_L1.shp", "GSHHS_f_L1.shx"] {
            std::fs::write(source_dir.join(name), b"").unwrap();
        }
        assert_eq!(
            config.source_file(CoastSource::Gshhs).unwrap(),
            source_dir.join("GSHHS_f_L1.shp")
        );
    }
}
