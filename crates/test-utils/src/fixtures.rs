//! Common test fixtures for imr-maps tests.
//!
//! Reference values were computed independently of this workspace and are
//! good to at least 1e-6 degrees or millimetres.

use cf_dataset::{Dataset, Variable};
use ndarray::{arr1, Array2};

use crate::generators::create_test_field;

/// Grid corners of NorKyst800 with their WGS 84 (lon, lat) positions.
pub mod nk800 {
    /// ((x, y) in cells, (lon, lat) in degrees)
    pub const CORNERS: [((f64, f64), (f64, f64)); 4] = [
        ((0.0, 0.0), (9.194590110, 55.908369930)),
        ((1000.0, 0.0), (16.70710853, 61.91497602)),
        ((1000.0, 500.0), (10.04516874, 63.91826663)),
        ((0.0, 500.0), (3.43554155, 57.47693917)),
    ];
}

/// The 2x3 latitude/longitude grid used for the UTM zone 31 tests.
pub mod utm31 {
    pub const LATITUDES: [f64; 2] = [59.0, 60.0];
    pub const LONGITUDES: [f64; 3] = [4.0, 5.0, 6.0];

    /// Eastings over (lat, lon), truncated to whole metres
    pub const EASTINGS: [[f64; 3]; 2] = [
        [557450.0, 614893.0, 672319.0],
        [555776.0, 611544.0, 667294.0],
    ];

    /// Northings over (lat, lon), truncated to whole metres
    pub const NORTHINGS: [[f64; 3]; 2] = [
        [6540481.0, 6541771.0, 6543920.0],
        [6651832.0, 6653097.0, 6655205.0],
    ];
}

/// A dataset with 1-D `lat` and `lon` index coordinates and a `temp` data
/// variable over (lat, lon). No reference frame is attached.
pub fn lat_lon_dataset(lats: &[f64], lons: &[f64]) -> Dataset {
    build_dataset(
        Variable::new(&["lat"], arr1(lats)),
        Variable::new(&["lon"], arr1(lons)),
        Variable::new(&["lat", "lon"], create_test_field(lats.len(), lons.len())),
    )
}

/// The 2x3 grid of [`utm31`] as a lat/lon dataset.
pub fn sample_dataset() -> Dataset {
    lat_lon_dataset(&utm31::LATITUDES, &utm31::LONGITUDES)
}

/// A dataset with 2-D `lat` and `lon` auxiliary coordinates over
/// (row, col) and a `temp` data variable.
pub fn curvilinear_dataset(lats: Array2<f64>, lons: Array2<f64>) -> Dataset {
    let (rows, cols) = lats.dim();
    build_dataset(
        Variable::new(&["row", "col"], lats),
        Variable::new(&["row", "col"], lons),
        Variable::new(&["row", "col"], create_test_field(rows, cols)),
    )
}

fn build_dataset(
    lat: cf_dataset::CfResult<Variable>,
    lon: cf_dataset::CfResult<Variable>,
    temp: cf_dataset::CfResult<Variable>,
) -> Dataset {
    let build = || -> cf_dataset::CfResult<Dataset> {
        Dataset::new()
            .with_coord("lat", lat?)?
            .with_coord("lon", lon?)?
            .with_data_var("temp", temp?)
    };
    match build() {
        Ok(dataset) => dataset,
        Err(e) => panic!("Failed to build test dataset: {}", e),
    }
}
