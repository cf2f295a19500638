//! Remote WFS layers cached on local disk.
//!
//! Layers are downloaded as GeoJSON with `ogr2ogr` (or any other
//! [`LayerDownloader`]) into a cache directory, under a file name derived
//! from the server and layer names.

pub mod cache;
pub mod capabilities;
pub mod config;
pub mod download;
pub mod error;
pub mod servers;

pub use cache::{cache_key, ResourceCache};
pub use capabilities::{find_layer, get_layer, parse_feature_types, CapabilitiesSource, FeatureType, HttpCapabilities};
pub use config::WfsConfig;
pub use download::{LayerDownloader, Ogr2OgrDownloader};
pub use error::{WfsError, WfsResult};
pub use servers::{server_url, SERVERS};
