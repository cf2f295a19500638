//! Map layers built on the WFS cache.
//!
//! - [`farms`]: aquaculture sites and their areas from the Directorate of
//!   Fisheries
//! - [`spawn`]: spawning areas of fish species from the Institute of Marine
//!   Research
//! - [`coast`]: land polygons clipped to a lat/lon box and merged into a CF
//!   ragged-array dataset

pub mod coast;
pub mod error;
pub mod farms;
pub mod geojson;
pub mod spawn;

pub use coast::{coastlines, merged_areas, CoastConfig, CoastSource, CoastlineClipper, Ogr2OgrClipper};
pub use error::{LayerError, LayerResult};
pub use farms::{areas, farm_report, fetch_farm_report, locations, FarmRecord, FarmReport, FarmTable};
pub use geojson::{Feature, FeatureCollection, Geometry};
pub use spawn::{area, filter_wms_codes, layer_for_species, DEFAULT_WMS_CODES, SPAWN_SERVER, SPECIES};
