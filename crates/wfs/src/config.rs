//! Configuration for the WFS cache.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Name of the cache directory under the user data directory.
const CACHE_DIR_NAME: &str = "imr_maps";

/// Configuration for downloading and caching WFS layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WfsConfig {
    /// Directory holding downloaded layers.
    pub cache_dir: PathBuf,

    /// `ogr2ogr` executable.
    pub ogr2ogr_path: PathBuf,

    /// Features per WFS request when paging.
    pub page_size: u32,

    /// Age after which a cached layer is downloaded again, when the caller
    /// gives no expiry of its own.
    pub default_expiry: Option<Duration>,
}

impl Default for WfsConfig {
    fn default() -> Self {
        Self {
            cache_dir: writable_location(
                std::env::var("XDG_DATA_HOME").ok().as_deref(),
                std::env::var("HOME").ok().as_deref(),
            ),
            ogr2ogr_path: PathBuf::from("ogr2ogr"),
            page_size: 10_000,
            default_expiry: None,
        }
    }
}

/// User data directory for the cache, following the XDG base directory
/// rules: `$XDG_DATA_HOME/imr_maps`, else `~/.local/share/imr_maps`.
pub fn writable_location(xdg_data_home: Option<&str>, home: Option<&str>) -> PathBuf {
    let data_home = match xdg_data_home.filter(|dir| !dir.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None => Path::new(home.unwrap_or(".")).join(".local").join("share"),
    };
    data_home.join(CACHE_DIR_NAME)
}

impl WfsConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("IMR_MAPS_CACHE_DIR") {
            if !val.is_empty() {
                config.cache_dir = PathBuf::from(val);
            }
        }

        if let Ok(val) = std::env::var("OGR2OGR_PATH") {
            if !val.is_empty() {
                config.ogr2ogr_path = PathBuf::from(val);
            }
        }

        if let Ok(val) = std::env::var("WFS_PAGE_SIZE") {
            if let Ok(size) = val.parse() {
                config.page_size = size;
            }
        }

        if let Ok(val) = std::env::var("WFS_CACHE_EXPIRES_SECS") {
            if let Ok(secs) = val.parse::<f64>() {
                config.default_expiry = Duration::try_from_secs_f64(secs).ok();
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.page_size == 0 {
            return Err("page_size must be > 0".to_string());
        }

        if self.ogr2ogr_path.as_os_str().is_empty() {
            return Err("ogr2ogr_path must not be empty".to_string());
        }

        if self.cache_dir.as_os_str().is_empty() {
            return Err("cache_dir must not be empty".to_string());
        }

        Ok(())
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }
}
