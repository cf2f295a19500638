//! Layer downloads.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, instrument};

use crate::config::WfsConfig;
use crate::error::{WfsError, WfsResult};

/// Something that can copy a WFS layer to a local file.
#[async_trait]
pub trait LayerDownloader: Send + Sync {
    /// Write `layer` from the WFS endpoint `url` to `outfile`.
    async fn download(&self, layer: &str, url: &str, outfile: &Path) -> WfsResult<()>;
}

/// Downloads layers as GeoJSON by running `ogr2ogr`.
#[derive(Debug, Clone)]
pub struct Ogr2OgrDownloader {
    program: PathBuf,
    page_size: u32,
}

impl Ogr2OgrDownloader {
    pub fn new(config: &WfsConfig) -> Self {
        Self {
            program: config.ogr2ogr_path.clone(),
            page_size: config.page_size,
        }
    }

    /// Command-line arguments for one download.
    pub fn args(&self, layer: &str, url: &str, outfile: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        let page_size = self.page_size.to_string();
        for (key, value) in [
            // Skip fetching every layer definition up front
            ("OGR_WFS_LOAD_MULTIPLE_LAYER_DEFN", "NO"),
            ("OGR_WFS_PAGING_ALLOWED", "YES"),
            ("OGR_WFS_PAGE_SIZE", page_size.as_str()),
        ] {
            args.push(OsString::from("--config"));
            args.push(OsString::from(key));
            args.push(OsString::from(value));
        }
        args.push(OsString::from("-f"));
        args.push(OsString::from("GeoJSON"));
        args.push(outfile.as_os_str().to_owned());
        args.push(OsString::from(format!("WFS:{}", url)));
        args.push(OsString::from(layer));
        args
    }
}

#[async_trait]
impl LayerDownloader for Ogr2OgrDownloader {
    #[instrument(skip(self, outfile), fields(program = %self.program.display()))]
    async fn download(&self, layer: &str, url: &str, outfile: &Path) -> WfsResult<()> {
        info!(layer = %layer, url = %url, "Downloading WFS layer");

        // The GeoJSON driver refuses to overwrite an existing file
        if tokio::fs::try_exists(outfile).await? {
            tokio::fs::remove_file(outfile).await?;
        }

        let output = Command::new(&self.program)
            .args(self.args(layer, url, outfile))
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WfsError::DownloadFailed {
                layer: layer.to_string(),
                server: url.to_string(),
                reason: format!("ogr2ogr exited with {}: {}", output.status, stderr.trim()),
            });
        }

        debug!(outfile = %outfile.display(), "ogr2ogr finished");
        Ok(())
    }
}
