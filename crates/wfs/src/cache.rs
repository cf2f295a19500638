//! On-disk cache of downloaded layers.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use crate::config::WfsConfig;
use crate::download::{LayerDownloader, Ogr2OgrDownloader};
use crate::error::{WfsError, WfsResult};
use crate::servers::server_url;

/// Cache file name of a layer: the hex SHA-256 of the server name followed
/// by the layer name.
pub fn cache_key(server: &str, layer: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(server.as_bytes());
    hasher.update(layer.as_bytes());
    hex::encode(hasher.finalize())
}

/// Downloads layers on demand and keeps them in a cache directory.
#[derive(Clone)]
pub struct ResourceCache {
    config: WfsConfig,
    downloader: Arc<dyn LayerDownloader>,
}

impl std::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ResourceCache {
    pub fn new(config: WfsConfig, downloader: Arc<dyn LayerDownloader>) -> Self {
        Self { config, downloader }
    }

    /// A cache that downloads with `ogr2ogr`.
    pub fn with_ogr2ogr(config: WfsConfig) -> Self {
        let downloader = Arc::new(Ogr2OgrDownloader::new(&config));
        Self::new(config, downloader)
    }

    pub fn config(&self) -> &WfsConfig {
        &self.config
    }

    /// Path a layer is cached at.
    pub fn path(&self, layer: &str, server: &str) -> PathBuf {
        self.config.cache_dir.join(cache_key(server, layer))
    }

    /// Local file holding `layer` from the named `server`.
    ///
    /// The layer is downloaded when `recompute` is set, when it is not
    /// cached yet, or when it is older than `expires` (or the configured
    /// default expiry).
    #[instrument(skip(self))]
    pub async fn resource(
        &self,
        layer: &str,
        server: &str,
        recompute: bool,
        expires: Option<Duration>,
    ) -> WfsResult<PathBuf> {
        let url = server_url(server)?;
        tokio::fs::create_dir_all(&self.config.cache_dir).await?;
        let outfile = self.path(layer, server);

        let expires = expires.or(self.config.default_expiry);
        if needs_download(&outfile, recompute, expires).await? {
            self.downloader.download(layer, url, &outfile).await?;
        } else {
            debug!(path = %outfile.display(), "Using cached layer");
        }

        if !tokio::fs::try_exists(&outfile).await? {
            return Err(WfsError::DownloadFailed {
                layer: layer.to_string(),
                server: server.to_string(),
                reason: format!("{} was not created", outfile.display()),
            });
        }
        Ok(outfile)
    }
}

async fn needs_download(path: &Path, recompute: bool, expires: Option<Duration>) -> WfsResult<bool> {
    if recompute {
        return Ok(true);
    }
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(true),
        Err(e) => return Err(e.into()),
    };
    let Some(expires) = expires else {
        return Ok(false);
    };

    let modified: DateTime<Utc> = metadata.modified()?.into();
    let age = (Utc::now() - modified).to_std().unwrap_or(Duration::ZERO);
    let stale = age > expires;
    if stale {
        info!(
            path = %path.display(),
            age_secs = age.as_secs_f64(),
            expires_secs = expires.as_secs_f64(),
            "Cached layer expired"
        );
    }
    Ok(stale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key() {
        // sha256("fiskdirlayer_262")
        let key = cache_key("fiskdir", "layer_262");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(key, cache_key("fiskdirlayer", "_262"));
        assert_ne!(key, cache_key("imr_fisk", "layer_262"));
    }

    #[test]
    fn test_cache_key_known_value() {
        assert_eq!(
            cache_key("", ""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[tokio::test]
    async fn test_needs_download_rules() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layer");
        assert!(needs_download(&path, false, None).await.unwrap());

        std::fs::write(&path, "{}").unwrap();
        assert!(!needs_download(&path, false, None).await.unwrap());
        assert!(needs_download(&path, true, None).await.unwrap());
        assert!(!needs_download(&path, false, Some(Duration::from_secs(3600))).await.unwrap());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(needs_download(&path, false, Some(Duration::from_millis(1))).await.unwrap());
    }
}
