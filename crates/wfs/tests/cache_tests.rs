//! Cache behaviour with a fake downloader.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use test_utils::temp_cache_dir;
use wfs::{cache_key, LayerDownloader, ResourceCache, WfsConfig, WfsError, WfsResult};

/// Writes a small GeoJSON file and records every call.
#[derive(Default)]
struct FakeDownloader {
    calls: AtomicUsize,
    urls: Mutex<Vec<String>>,
    write_file: bool,
}

impl FakeDownloader {
    fn writing() -> Arc<Self> {
        Arc::new(Self {
            write_file: true,
            ..Self::default()
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LayerDownloader for FakeDownloader {
    async fn download(&self, layer: &str, url: &str, outfile: &Path) -> WfsResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url.to_string());
        if self.write_file {
            let body = format!(r#"{{"type":"FeatureCollection","name":"{}","features":[]}}"#, layer);
            tokio::fs::write(outfile, body).await?;
        }
        Ok(())
    }
}

fn cache(dir: &Path, downloader: Arc<FakeDownloader>) -> ResourceCache {
    let config = WfsConfig::default().with_cache_dir(dir.join("cache"));
    ResourceCache::new(config, downloader)
}

// ============================================================================
// Download rules
// ============================================================================

#[tokio::test]
async fn test_first_request_downloads() {
    let dir = temp_cache_dir();
    let downloader = FakeDownloader::writing();
    let cache = cache(dir.path(), downloader.clone());

    let path = cache.resource("layer_262", "fiskdir", false, None).await.unwrap();
    assert_eq!(downloader.calls(), 1);
    assert_eq!(path, dir.path().join("cache").join(cache_key("fiskdir", "layer_262")));
    assert!(path.exists());
    assert_eq!(
        downloader.urls.lock().unwrap()[0],
        "https://gis.fiskeridir.no/server/services/FiskeridirWFS/MapServer/WFSServer"
    );
}

#[tokio::test]
async fn test_cached_layer_is_reused() {
    let dir = temp_cache_dir();
    let downloader = FakeDownloader::writing();
    let cache = cache(dir.path(), downloader.clone());

    let first = cache.resource("layer_262", "fiskdir", false, None).await.unwrap();
    let second = cache.resource("layer_262", "fiskdir", false, None).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(downloader.calls(), 1);

    // A long expiry keeps the file
    cache
        .resource("layer_262", "fiskdir", false, Some(Duration::from_secs(3600)))
        .await
        .unwrap();
    assert_eq!(downloader.calls(), 1);
}

#[tokio::test]
async fn test_recompute_forces_download() {
    let dir = temp_cache_dir();
    let downloader = FakeDownloader::writing();
    let cache = cache(dir.path(), downloader.clone());

    cache.resource("layer_203", "fiskdir", false, None).await.unwrap();
    cache.resource("layer_203", "fiskdir", true, None).await.unwrap();
    assert_eq!(downloader.calls(), 2);
}

#[tokio::test]
async fn test_expired_layer_is_downloaded_again() {
    let dir = temp_cache_dir();
    let downloader = FakeDownloader::writing();
    let cache = cache(dir.path(), downloader.clone());

    cache.resource("layer_203", "fiskdir", false, None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    cache
        .resource("layer_203", "fiskdir", false, Some(Duration::from_millis(1)))
        .await
        .unwrap();
    assert_eq!(downloader.calls(), 2);
}

#[tokio::test]
async fn test_default_expiry_from_config() {
    let dir = temp_cache_dir();
    let downloader = FakeDownloader::writing();
    let mut config = WfsConfig::default().with_cache_dir(dir.path());
    config.default_expiry = Some(Duration::from_millis(1));
    let cache = ResourceCache::new(config, downloader.clone());

    cache.resource("layer_203", "fiskdir", false, None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    cache.resource("layer_203", "fiskdir", false, None).await.unwrap();
    assert_eq!(downloader.calls(), 2);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_missing_output_fails() {
    let dir = temp_cache_dir();
    let downloader = Arc::new(FakeDownloader::default());
    let cache = cache(dir.path(), downloader.clone());

    let result = cache.resource("layer_262", "fiskdir", false, None).await;
    match result {
        Err(WfsError::DownloadFailed { layer, server, .. }) => {
            assert_eq!(layer, "layer_262");
            assert_eq!(server, "fiskdir");
        }
        other => panic!("expected DownloadFailed, got {:?}", other),
    }
    assert_eq!(downloader.calls(), 1);
}

#[tokio::test]
async fn test_unknown_server() {
    let dir = temp_cache_dir();
    let downloader = FakeDownloader::writing();
    let cache = cache(dir.path(), downloader.clone());

    let result = cache.resource("layer_262", "geonorge", false, None).await;
    assert!(matches!(result, Err(WfsError::UnknownServer(_))));
    assert_eq!(downloader.calls(), 0);
}
