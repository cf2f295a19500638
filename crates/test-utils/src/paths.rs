//! Locating recorded layers and scratch cache directories.

use std::path::PathBuf;

/// Returns the workspace root directory.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    // crates/test-utils -> workspace root
    manifest_dir
        .ancestors()
        .nth(2)
        .map(PathBuf::from)
        .unwrap_or(manifest_dir)
}

/// Looks for a recorded layer in `TEST_DATA_DIR`, then in
/// `crates/map-layers/testdata/` and the workspace-level `testdata/`.
pub fn find_test_file(name: &str) -> Option<PathBuf> {
    let root = workspace_root();
    std::env::var_os("TEST_DATA_DIR")
        .map(|dir| PathBuf::from(dir).join(name))
        .into_iter()
        .chain([
            root.join("crates/map-layers/testdata").join(name),
            root.join("testdata").join(name),
        ])
        .find(|path| path.exists())
}

/// A scratch directory to hold a layer cache, removed on drop.
pub fn temp_cache_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("imr_maps_cache_")
        .tempdir()
        .expect("Failed to create a scratch cache directory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_root_is_valid() {
        let root = workspace_root();
        assert!(root.join("Cargo.toml").exists(), "no Cargo.toml in {:?}", root);
        assert!(root.join("crates/map-layers").is_dir());
    }

    #[test]
    fn test_recorded_layers_are_found() {
        let path = find_test_file("farm_locations.geojson").unwrap();
        assert!(path.ends_with("farm_locations.geojson"));
        assert!(find_test_file("no_such_layer.geojson").is_none());
    }

    #[test]
    fn test_temp_cache_dir() {
        let dir = temp_cache_dir();
        assert!(dir.path().is_dir());
        assert!(dir
            .path()
            .file_name()
            .and_then(|name| name.to_str())
            .map_or(false, |name| name.starts_with("imr_maps_cache_")));
    }
}
