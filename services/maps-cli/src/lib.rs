//! Shared pieces of the `farmloc` and `gyteomr` tools.
//!
//! Both tools print their results and user-facing messages to the given
//! writer and log to stderr, so stdout can be piped.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use map_layers::{area, fetch_farm_report, layer_for_species, LayerError, SPECIES};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use wfs::{ResourceCache, WfsConfig};

/// Install a stderr logger. `RUST_LOG` takes precedence over `log_level`.
pub fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install logger: {}", e))
}

/// Cache configured from the environment, with an optional directory
/// override.
pub fn resource_cache(cache_dir: Option<PathBuf>) -> Result<ResourceCache> {
    let mut config = WfsConfig::from_env();
    if let Some(dir) = cache_dir {
        config = config.with_cache_dir(dir);
    }
    config.validate().map_err(|e| anyhow!("invalid configuration: {}", e))?;
    Ok(ResourceCache::with_ogr2ogr(config))
}

/// The species table as printed after an unknown species.
pub fn species_listing() -> String {
    let mut listing = String::from("Valid species include: \n");
    for (name, layer) in SPECIES {
        listing.push_str(&format!("  - {} ({})\n", name, layer));
    }
    listing
}

/// Print the YAML report of the farm numbered `loknr`.
pub async fn farmloc(cache: &ResourceCache, loknr: &str, reload: bool, out: &mut dyn Write) -> Result<()> {
    let Ok(loknr) = loknr.trim().parse::<i64>() else {
        writeln!(out, "Location number must be an integer")?;
        return Ok(());
    };

    match fetch_farm_report(cache, loknr, reload).await {
        Ok(report) => writeln!(out, "{}", report.to_yaml()?)?,
        Err(LayerError::LocationNotFound(loknr)) => writeln!(out, "Location {} not found", loknr)?,
        Err(e) => return Err(e).context("Failed to load the aquaculture layers"),
    }
    Ok(())
}

/// Write the spawning areas of `species` to `outfile`.
pub async fn gyteomr(
    cache: &ResourceCache,
    species: &str,
    outfile: &Path,
    wms_codes: &[i64],
    out: &mut dyn Write,
) -> Result<()> {
    let layer = layer_for_species(species);
    match area(cache, &layer, wms_codes, Some(outfile)).await {
        Ok(selected) => {
            info!(
                layer = %layer,
                features = selected.features.len(),
                outfile = %outfile.display(),
                "Saved spawning areas"
            );
        }
        Err(LayerError::UnknownSpecies(_)) => {
            writeln!(out, "Unknown species: {}\n", species)?;
            write!(out, "{}", species_listing())?;
        }
        Err(e) => return Err(e).with_context(|| format!("Failed to load layer {}", layer)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_species_listing() {
        let listing = species_listing();
        assert!(listing.starts_with("Valid species include: \n"));
        assert!(listing.contains("  - laks (utbredelseskart:Laks)\n"));
        assert_eq!(listing.lines().count(), SPECIES.len() + 1);
    }
}
