//! Download the spawning area of a species to a GeoJSON file.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use map_layers::DEFAULT_WMS_CODES;

#[derive(Parser, Debug)]
#[command(name = "gyteomr")]
#[command(about = "GYTEOMR\n   Download spawning area to geojson file")]
#[command(override_usage = "gyteomr [--wms-codes code1,code2,...] \"species\" out.geojson")]
#[command(after_help = "By default, only wms code 10 (\"gyteområde\") is included.")]
struct Args {
    /// Species name (see the list printed for an unknown species) or layer name
    species: String,

    /// Output GeoJSON file
    outfile: PathBuf,

    /// Comma-separated WMS codes of the areas to keep
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_WMS_CODES.to_vec())]
    wms_codes: Vec<i64>,

    /// Cache directory for downloaded layers
    #[arg(long, env = "IMR_MAPS_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    maps_cli::init_tracing(&args.log_level)?;

    let cache = maps_cli::resource_cache(args.cache_dir)?;
    let mut stdout = std::io::stdout().lock();
    maps_cli::gyteomr(&cache, &args.species, &args.outfile, &args.wms_codes, &mut stdout).await
}
