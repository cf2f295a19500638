//! Find the location (and more) of an aquaculture site.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "farmloc")]
#[command(about = "FARMLOC\n   Find location (and more) for the specified farm")]
#[command(override_usage = "farmloc [--reload] loknr")]
struct Args {
    /// Location number of the farm
    loknr: String,

    /// Download the farm layers again instead of using the cache
    #[arg(long)]
    reload: bool,

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
    maps_cli::farmloc(&cache, &args.loknr, args.reload, &mut stdout).await
}
