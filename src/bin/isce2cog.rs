//! Convert a processor output raster into a cloud-optimized GeoTIFF.
//!
//! Usage:
//!     isce2cog -i merged/phsig.cor.geo.vrt -c cpt/ -n

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use insar_archive::core::cog::{convert_to_cog, CogRequest};
use insar_archive::io::{ExternalTools, ShellTools};
use insar_archive::ArchiveConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "isce2cog", about = "Convert ISCE output to a cloud-optimized GeoTIFF")]
struct Cli {
    /// Input image file
    #[arg(short = 'i')]
    input: PathBuf,

    /// Band of the input image
    #[arg(short = 'b', default_value_t = 1)]
    band: u32,

    /// Output file
    #[arg(short = 'o')]
    output: Option<PathBuf>,

    /// Directory with cpt colormaps, missing ones are generated; creates colored RGB images
    #[arg(short = 'c')]
    cpt_dir: Option<PathBuf>,

    /// Create image thumbnail
    #[arg(short = 'n')]
    thumbnail: bool,

    /// Sync the output directory to the configured S3 bucket
    #[arg(long)]
    upload: bool,

    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = ArchiveConfig::resolve(cli.config.as_deref()).context("Failed to load configuration")?;
    let tools = ShellTools::new();

    let mut request = CogRequest::new(&cli.input);
    request.band = cli.band;
    request.output = cli.output;
    request.cpt_dir = cli.cpt_dir;
    request.thumbnail = cli.thumbnail;

    let outputs = convert_to_cog(&tools, &request)
        .with_context(|| format!("Failed to convert {}", cli.input.display()))?;
    log::info!("Created {}", outputs.cog.display());

    if cli.upload {
        let bucket = config
            .s3_bucket
            .as_deref()
            .ok_or_else(|| anyhow!("--upload requires s3_bucket in the configuration"))?;
        let dir = outputs
            .cog
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        tools.sync_to_object_store(&dir, bucket)?;
    }

    Ok(())
}
