//! Query the archive for Sentinel-1 scenes over a region of interest.
//!
//! Usage:
//!     get-inventory -r 46.5 46.6 -120.5 -120.4
//!     get-inventory -i aoi.shp -b 0.1 -f

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use insar_archive::core::summary::summarize_inventory;
use insar_archive::io::inventory::INVENTORY_FILE;
use insar_archive::io::{
    bounds_from_vector, merge_inventories, save_footprints, save_inventory, write_inventory_summary,
    write_orbit_acquisitions, write_snwe_files, ArchiveClient,
};
use insar_archive::{ArchiveConfig, OutputFormat, Snwe};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "get-inventory", about = "Query the SAR archive for Sentinel-1 SLC scenes")]
struct Cli {
    /// Region of interest bounds
    #[arg(short = 'r', num_args = 4, value_names = ["S", "N", "W", "E"], allow_negative_numbers = true)]
    roi: Option<Vec<f64>>,

    /// Vector file whose features define the region of interest
    #[arg(short = 'i')]
    input: Option<PathBuf>,

    /// Buffer around the vector region, in degrees
    #[arg(short = 'b', allow_negative_numbers = true)]
    buffer: Option<f64>,

    /// Save per-date footprint GeoJSON files
    #[arg(short = 'f')]
    footprints: bool,

    /// Also save KML query results
    #[arg(short = 'k')]
    kml: bool,

    /// Also save CSV query results
    #[arg(short = 'c')]
    csv: bool,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = ArchiveConfig::resolve(cli.config.as_deref()).context("Failed to load configuration")?;

    let snwe = match (&cli.roi, &cli.input) {
        (Some(bounds), _) => Snwe::from_slice(bounds)?,
        (None, Some(vector)) => bounds_from_vector(vector, cli.buffer)
            .with_context(|| format!("Failed to read bounds from {}", vector.display()))?,
        (None, None) => {
            eprintln!("ERROR: must specify a vector file (-i) or bounds (-r)");
            Cli::command().print_help()?;
            std::process::exit(1);
        }
    };
    log::info!("Region of interest: {}", snwe);

    let out = config.output_dir.clone();
    write_snwe_files(&snwe, &out)?;

    let client = ArchiveClient::new(&config)?;
    let (s1a, s1b) = client
        .query_platforms(&snwe, OutputFormat::Json)
        .context("Archive query failed")?;
    let inventory = merge_inventories(&s1a, &s1b)?;

    let summary = summarize_inventory(&inventory, config.frame_size_gb);
    write_inventory_summary(&summary, &out)?;
    write_orbit_acquisitions(&inventory, &out)?;
    save_inventory(&inventory, out.join(INVENTORY_FILE))?;

    if cli.footprints {
        save_footprints(&inventory, &out)?;
    }
    if cli.kml {
        client.query_platforms(&snwe, OutputFormat::Kml)?;
    }
    if cli.csv {
        client.query_platforms(&snwe, OutputFormat::Csv)?;
    }

    Ok(())
}
