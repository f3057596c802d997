//! Prepare a topsApp interferogram directory for two dates on one track.
//!
//! Usage:
//!     prep-topsapp -i query.geojson -m 20160910 -s 20160724 -p 115 -n 1 2

use anyhow::{Context, Result};
use clap::Parser;
use insar_archive::core::interferogram::{prepare_interferogram, InterferogramRequest};
use insar_archive::core::topsapp::ProcessingOptions;
use insar_archive::io::{
    load_inventory, ExternalTools, OrbitListing, RecordingTools, RemoteListing, ShellTools, StaticListing,
};
use insar_archive::{ArchiveConfig, Snwe};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "prep-topsapp", about = "Prepare topsApp.py inputs for an interferogram")]
struct Cli {
    /// Inventory vector file (query.geojson)
    #[arg(short = 'i')]
    inventory: PathBuf,

    /// Master date
    #[arg(short = 'm')]
    master: String,

    /// Slave date
    #[arg(short = 's')]
    slave: String,

    /// Path/track/relative orbit number
    #[arg(short = 'p')]
    path: u32,

    /// Subswath numbers to process
    #[arg(short = 'n', num_args = 1..=3, default_values_t = [1u8, 2, 3], value_parser = clap::value_parser!(u8).range(1..=3))]
    swaths: Vec<u8>,

    /// Path to DEM file
    #[arg(short = 'd')]
    dem: Option<String>,

    /// Region of interest bbox
    #[arg(short = 'r', num_args = 4, value_names = ["S", "N", "W", "E"], allow_negative_numbers = true)]
    roi: Option<Vec<f64>>,

    /// Geocode bbox
    #[arg(short = 'g', num_args = 4, value_names = ["S", "N", "W", "E"], allow_negative_numbers = true)]
    gbox: Option<Vec<f64>>,

    /// TOML template with processing options
    #[arg(short = 't')]
    template: Option<PathBuf>,

    /// Pre-fetched orbit listing instead of the live directory page
    #[arg(long)]
    orbit_listing: Option<PathBuf>,

    /// Download auxiliary calibration files, scenes and orbit files
    #[arg(long)]
    download: bool,

    /// Print downloads instead of running them
    #[arg(long)]
    dry_run: bool,

    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = ArchiveConfig::resolve(cli.config.as_deref()).context("Failed to load configuration")?;
    let inventory = load_inventory(&cli.inventory)
        .with_context(|| format!("Failed to load inventory {}", cli.inventory.display()))?;

    let mut request = InterferogramRequest::new(&cli.master, &cli.slave, cli.path);
    request.swaths = cli.swaths;
    request.dem = cli.dem;
    request.roi = cli.roi.as_deref().map(Snwe::from_slice).transpose()?;
    request.gbox = cli.gbox.as_deref().map(Snwe::from_slice).transpose()?;
    request.download = cli.download;
    if let Some(template) = &cli.template {
        request.options = ProcessingOptions::load(template)?;
    }

    let listing: Box<dyn OrbitListing> = match &cli.orbit_listing {
        Some(file) => Box::new(StaticListing::new(file, &config.orbit_url)),
        None => Box::new(RemoteListing::new(&config.orbit_url, config.http_timeout())?),
    };

    let recorder = RecordingTools::new();
    let shell = ShellTools::new();
    let tools: &dyn ExternalTools = if cli.dry_run { &recorder } else { &shell };

    let plan = prepare_interferogram(&config, &inventory, &request, listing.as_ref(), tools)?;
    for call in recorder.calls() {
        println!("{:?}", call);
    }
    println!("Ready to run topsApp.py in {}", plan.int_dir.display());
    Ok(())
}
