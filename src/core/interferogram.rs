//! Interferogram directory preparation.
//!
//! Resolves scenes and precise orbits for a master/slave pair on one track,
//! records the download links, optionally fetches everything, and writes the
//! processor configuration into `int-<master>-<slave>/`.

use crate::config::ArchiveConfig;
use crate::core::inventory::Inventory;
use crate::core::resolve::{find_scenes, get_orbit_url};
use crate::core::topsapp::{ProcessingOptions, SceneComponent, TopsAppConfig, TOPSAPP_FILE};
use crate::io::external::ExternalTools;
use crate::io::inventory::write_download_links;
use crate::io::orbit_listing::OrbitListing;
use crate::types::{parse_user_date, ArchiveError, ArchiveResult, Snwe};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct InterferogramRequest {
    /// Master acquisition date as typed by the user
    pub master: String,
    pub slave: String,
    /// Relative orbit (path) of both dates
    pub path: u32,
    pub swaths: Vec<u8>,
    pub dem: Option<String>,
    pub roi: Option<Snwe>,
    pub gbox: Option<Snwe>,
    /// Fetch scenes and orbit files through the external tools
    pub download: bool,
    pub options: ProcessingOptions,
}

impl InterferogramRequest {
    pub fn new(master: &str, slave: &str, path: u32) -> Self {
        Self {
            master: master.to_string(),
            slave: slave.to_string(),
            path,
            swaths: vec![1, 2, 3],
            dem: None,
            roi: None,
            gbox: None,
            download: false,
            options: ProcessingOptions::default(),
        }
    }

    /// `int-<master>-<slave>`
    pub fn directory_name(&self) -> String {
        format!("int-{}-{}", self.master, self.slave)
    }
}

/// What [`prepare_interferogram`] resolved and wrote
#[derive(Debug, Clone)]
pub struct InterferogramPlan {
    pub int_dir: PathBuf,
    pub master_urls: Vec<String>,
    pub slave_urls: Vec<String>,
    /// Master orbit first, then slave orbit
    pub orbit_urls: Vec<String>,
    pub links_file: PathBuf,
    pub topsapp_xml: PathBuf,
    pub config: TopsAppConfig,
}

/// Archive file name at the end of a download URL
fn file_name_from_url(url: &str) -> String {
    url.rsplit('/').next().unwrap_or(url).to_string()
}

struct DateScenes {
    urls: Vec<String>,
    orbit_url: String,
}

fn resolve_date(
    inventory: &Inventory,
    date: &str,
    path: u32,
    listing: &dyn OrbitListing,
) -> ArchiveResult<DateScenes> {
    let day = parse_user_date(date)?;
    let lookup = find_scenes(inventory, day, path);
    // without scenes there is nothing to process
    let first = lookup.scenes().first().ok_or_else(|| {
        ArchiveError::LookupMiss(format!("No scenes on path {} for {}", path, date))
    })?;
    let orbit_url = get_orbit_url(first.granule_name(), listing)?;
    log::info!("SCENES for {}: {:?}", date, lookup.urls());
    Ok(DateScenes {
        urls: lookup.urls(),
        orbit_url,
    })
}

/// Build the interferogram directory for a master/slave pair.
///
/// Both dates must have scenes on the requested path and a matching precise
/// orbit file; either miss is a [`ArchiveError::LookupMiss`]. Existing files
/// in the directory are overwritten.
pub fn prepare_interferogram(
    config: &ArchiveConfig,
    inventory: &Inventory,
    request: &InterferogramRequest,
    listing: &dyn OrbitListing,
    tools: &dyn ExternalTools,
) -> ArchiveResult<InterferogramPlan> {
    let int_dir = config.output_dir.join(request.directory_name());
    std::fs::create_dir_all(&int_dir)?;
    log::info!("Preparing {}", int_dir.display());

    let master = resolve_date(inventory, &request.master, request.path, listing)?;
    let slave = resolve_date(inventory, &request.slave, request.path, listing)?;
    let orbit_urls = vec![master.orbit_url, slave.orbit_url];

    let mut links = master.urls.clone();
    links.extend(slave.urls.iter().cloned());
    links.extend(orbit_urls.iter().cloned());
    let links_file = write_download_links(&links, &int_dir)?;

    if request.download {
        tools.fetch_aux_calibration(&config.aux_cal_url, &config.aux_dir)?;
        for url in master.urls.iter().chain(&slave.urls) {
            tools.fetch(url, &int_dir)?;
        }
        for url in &orbit_urls {
            tools.fetch(url, &config.orbit_dir)?;
        }
    }

    let component = |urls: &[String], output_directory: &str| SceneComponent {
        safe: urls.iter().map(|u| file_name_from_url(u)).collect(),
        output_directory: output_directory.to_string(),
        orbit_directory: config.orbit_dir.to_string_lossy().into_owned(),
        auxiliary_data_directory: config.aux_dir.to_string_lossy().into_owned(),
        region_of_interest: request.roi,
        polarization: None,
    };

    let mut topsapp = TopsAppConfig::new(
        component(&master.urls, "masterdir"),
        component(&slave.urls, "slavedir"),
    );
    topsapp.swaths = request.swaths.clone();
    topsapp.geocode_bounding_box = request.gbox;
    topsapp.dem_filename = request.dem.clone();
    let topsapp = topsapp.with_options(&request.options);

    let topsapp_xml = int_dir.join(TOPSAPP_FILE);
    topsapp.write_xml(&topsapp_xml)?;
    log::info!("Ready to run topsApp.py in {}", int_dir.display());

    Ok(InterferogramPlan {
        int_dir,
        master_urls: master.urls,
        slave_urls: slave.urls,
        orbit_urls,
        links_file,
        topsapp_xml,
        config: topsapp,
    })
}
