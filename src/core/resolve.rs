//! Download URL lookups for scenes and precise orbit files.
//!
//! The two lookups fail differently on purpose. A date/orbit pair with no
//! scenes is an ordinary answer (`SceneLookup::NotFound`, or an empty URL list)
//! and callers check for it. A granule without a precise orbit file cannot be
//! processed at all, so the orbit lookup returns `ArchiveError::LookupMiss`.

use crate::core::inventory::{Inventory, Scene};
use crate::io::orbit_listing::OrbitListing;
use crate::types::{parse_user_date, ArchiveError, ArchiveResult};
use chrono::{Duration, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

/// Outcome of a scene lookup
#[derive(Debug, Clone, PartialEq)]
pub enum SceneLookup<'a> {
    Found(Vec<&'a Scene>),
    NotFound,
}

impl<'a> SceneLookup<'a> {
    pub fn is_found(&self) -> bool {
        matches!(self, SceneLookup::Found(_))
    }

    pub fn scenes(&self) -> &[&'a Scene] {
        match self {
            SceneLookup::Found(scenes) => scenes,
            SceneLookup::NotFound => &[],
        }
    }

    pub fn urls(&self) -> Vec<String> {
        self.scenes().iter().map(|s| s.download_url().to_string()).collect()
    }
}

/// Scenes acquired on `date` along `relative_orbit`, in inventory order
pub fn find_scenes(inventory: &Inventory, date: NaiveDate, relative_orbit: u32) -> SceneLookup<'_> {
    let scenes: Vec<&Scene> = inventory
        .for_orbit(relative_orbit)
        .filter(|s| s.date == date)
        .collect();

    if scenes.is_empty() {
        log::warn!("No scenes found for {} on path {}", date, relative_orbit);
        SceneLookup::NotFound
    } else {
        log::debug!("Found {} scene(s) for {} on path {}", scenes.len(), date, relative_orbit);
        SceneLookup::Found(scenes)
    }
}

/// Download URLs for a date string (`YYYYMMDD`, `YYYY-MM-DD` or `YYYY/MM/DD`).
///
/// No match yields an empty list; only an unreadable date is an error.
pub fn get_slc_urls(inventory: &Inventory, date: &str, relative_orbit: u32) -> ArchiveResult<Vec<String>> {
    let date = parse_user_date(date)?;
    Ok(find_scenes(inventory, date, relative_orbit).urls())
}

/// Satellite and acquisition day embedded in a granule name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GranuleInfo {
    /// `S1A` or `S1B`
    pub satellite: String,
    pub acquisition_date: NaiveDate,
}

fn granule_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // e.g. S1B_IW_SLC__1SDV_20171117T015310_20171117T015337_008315_00EB6C_40CA
    RE.get_or_init(|| {
        Regex::new(r"^(S1[AB])_[A-Z0-9]{2}_[A-Z_]{4}_[A-Z0-9]{4}_(\d{8})T\d{6}")
            .expect("valid granule pattern")
    })
}

fn orbit_file_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // e.g. S1B_OPER_AUX_POEORB_OPOD_20171207T111412_V20171116T225942_20171118T005942.EOF
    RE.get_or_init(|| {
        Regex::new(r"^(S1[AB])_OPER_AUX_(POEORB|RESORB)_OPOD_\d{8}T\d{6}_V(\d{8})T\d{6}_(\d{8})T\d{6}\.EOF$")
            .expect("valid orbit file pattern")
    })
}

pub fn parse_granule(granule: &str) -> ArchiveResult<GranuleInfo> {
    let caps = granule_regex()
        .captures(granule)
        .ok_or_else(|| ArchiveError::Parse(format!("Unrecognized granule name: {}", granule)))?;
    let acquisition_date = NaiveDate::parse_from_str(&caps[2], "%Y%m%d")
        .map_err(|e| ArchiveError::Parse(format!("Bad date in granule {}: {}", granule, e)))?;
    Ok(GranuleInfo {
        satellite: caps[1].to_string(),
        acquisition_date,
    })
}

/// Fields of a precise orbit file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrbitFileName {
    pub name: String,
    pub satellite: String,
    pub orbit_type: String,
    /// First day of the validity window
    pub start: NaiveDate,
    pub stop: NaiveDate,
}

impl OrbitFileName {
    /// Parse a listing entry; hrefs with a path keep only the final component
    pub fn parse(entry: &str) -> Option<Self> {
        let name = entry.trim().rsplit('/').next()?;
        let caps = orbit_file_regex().captures(name)?;
        Some(Self {
            name: name.to_string(),
            satellite: caps[1].to_string(),
            orbit_type: caps[2].to_string(),
            start: NaiveDate::parse_from_str(&caps[3], "%Y%m%d").ok()?,
            stop: NaiveDate::parse_from_str(&caps[4], "%Y%m%d").ok()?,
        })
    }
}

/// Pick the orbit file for a granule from listing entries.
///
/// Precise orbit files start the day before the acquisitions they cover. The
/// first matching entry in listing order wins. Entries that do not look like
/// orbit file names are skipped.
pub fn select_orbit_file(granule: &str, entries: &[String]) -> ArchiveResult<OrbitFileName> {
    let info = parse_granule(granule)?;
    let day_before = info.acquisition_date - Duration::days(1);
    log::info!("Looking up orbit for {}, {}", info.satellite, info.acquisition_date.format("%Y%m%d"));

    let mut skipped = 0usize;
    let found = entries
        .iter()
        .filter_map(|entry| {
            let parsed = OrbitFileName::parse(entry);
            if parsed.is_none() && !entry.trim().is_empty() {
                skipped += 1;
            }
            parsed
        })
        .find(|orbit| orbit.satellite == info.satellite && orbit.start == day_before);

    if skipped > 0 {
        log::debug!("Skipped {} listing entries that are not orbit files", skipped);
    }

    found.ok_or_else(|| {
        ArchiveError::LookupMiss(format!(
            "No {} orbit file starting {} for granule {}",
            info.satellite,
            day_before.format("%Y%m%d"),
            granule
        ))
    })
}

/// Full URL of the precise orbit file for `granule`
pub fn get_orbit_url(granule: &str, listing: &dyn OrbitListing) -> ArchiveResult<String> {
    let entries = listing.entries()?;
    let orbit = select_orbit_file(granule, &entries)?;
    let url = format!("{}/{}", listing.base_url().trim_end_matches('/'), orbit.name);
    log::info!("Matched orbit file: {}", url);
    Ok(url)
}
