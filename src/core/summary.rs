//! Per-orbit acquisition statistics.
//!
//! Both tables are recomputed from scratch on every call and depend only on
//! the inventory contents, so repeated runs produce identical output.

use crate::core::inventory::{Inventory, Scene};
use crate::types::{OrbitSummary, RevisitRow};
use std::collections::{BTreeMap, HashMap};
use chrono::NaiveDate;

/// Summary table plus the archive size estimate derived from it
#[derive(Debug, Clone, PartialEq)]
pub struct InventorySummary {
    /// One row per relative orbit, highest orbit first
    pub orbits: Vec<OrbitSummary>,
    pub total_frames: usize,
    /// `total_frames * frame_size_gb`, in terabytes
    pub size_tb: f64,
}

/// Group scenes by relative orbit, keeping inventory order inside each group
fn group_by_orbit(inventory: &Inventory) -> BTreeMap<u32, Vec<&Scene>> {
    let mut groups: BTreeMap<u32, Vec<&Scene>> = BTreeMap::new();
    for scene in inventory {
        groups.entry(scene.relative_orbit()).or_default().push(scene);
    }
    groups
}

fn summarize_group(orbit: u32, scenes: &[&Scene]) -> Option<OrbitSummary> {
    let first = scenes.first()?;
    let start = scenes.iter().map(|s| s.date_string.as_str()).min()?;
    let stop = scenes.iter().map(|s| s.date_string.as_str()).max()?;
    let mut dates: Vec<&str> = scenes.iter().map(|s| s.date_string.as_str()).collect();
    dates.sort_unstable();
    dates.dedup();

    Some(OrbitSummary {
        orbit,
        start: start.to_string(),
        stop: stop.to_string(),
        dates: dates.len(),
        frames: scenes.len(),
        // assumed constant along a track
        direction: first.flight_direction(),
        utc: first.utc.clone(),
    })
}

/// First/last date, date and frame counts, direction and UTC time per orbit
pub fn summarize_inventory(inventory: &Inventory, frame_size_gb: f64) -> InventorySummary {
    let mut orbits: Vec<OrbitSummary> = group_by_orbit(inventory)
        .iter()
        .filter_map(|(orbit, scenes)| summarize_group(*orbit, scenes))
        .collect();
    orbits.reverse();

    let total_frames: usize = orbits.iter().map(|o| o.frames).sum();
    let size_tb = total_frames as f64 * frame_size_gb / 1e3;

    for row in &orbits {
        log::info!(
            "Orbit {:>3}  {} .. {}  dates={:<4} frames={:<4} {} {}",
            row.orbit, row.start, row.stop, row.dates, row.frames, row.direction, row.utc
        );
    }
    log::info!("Approximate archive size = {} Tb", size_tb);

    InventorySummary { orbits, total_frames, size_tb }
}

/// Revisit intervals for one relative orbit.
///
/// One representative scene per date (first occurrence wins), sorted by date;
/// `dt` is the day gap to the previous date and is 0 for the first row.
pub fn revisit_statistics(inventory: &Inventory, orbit: u32) -> Vec<RevisitRow> {
    let mut frames_per_date: HashMap<&str, usize> = HashMap::new();
    let mut representatives: Vec<&Scene> = Vec::new();

    for scene in inventory.for_orbit(orbit) {
        let count = frames_per_date.entry(scene.date_string.as_str()).or_insert(0);
        if *count == 0 {
            representatives.push(scene);
        }
        *count += 1;
    }

    representatives.sort_by(|a, b| a.date_string.cmp(&b.date_string));

    let mut previous: Option<NaiveDate> = None;
    representatives
        .iter()
        .enumerate()
        .map(|(index, scene)| {
            let dt = previous.map_or(0, |prev| (scene.date - prev).num_days());
            previous = Some(scene.date);
            RevisitRow {
                index,
                scene_date: scene.date_string.clone(),
                platform: scene.platform().to_string(),
                dt,
                n_frames: frames_per_date[scene.date_string.as_str()],
            }
        })
        .collect()
}

/// Revisit tables for every relative orbit in the inventory
pub fn summarize_orbits(inventory: &Inventory) -> BTreeMap<u32, Vec<RevisitRow>> {
    inventory
        .orbits()
        .into_iter()
        .map(|orbit| (orbit, revisit_statistics(inventory, orbit)))
        .collect()
}
