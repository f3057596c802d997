//! CSV output of the inventory statistics.

use crate::core::inventory::Inventory;
use crate::core::summary::{summarize_orbits, InventorySummary};
use crate::types::{ArchiveResult, RevisitRow};
use std::path::{Path, PathBuf};

pub const SUMMARY_FILE: &str = "inventory_summary.csv";

/// `acquisitions_<orbit>.csv`
pub fn acquisitions_file_name(orbit: u32) -> String {
    format!("acquisitions_{}.csv", orbit)
}

fn write_rows<T: serde::Serialize>(path: &Path, rows: &[T]) -> ArchiveResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write `inventory_summary.csv` in `dir`, one row per relative orbit
pub fn write_inventory_summary<P: AsRef<Path>>(summary: &InventorySummary, dir: P) -> ArchiveResult<PathBuf> {
    std::fs::create_dir_all(&dir)?;
    let path = dir.as_ref().join(SUMMARY_FILE);
    write_rows(&path, &summary.orbits)?;
    log::info!("Saved {}", path.display());
    Ok(path)
}

/// Write one revisit table per relative orbit
pub fn write_revisit_table<P: AsRef<Path>>(orbit: u32, rows: &[RevisitRow], dir: P) -> ArchiveResult<PathBuf> {
    std::fs::create_dir_all(&dir)?;
    let path = dir.as_ref().join(acquisitions_file_name(orbit));
    write_rows(&path, rows)?;
    log::info!("Saving {} ...", path.display());
    Ok(path)
}

/// Compute and write `acquisitions_<orbit>.csv` for every orbit, ascending
pub fn write_orbit_acquisitions<P: AsRef<Path>>(inventory: &Inventory, dir: P) -> ArchiveResult<Vec<PathBuf>> {
    summarize_orbits(inventory)
        .iter()
        .map(|(orbit, rows)| write_revisit_table(*orbit, rows, dir.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::inventory::tests::scene;
    use crate::core::summary::summarize_inventory;

    #[test]
    fn test_table_headers() {
        let inventory = Inventory::from_scenes(vec![
            scene("a", "2018-03-20 23:28:21", 120, "Sentinel-1B"),
            scene("b", "2018-03-08 23:28:20", 120, "Sentinel-1A"),
        ]);
        let dir = tempfile::tempdir().unwrap();

        let summary_path = write_inventory_summary(&summarize_inventory(&inventory, 5.0), dir.path()).unwrap();
        let text = std::fs::read_to_string(summary_path).unwrap();
        assert_eq!(
            text,
            "Orbit,Start,Stop,Dates,Frames,Direction,UTC\n120,2018-03-08,2018-03-20,2,2,ASCENDING,23:28:21\n"
        );

        let paths = write_orbit_acquisitions(&inventory, dir.path()).unwrap();
        assert_eq!(paths, vec![dir.path().join("acquisitions_120.csv")]);
        let text = std::fs::read_to_string(&paths[0]).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(",sceneDateString,platform,dt,nFrames"));
        assert_eq!(lines.next(), Some("0,2018-03-08,Sentinel-1A,0,1"));
        assert_eq!(lines.next(), Some("1,2018-03-20,Sentinel-1B,12,1"));
    }
}
