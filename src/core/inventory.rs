use crate::types::{
    parse_scene_datetime, ArchiveResult, FlightDirection, Footprint, SceneRecord,
};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{BTreeSet, HashSet};

/// A granule with the fields derived from its raw `sceneDate`.
///
/// Derived fields are recomputed every time a scene is loaded and are never
/// read back from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub record: SceneRecord,
    pub footprint: Footprint,
    pub timestamp: NaiveDateTime,
    /// Acquisition day, used for equality matching against user dates
    pub date: NaiveDate,
    /// `YYYY-MM-DD`
    pub date_string: String,
    /// `HH:MM:SS`
    pub utc: String,
    /// Position of the relative orbit among the inventory's distinct orbits
    pub orbit_code: usize,
}

impl Scene {
    pub fn derive(record: SceneRecord, footprint: Footprint) -> ArchiveResult<Self> {
        let timestamp = parse_scene_datetime(&record.scene_date)?;
        let date = timestamp.date();
        Ok(Self {
            date_string: date.format("%Y-%m-%d").to_string(),
            utc: timestamp.format("%H:%M:%S").to_string(),
            timestamp,
            date,
            orbit_code: 0,
            record,
            footprint,
        })
    }

    pub fn granule_name(&self) -> &str {
        &self.record.granule_name
    }

    pub fn relative_orbit(&self) -> u32 {
        self.record.relative_orbit
    }

    pub fn flight_direction(&self) -> FlightDirection {
        self.record.flight_direction
    }

    pub fn platform(&self) -> &str {
        &self.record.platform
    }

    pub fn download_url(&self) -> &str {
        &self.record.download_url
    }
}

/// Ordered collection of scenes exchanged between all components
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    scenes: Vec<Scene>,
}

impl Inventory {
    pub fn from_scenes(scenes: Vec<Scene>) -> Self {
        let mut inventory = Self { scenes };
        inventory.assign_orbit_codes();
        inventory
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Scene> {
        self.scenes.iter()
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Distinct relative orbits in ascending order
    pub fn orbits(&self) -> Vec<u32> {
        self.scenes
            .iter()
            .map(|s| s.relative_orbit())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct platforms in order of first appearance
    pub fn platforms(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.scenes
            .iter()
            .filter(|s| seen.insert(s.platform()))
            .map(|s| s.platform().to_string())
            .collect()
    }

    pub fn for_orbit(&self, orbit: u32) -> impl Iterator<Item = &Scene> {
        self.scenes.iter().filter(move |s| s.relative_orbit() == orbit)
    }

    /// Stable sort by relative orbit, as persisted inventories are presented
    pub fn sort_by_orbit(&mut self) {
        self.scenes.sort_by_key(|s| s.relative_orbit());
    }

    /// Concatenate two inventories, `first` rows before `second` rows.
    ///
    /// Granules present in both are kept twice; the count is logged.
    pub fn merge(first: Inventory, second: Inventory) -> Inventory {
        log::info!(
            "Merging inventories ({} + {} scenes)",
            first.len(),
            second.len()
        );

        let names: HashSet<&str> = first.iter().map(|s| s.granule_name()).collect();
        let repeated = second.iter().filter(|s| names.contains(s.granule_name())).count();
        if repeated > 0 {
            log::warn!("{} granule(s) appear in both inventories and were not deduplicated", repeated);
        }

        let mut scenes = first.scenes;
        scenes.extend(second.scenes);
        Self::from_scenes(scenes)
    }

    fn assign_orbit_codes(&mut self) {
        let orbits = self.orbits();
        for scene in &mut self.scenes {
            // orbits is sorted and contains every scene's orbit
            scene.orbit_code = orbits
                .binary_search(&scene.record.relative_orbit)
                .unwrap_or_default();
        }
    }
}

impl<'a> IntoIterator for &'a Inventory {
    type Item = &'a Scene;
    type IntoIter = std::slice::Iter<'a, Scene>;

    fn into_iter(self) -> Self::IntoIter {
        self.scenes.iter()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::BTreeMap;

    pub(crate) fn scene(granule: &str, date: &str, orbit: u32, platform: &str) -> Scene {
        let record = SceneRecord {
            granule_name: granule.to_string(),
            scene_date: date.to_string(),
            relative_orbit: orbit,
            flight_direction: FlightDirection::Ascending,
            platform: platform.to_string(),
            download_url: format!("https://datapool.example.com/SLC/{}.zip", granule),
            extra: BTreeMap::new(),
        };
        let footprint = Footprint {
            rings: vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]],
        };
        Scene::derive(record, footprint).unwrap()
    }

    #[test]
    fn test_derived_fields() {
        let s = scene("g1", "2018-03-20 23:28:21", 120, "Sentinel-1B");
        assert_eq!(s.date_string, "2018-03-20");
        assert_eq!(s.utc, "23:28:21");
        assert_eq!(s.date, NaiveDate::from_ymd_opt(2018, 3, 20).unwrap());
    }

    #[test]
    fn test_orbit_codes_follow_sorted_orbits() {
        let inventory = Inventory::from_scenes(vec![
            scene("a", "2018-03-20 23:28:21", 120, "Sentinel-1B"),
            scene("b", "2018-03-21 01:00:00", 18, "Sentinel-1A"),
            scene("c", "2018-03-22 01:00:00", 120, "Sentinel-1A"),
        ]);
        let codes: Vec<usize> = inventory.iter().map(|s| s.orbit_code).collect();
        assert_eq!(codes, vec![1, 0, 1]);
        assert_eq!(inventory.orbits(), vec![18, 120]);
        assert_eq!(inventory.platforms(), vec!["Sentinel-1B", "Sentinel-1A"]);
    }

    #[test]
    fn test_merge_preserves_order_and_duplicates() {
        let a = Inventory::from_scenes(vec![
            scene("a1", "2018-03-20 23:28:21", 120, "Sentinel-1A"),
            scene("a2", "2018-03-26 23:28:21", 120, "Sentinel-1A"),
        ]);
        let b = Inventory::from_scenes(vec![
            scene("b1", "2018-03-14 23:28:21", 18, "Sentinel-1B"),
            scene("a1", "2018-03-20 23:28:21", 120, "Sentinel-1A"),
        ]);

        let merged = Inventory::merge(a, b);
        let names: Vec<&str> = merged.iter().map(|s| s.granule_name()).collect();
        assert_eq!(names, vec!["a1", "a2", "b1", "a1"]);
        // codes are recomputed across both inputs
        assert_eq!(merged.scenes()[2].orbit_code, 0);
        assert_eq!(merged.scenes()[0].orbit_code, 1);
    }
}
