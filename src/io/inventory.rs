//! Reading and writing scene inventories.
//!
//! Archive responses are JSON arrays whose first element holds the scene
//! dictionaries. Inventories are persisted as GeoJSON feature collections with
//! the scene footprint as geometry. Only raw attributes are authoritative on
//! reload; date-derived fields are recomputed.

use crate::core::inventory::{Inventory, Scene};
use crate::types::{ArchiveError, ArchiveResult, Footprint, SceneRecord, DERIVED_FIELDS};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Default name of the persisted inventory
pub const INVENTORY_FILE: &str = "query.geojson";
pub const DOWNLOAD_LINKS_FILE: &str = "download-links.txt";

#[derive(Debug, Serialize, Deserialize)]
struct FeatureCollection {
    #[serde(rename = "type")]
    kind: String,
    features: Vec<Feature>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: String,
    properties: Map<String, Value>,
    geometry: Value,
}

impl Feature {
    fn new(properties: Map<String, Value>, geometry: Value) -> Self {
        Self {
            kind: "Feature".to_string(),
            properties,
            geometry,
        }
    }
}

/// Parse an archive JSON response body into scenes, in response order
pub fn parse_asf_response(text: &str) -> ArchiveResult<Inventory> {
    let value: Value = serde_json::from_str(text)?;

    let scenes = match value {
        Value::Array(mut outer) if !outer.is_empty() => match outer.swap_remove(0) {
            Value::Array(scenes) => scenes,
            other => {
                return Err(ArchiveError::Parse(format!(
                    "Expected a list of scene dictionaries inside the response list, found {}",
                    json_type(&other)
                )))
            }
        },
        other => {
            return Err(ArchiveError::Parse(format!(
                "Expected a non-empty top-level list in archive response, found {}",
                json_type(&other)
            )))
        }
    };

    let scenes = scenes
        .into_iter()
        .enumerate()
        .map(|(i, raw)| {
            let record: SceneRecord = serde_json::from_value(raw)
                .map_err(|e| ArchiveError::Parse(format!("Scene {}: {}", i, e)))?;
            let wkt = record
                .extra
                .get("stringFootprint")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    ArchiveError::Parse(format!(
                        "Scene {} ({}): missing field `stringFootprint`",
                        i, record.granule_name
                    ))
                })?;
            let footprint = Footprint::from_wkt(wkt)?;
            Scene::derive(record, footprint)
        })
        .collect::<ArchiveResult<Vec<_>>>()?;

    Ok(Inventory::from_scenes(scenes))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(a) if a.is_empty() => "an empty list",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Load a per-platform archive response file
pub fn load_asf_json<P: AsRef<Path>>(path: P) -> ArchiveResult<Inventory> {
    log::info!("Loading archive response: {}", path.as_ref().display());
    let text = std::fs::read_to_string(&path)?;
    let inventory = parse_asf_response(&text)?;
    log::debug!("Loaded {} scenes", inventory.len());
    Ok(inventory)
}

/// Load two per-platform responses and concatenate them, first file first
pub fn merge_inventories<P: AsRef<Path>, Q: AsRef<Path>>(first: P, second: Q) -> ArchiveResult<Inventory> {
    let a = load_asf_json(first)?;
    let b = load_asf_json(second)?;
    Ok(Inventory::merge(a, b))
}

fn scene_properties(scene: &Scene) -> ArchiveResult<Map<String, Value>> {
    let mut properties = match serde_json::to_value(&scene.record)? {
        Value::Object(map) => map,
        _ => return Err(ArchiveError::Parse("Scene record did not serialize to an object".to_string())),
    };
    properties.insert("sceneDateString".to_string(), Value::from(scene.date_string.clone()));
    properties.insert("utc".to_string(), Value::from(scene.utc.clone()));
    properties.insert("orbitCode".to_string(), Value::from(scene.orbit_code));
    Ok(properties)
}

fn write_collection(path: &Path, features: Vec<Feature>) -> ArchiveResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let collection = FeatureCollection {
        kind: "FeatureCollection".to_string(),
        features,
    };
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, &collection)?;
    Ok(())
}

/// Persist an inventory as GeoJSON, replacing any existing file
pub fn save_inventory<P: AsRef<Path>>(inventory: &Inventory, path: P) -> ArchiveResult<()> {
    let features = inventory
        .iter()
        .map(|scene| Ok(Feature::new(scene_properties(scene)?, scene.footprint.to_geojson())))
        .collect::<ArchiveResult<Vec<_>>>()?;

    write_collection(path.as_ref(), features)?;
    log::info!("Saved inventory: {}", path.as_ref().display());
    Ok(())
}

/// Reload an inventory written by [`save_inventory`], sorted by relative orbit
pub fn load_inventory<P: AsRef<Path>>(path: P) -> ArchiveResult<Inventory> {
    log::info!("Loading inventory: {}", path.as_ref().display());
    let reader = BufReader::new(File::open(&path)?);
    let collection: FeatureCollection = serde_json::from_reader(reader)?;

    let scenes = collection
        .features
        .into_iter()
        .enumerate()
        .map(|(i, feature)| {
            let mut properties = feature.properties;
            for derived in DERIVED_FIELDS {
                properties.remove(derived);
            }
            let record: SceneRecord = serde_json::from_value(Value::Object(properties))
                .map_err(|e| ArchiveError::Parse(format!("Feature {}: {}", i, e)))?;
            let footprint = Footprint::from_geojson(&feature.geometry)?;
            Scene::derive(record, footprint)
        })
        .collect::<ArchiveResult<Vec<_>>>()?;

    let mut inventory = Inventory::from_scenes(scenes);
    inventory.sort_by_orbit();
    Ok(inventory)
}

/// Write `<dir>/<orbit>/<date>.geojson` for every acquisition date.
///
/// Each file holds the granule name, download URL and footprint of the
/// frames acquired on that date.
pub fn save_footprints<P: AsRef<Path>>(inventory: &Inventory, dir: P) -> ArchiveResult<Vec<PathBuf>> {
    let mut groups: BTreeMap<(u32, &str), Vec<&Scene>> = BTreeMap::new();
    for scene in inventory {
        groups
            .entry((scene.relative_orbit(), scene.date_string.as_str()))
            .or_default()
            .push(scene);
    }

    let mut written = Vec::with_capacity(groups.len());
    for ((orbit, date), scenes) in groups {
        let orbit_dir = dir.as_ref().join(orbit.to_string());
        std::fs::create_dir_all(&orbit_dir)?;

        let features = scenes
            .iter()
            .map(|scene| {
                let mut properties = Map::new();
                properties.insert("granuleName".to_string(), Value::from(scene.granule_name()));
                properties.insert("downloadUrl".to_string(), Value::from(scene.download_url()));
                Feature::new(properties, scene.footprint.to_geojson())
            })
            .collect();

        let path = orbit_dir.join(format!("{}.geojson", date));
        write_collection(&path, features)?;
        written.push(path);
    }

    log::info!("Saved {} footprint files under {}", written.len(), dir.as_ref().display());
    Ok(written)
}

/// Record download URLs in `download-links.txt`, one per line
pub fn write_download_links<P: AsRef<Path>>(urls: &[String], dir: P) -> ArchiveResult<PathBuf> {
    std::fs::create_dir_all(&dir)?;
    let path = dir.as_ref().join(DOWNLOAD_LINKS_FILE);
    std::fs::write(&path, urls.join("\n"))?;
    log::info!("Wrote {} links to {}", urls.len(), path.display());
    Ok(path)
}
