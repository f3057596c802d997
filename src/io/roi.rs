use crate::types::{ArchiveResult, Snwe};
use gdal::spatial_ref::{CoordTransform, SpatialRef};
use gdal::vector::{Geometry, LayerAccess, OGRwkbGeometryType};
use gdal::Dataset;
use std::path::{Path, PathBuf};

/// Number of segments per quarter circle when buffering
const BUFFER_QUAD_SEGMENTS: u32 = 30;

fn wgs84() -> ArchiveResult<SpatialRef> {
    let srs = SpatialRef::from_epsg(4326)?;
    // lon/lat ordering, matching GeoJSON and the SNWE convention
    srs.set_axis_mapping_strategy(gdal_sys::OSRAxisMappingStrategy::OAMS_TRADITIONAL_GIS_ORDER);
    Ok(srs)
}

/// Bounding box of every geometry in an OGR vector file.
///
/// Geometries are reprojected to EPSG:4326, their convex hull is optionally
/// buffered by `buffer` degrees, and the envelope is returned as SNWE. Layers
/// without a spatial reference are taken to be geographic already. The result
/// is not clamped to valid latitude/longitude ranges.
pub fn bounds_from_vector<P: AsRef<Path>>(path: P, buffer: Option<f64>) -> ArchiveResult<Snwe> {
    log::info!("Reading region of interest from {}", path.as_ref().display());
    let dataset = Dataset::open(path.as_ref())?;
    let target = wgs84()?;

    let mut collection = Geometry::empty(OGRwkbGeometryType::wkbGeometryCollection)?;
    let mut count = 0usize;

    for mut layer in dataset.layers() {
        let transform = match layer.spatial_ref() {
            Some(source) => {
                source.set_axis_mapping_strategy(gdal_sys::OSRAxisMappingStrategy::OAMS_TRADITIONAL_GIS_ORDER);
                Some(CoordTransform::new(&source, &target)?)
            }
            None => {
                log::warn!("Layer '{}' has no spatial reference, assuming EPSG:4326", layer.name());
                None
            }
        };

        for feature in layer.features() {
            let Some(geometry) = feature.geometry() else {
                continue;
            };
            let geometry = match &transform {
                Some(ct) => geometry.transform(ct)?,
                None => geometry.clone(),
            };
            collection.add_geometry(geometry)?;
            count += 1;
        }
    }
    log::debug!("Collected {} geometries", count);

    let hull = collection.convex_hull()?;
    let shape = match buffer {
        Some(distance) if distance != 0.0 => {
            log::debug!("Buffering convex hull by {} degrees", distance);
            hull.buffer(distance, BUFFER_QUAD_SEGMENTS)?
        }
        _ => hull,
    };

    let envelope = shape.envelope();
    Snwe::new(envelope.MinY, envelope.MaxY, envelope.MinX, envelope.MaxX)
}

/// Record a region of interest as `snwe.json`, `snwe.wkt` and `snwe.txt`
pub fn write_snwe_files<P: AsRef<Path>>(snwe: &Snwe, dir: P) -> ArchiveResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let json_path = dir.join("snwe.json");
    std::fs::write(&json_path, serde_json::to_string(&snwe.to_geojson())?)?;

    let wkt_path = dir.join("snwe.wkt");
    std::fs::write(&wkt_path, snwe.to_wkt())?;

    let txt_path = dir.join("snwe.txt");
    std::fs::write(&txt_path, snwe.to_string())?;

    log::info!("Saved region of interest {} in {}", snwe, dir.display());
    Ok(vec![json_path, wkt_path, txt_path])
}
