use chrono::{NaiveDate, NaiveDateTime};
use gdal::vector::Geometry;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Date-time layouts the archive has used for `sceneDate`
const SCENE_DATE_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.fZ",
];

/// Date layouts accepted from users (`20180320`, `2018-03-20`, `2018/03/20`)
const USER_DATE_FORMATS: [&str; 3] = ["%Y%m%d", "%Y-%m-%d", "%Y/%m/%d"];

/// Attributes computed at load time. They may be written out for convenience
/// but are always recomputed from `sceneDate` when read back.
pub const DERIVED_FIELDS: [&str; 5] = ["timeStamp", "sceneDateString", "dateStamp", "utc", "orbitCode"];

/// Satellite pass direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FlightDirection {
    #[serde(rename = "ASCENDING")]
    Ascending,
    #[serde(rename = "DESCENDING")]
    Descending,
}

impl std::fmt::Display for FlightDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlightDirection::Ascending => write!(f, "ASCENDING"),
            FlightDirection::Descending => write!(f, "DESCENDING"),
        }
    }
}

/// Sentinel-1 platform selector used for archive queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Sentinel1A,
    Sentinel1B,
}

impl Platform {
    /// Code accepted by the archive `platform` parameter
    pub fn code(&self) -> &'static str {
        match self {
            Platform::Sentinel1A => "S1A",
            Platform::Sentinel1B => "S1B",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::str::FromStr for Platform {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "S1A" | "SA" | "SENTINEL-1A" => Ok(Platform::Sentinel1A),
            "S1B" | "SB" | "SENTINEL-1B" => Ok(Platform::Sentinel1B),
            _ => Err(ArchiveError::Parse(format!("Unknown platform: {}", s))),
        }
    }
}

/// Response format of the archive search API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
    Kml,
    Metalink,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Kml => "kml",
            OutputFormat::Metalink => "metalink",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Region of interest as South, North, West, East bounds in decimal degrees.
///
/// Boxes crossing the antimeridian are not supported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Snwe {
    pub south: f64,
    pub north: f64,
    pub west: f64,
    pub east: f64,
}

impl Snwe {
    pub fn new(south: f64, north: f64, west: f64, east: f64) -> ArchiveResult<Self> {
        if !(south < north) || !(west < east) {
            return Err(ArchiveError::Parse(format!(
                "Invalid SNWE bounds [{}, {}, {}, {}]: requires S < N and W < E",
                south, north, west, east
            )));
        }
        Ok(Self { south, north, west, east })
    }

    pub fn from_slice(values: &[f64]) -> ArchiveResult<Self> {
        match values {
            [s, n, w, e] => Self::new(*s, *n, *w, *e),
            _ => Err(ArchiveError::Parse(format!(
                "Expected 4 bounds (S N W E), got {}",
                values.len()
            ))),
        }
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.south, self.north, self.west, self.east]
    }

    /// Closed exterior ring, counter-clockwise from the south-east corner
    pub fn ring(&self) -> Vec<[f64; 2]> {
        vec![
            [self.east, self.south],
            [self.east, self.north],
            [self.west, self.north],
            [self.west, self.south],
            [self.east, self.south],
        ]
    }

    pub fn to_wkt(&self) -> String {
        let coords: Vec<String> = self
            .ring()
            .iter()
            .map(|[x, y]| format!("{} {}", x, y))
            .collect();
        format!("POLYGON (({}))", coords.join(", "))
    }

    pub fn to_geojson(&self) -> Value {
        json!({
            "type": "Polygon",
            "coordinates": [self.ring()],
        })
    }
}

impl std::fmt::Display for Snwe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{:.3}, {:.3}, {:.3}, {:.3}]",
            self.south, self.north, self.west, self.east
        )
    }
}

/// Scene footprint polygon in WGS84 (lon, lat) order
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    pub rings: Vec<Vec<[f64; 2]>>,
}

impl Footprint {
    /// Parse a WKT polygon such as the archive's `stringFootprint`
    pub fn from_wkt(wkt: &str) -> ArchiveResult<Self> {
        let geometry = Geometry::from_wkt(wkt)
            .map_err(|e| ArchiveError::Parse(format!("Invalid footprint WKT '{}': {}", wkt, e)))?;

        let rings: Vec<Vec<[f64; 2]>> = (0..geometry.geometry_count())
            .map(|i| {
                geometry
                    .get_geometry(i)
                    .get_point_vec()
                    .into_iter()
                    .map(|(x, y, _)| [x, y])
                    .collect()
            })
            .collect();

        if rings.is_empty() || rings[0].is_empty() {
            return Err(ArchiveError::Parse(format!("Footprint has no exterior ring: {}", wkt)));
        }
        Ok(Self { rings })
    }

    /// Read a GeoJSON `Polygon` geometry object
    pub fn from_geojson(value: &Value) -> ArchiveResult<Self> {
        #[derive(Deserialize)]
        struct PolygonGeometry {
            #[serde(rename = "type")]
            kind: String,
            coordinates: Vec<Vec<[f64; 2]>>,
        }

        let polygon: PolygonGeometry = serde_json::from_value(value.clone())?;
        if polygon.kind != "Polygon" {
            return Err(ArchiveError::Parse(format!(
                "Expected Polygon footprint geometry, found {}",
                polygon.kind
            )));
        }
        if polygon.coordinates.first().map_or(true, |r| r.is_empty()) {
            return Err(ArchiveError::Parse("Footprint has no exterior ring".to_string()));
        }
        Ok(Self { rings: polygon.coordinates })
    }

    pub fn to_geojson(&self) -> Value {
        json!({
            "type": "Polygon",
            "coordinates": self.rings,
        })
    }
}

/// Raw attributes of one archive granule, exactly as the archive reports them.
///
/// Attributes without a dedicated field are kept in `extra` so that merged
/// inventories carry the union of all input columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneRecord {
    #[serde(rename = "granuleName")]
    pub granule_name: String,
    #[serde(rename = "sceneDate")]
    pub scene_date: String,
    #[serde(rename = "relativeOrbit", deserialize_with = "deserialize_orbit")]
    pub relative_orbit: u32,
    #[serde(rename = "flightDirection")]
    pub flight_direction: FlightDirection,
    pub platform: String,
    #[serde(rename = "downloadUrl")]
    pub download_url: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// The archive sends orbit numbers as strings, persisted inventories as integers
fn deserialize_orbit<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OrbitValue {
        Number(u32),
        Text(String),
    }

    match OrbitValue::deserialize(deserializer)? {
        OrbitValue::Number(n) => Ok(n),
        OrbitValue::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid relativeOrbit '{}'", s))),
    }
}

/// Parse the archive `sceneDate` string
pub fn parse_scene_datetime(value: &str) -> ArchiveResult<NaiveDateTime> {
    SCENE_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| ArchiveError::Parse(format!("Unrecognized scene date '{}'", value)))
}

/// Parse a user supplied acquisition date
pub fn parse_user_date(value: &str) -> ArchiveResult<NaiveDate> {
    USER_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value.trim(), fmt).ok())
        .ok_or_else(|| ArchiveError::Parse(format!("Unrecognized date '{}'", value)))
}

/// One row of the per-orbit summary table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrbitSummary {
    #[serde(rename = "Orbit")]
    pub orbit: u32,
    #[serde(rename = "Start")]
    pub start: String,
    #[serde(rename = "Stop")]
    pub stop: String,
    #[serde(rename = "Dates")]
    pub dates: usize,
    #[serde(rename = "Frames")]
    pub frames: usize,
    #[serde(rename = "Direction")]
    pub direction: FlightDirection,
    #[serde(rename = "UTC")]
    pub utc: String,
}

/// One acquisition date of a relative orbit with the gap to the previous date
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevisitRow {
    #[serde(rename = "")]
    pub index: usize,
    #[serde(rename = "sceneDateString")]
    pub scene_date: String,
    pub platform: String,
    /// Days since the previous acquisition, 0 for the first date
    pub dt: i64,
    #[serde(rename = "nFrames")]
    pub n_frames: usize,
}

/// Coarse error classification for callers and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Parse,
    LookupMiss,
    Filesystem,
    Config,
    External,
}

/// Error types for archive operations
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Lookup failed: {0}")]
    LookupMiss(String),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("External process error: {0}")]
    Process(String),
}

impl ArchiveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ArchiveError::Io(_) | ArchiveError::Csv(_) => ErrorKind::Filesystem,
            ArchiveError::Transport(_) => ErrorKind::Transport,
            ArchiveError::Parse(_) | ArchiveError::Xml(_) => ErrorKind::Parse,
            ArchiveError::LookupMiss(_) => ErrorKind::LookupMiss,
            ArchiveError::Config(_) => ErrorKind::Config,
            ArchiveError::Gdal(_) | ArchiveError::Process(_) => ErrorKind::External,
        }
    }
}

impl From<serde_json::Error> for ArchiveError {
    fn from(e: serde_json::Error) -> Self {
        ArchiveError::Parse(e.to_string())
    }
}

impl From<reqwest::Error> for ArchiveError {
    fn from(e: reqwest::Error) -> Self {
        ArchiveError::Transport(e.to_string())
    }
}

impl From<quick_xml::Error> for ArchiveError {
    fn from(e: quick_xml::Error) -> Self {
        ArchiveError::Xml(e.to_string())
    }
}

impl From<toml::de::Error> for ArchiveError {
    fn from(e: toml::de::Error) -> Self {
        ArchiveError::Config(e.to_string())
    }
}

/// Result type for archive operations
pub type ArchiveResult<T> = Result<T, ArchiveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snwe_rejects_inverted_bounds() {
        assert!(Snwe::new(1.0, 0.0, -78.0, -77.0).is_err());
        assert!(Snwe::new(0.0, 1.0, -77.0, -78.0).is_err());
        assert!(Snwe::new(0.611, 1.048, -78.196, -77.522).is_ok());
    }

    #[test]
    fn test_snwe_wkt_ring_order() {
        let snwe = Snwe::new(0.5, 1.5, -78.25, -77.5).unwrap();
        assert_eq!(
            snwe.to_wkt(),
            "POLYGON ((-77.5 0.5, -77.5 1.5, -78.25 1.5, -78.25 0.5, -77.5 0.5))"
        );
        assert_eq!(snwe.to_string(), "[0.500, 1.500, -78.250, -77.500]");
    }

    #[test]
    fn test_parse_dates() {
        let ts = parse_scene_datetime("2018-03-20 23:28:21").unwrap();
        assert_eq!(ts.format("%H:%M:%S").to_string(), "23:28:21");
        assert!(parse_scene_datetime("2018-03-20T23:28:21.000000").is_ok());
        assert!(parse_scene_datetime("March 20").is_err());

        let expected = NaiveDate::from_ymd_opt(2018, 3, 20).unwrap();
        assert_eq!(parse_user_date("20180320").unwrap(), expected);
        assert_eq!(parse_user_date("2018-03-20").unwrap(), expected);
        assert_eq!(parse_user_date("2018/03/20").unwrap(), expected);
    }

    #[test]
    fn test_orbit_accepts_string_or_number() {
        let base = json!({
            "granuleName": "g",
            "sceneDate": "2018-03-20 23:28:21",
            "flightDirection": "ASCENDING",
            "platform": "Sentinel-1B",
            "downloadUrl": "https://example.com/g.zip",
        });

        let mut as_text = base.clone();
        as_text["relativeOrbit"] = json!("120");
        let record: SceneRecord = serde_json::from_value(as_text).unwrap();
        assert_eq!(record.relative_orbit, 120);

        let mut as_number = base;
        as_number["relativeOrbit"] = json!(120);
        let record: SceneRecord = serde_json::from_value(as_number).unwrap();
        assert_eq!(record.relative_orbit, 120);
        assert!(record.extra.is_empty());
    }

    #[test]
    fn test_footprint_requires_exterior_ring() {
        let empty = json!({"type": "Polygon", "coordinates": []});
        assert_eq!(Footprint::from_geojson(&empty).unwrap_err().kind(), ErrorKind::Parse);
        let empty_ring = json!({"type": "Polygon", "coordinates": [[]]});
        assert!(Footprint::from_geojson(&empty_ring).is_err());
        let point = json!({"type": "Point", "coordinates": [[[0.0, 0.0]]]});
        assert!(Footprint::from_geojson(&point).is_err());

        let square = json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]],
        });
        let footprint = Footprint::from_geojson(&square).unwrap();
        assert_eq!(footprint.to_geojson(), square);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(ArchiveError::LookupMiss("x".into()).kind(), ErrorKind::LookupMiss);
        assert_eq!(ArchiveError::Transport("x".into()).kind(), ErrorKind::Transport);
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(ArchiveError::from(io).kind(), ErrorKind::Filesystem);
    }
}
