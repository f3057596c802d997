//! Explicit configuration shared by the archive components.
//!
//! Every value the scripts used to pick up from the environment (orbit and
//! auxiliary directories, credentials-adjacent bucket names, endpoints) lives
//! here and is handed to each component when it is constructed.

use crate::types::{ArchiveError, ArchiveResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SEARCH_URL: &str = "https://api.daac.asf.alaska.edu/services/search/param";
pub const DEFAULT_ORBIT_URL: &str = "https://s1qc.asf.alaska.edu/aux_poeorb";
pub const DEFAULT_AUX_CAL_URL: &str = "https://s1qc.asf.alaska.edu/aux_cal";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Archive search endpoint
    pub search_url: String,
    /// Precise orbit directory listing
    pub orbit_url: String,
    /// Auxiliary calibration file listing
    pub aux_cal_url: String,
    /// Where precise orbit files are stored for the processor
    pub orbit_dir: PathBuf,
    /// Where auxiliary calibration files are stored for the processor
    pub aux_dir: PathBuf,
    /// Destination of query responses, inventories and summary tables
    pub output_dir: PathBuf,
    pub http_timeout_secs: u64,
    /// Size estimate of a single SLC frame
    pub frame_size_gb: f64,
    pub processing_level: String,
    pub beam_mode: String,
    pub s3_bucket: Option<String>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_string(),
            orbit_url: DEFAULT_ORBIT_URL.to_string(),
            aux_cal_url: DEFAULT_AUX_CAL_URL.to_string(),
            orbit_dir: PathBuf::from("./"),
            aux_dir: PathBuf::from("./"),
            output_dir: PathBuf::from("."),
            http_timeout_secs: 100,
            frame_size_gb: 5.0,
            processing_level: "SLC".to_string(),
            beam_mode: "IW".to_string(),
            s3_bucket: None,
        }
    }
}

impl ArchiveConfig {
    /// Load a TOML configuration file; absent keys keep their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> ArchiveResult<Self> {
        log::info!("Loading configuration: {}", path.as_ref().display());
        let text = std::fs::read_to_string(&path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> ArchiveResult<Self> {
        let config: ArchiveConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// `<user config dir>/insar-archive/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("insar-archive").join("config.toml"))
    }

    /// Load the file at `path`, else the default location if it exists, else defaults
    pub fn resolve(path: Option<&Path>) -> ArchiveResult<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(default) if default.is_file() => Self::load(default),
            _ => {
                log::debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> ArchiveResult<()> {
        if self.http_timeout_secs == 0 {
            return Err(ArchiveError::Config("http_timeout_secs must be greater than 0".to_string()));
        }
        if !(self.frame_size_gb > 0.0) {
            return Err(ArchiveError::Config(format!(
                "frame_size_gb must be positive, got {}",
                self.frame_size_gb
            )));
        }
        for (name, url) in [
            ("search_url", &self.search_url),
            ("orbit_url", &self.orbit_url),
            ("aux_cal_url", &self.aux_cal_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ArchiveError::Config(format!("{} is not an http(s) URL: {}", name, url)));
            }
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
