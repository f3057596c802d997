use crate::config::ArchiveConfig;
use crate::types::{ArchiveError, ArchiveResult, OutputFormat, Platform, Snwe};
use std::path::{Path, PathBuf};

/// Bounding-box search client for the SAR archive API
pub struct ArchiveClient {
    search_url: String,
    processing_level: String,
    beam_mode: String,
    output_dir: PathBuf,
    client: reqwest::blocking::Client,
}

impl ArchiveClient {
    pub fn new(config: &ArchiveConfig) -> ArchiveResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.http_timeout())
            .build()
            .map_err(|e| ArchiveError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            search_url: config.search_url.clone(),
            processing_level: config.processing_level.clone(),
            beam_mode: config.beam_mode.clone(),
            output_dir: config.output_dir.clone(),
            client,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `query_<platform>.<format>`
    pub fn query_file_name(platform: Platform, format: OutputFormat) -> String {
        format!("query_{}.{}", platform.code(), format)
    }

    pub fn query_params(&self, snwe: &Snwe, platform: Platform, format: OutputFormat) -> Vec<(&'static str, String)> {
        vec![
            ("intersectsWith", snwe.to_wkt()),
            ("platform", platform.code().to_string()),
            ("processingLevel", self.processing_level.clone()),
            ("beamMode", self.beam_mode.clone()),
            ("output", format.as_str().to_string()),
        ]
    }

    /// Search one platform and store the raw response body.
    ///
    /// An existing file with the same name is overwritten. Transport failures
    /// and non-success statuses are returned as-is, without retries.
    pub fn query(&self, snwe: &Snwe, platform: Platform, format: OutputFormat) -> ArchiveResult<PathBuf> {
        log::info!("Querying archive for {} within {}", platform, snwe);

        let response = self
            .client
            .get(&self.search_url)
            .query(&self.query_params(snwe, platform, format))
            .send()?;
        log::debug!("Request URL: {}", response.url());

        if !response.status().is_success() {
            return Err(ArchiveError::Transport(format!(
                "Archive query for {} failed with status: {}",
                platform,
                response.status()
            )));
        }

        let body = response.text()?;
        std::fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(Self::query_file_name(platform, format));
        std::fs::write(&path, body)?;

        log::info!("Saved {}", path.display());
        Ok(path)
    }

    /// Query Sentinel-1A and Sentinel-1B, returning their response files in that order.
    ///
    /// The two requests are independent; with the `parallel` feature they run
    /// concurrently and both finish before this returns.
    pub fn query_platforms(&self, snwe: &Snwe, format: OutputFormat) -> ArchiveResult<(PathBuf, PathBuf)> {
        #[cfg(feature = "parallel")]
        let (a, b) = rayon::join(
            || self.query(snwe, Platform::Sentinel1A, format),
            || self.query(snwe, Platform::Sentinel1B, format),
        );

        #[cfg(not(feature = "parallel"))]
        let (a, b) = (
            self.query(snwe, Platform::Sentinel1A, format),
            self.query(snwe, Platform::Sentinel1B, format),
        );

        Ok((a?, b?))
    }
}
