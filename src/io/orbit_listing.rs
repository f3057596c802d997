use crate::types::{ArchiveError, ArchiveResult};
use scraper::{Html, Selector};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A source of precise orbit file names.
///
/// The live directory page and a pre-fetched text listing are interchangeable;
/// both resolve names against the same download base URL.
pub trait OrbitListing {
    /// URL that listing entries are relative to
    fn base_url(&self) -> &str;

    /// Raw listing entries (file names or hrefs)
    fn entries(&self) -> ArchiveResult<Vec<String>>;
}

/// Live HTML directory listing served by the orbit archive
pub struct RemoteListing {
    url: String,
    client: reqwest::blocking::Client,
}

impl RemoteListing {
    pub fn new(url: &str, timeout: Duration) -> ArchiveResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ArchiveError::Transport(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

impl OrbitListing for RemoteListing {
    fn base_url(&self) -> &str {
        &self.url
    }

    fn entries(&self) -> ArchiveResult<Vec<String>> {
        log::info!("Fetching orbit listing: {}", self.url);
        let response = self.client.get(&self.url).send()?;

        if !response.status().is_success() {
            return Err(ArchiveError::Transport(format!(
                "Orbit listing request failed with status: {}",
                response.status()
            )));
        }

        let html = response.text()?;
        let hrefs = parse_listing_html(&html);
        log::debug!("Listing contains {} links", hrefs.len());
        Ok(hrefs)
    }
}

/// Every anchor href on a directory listing page, in document order
pub fn parse_listing_html(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let anchors = match Selector::parse("a[href]") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };
    document
        .select(&anchors)
        .filter_map(|a| a.value().attr("href"))
        .map(str::to_string)
        .collect()
}

/// Pre-fetched listing stored as text, one file name per line
pub struct StaticListing {
    path: PathBuf,
    base_url: String,
}

impl StaticListing {
    pub fn new<P: AsRef<Path>>(path: P, base_url: &str) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl OrbitListing for StaticListing {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn entries(&self) -> ArchiveResult<Vec<String>> {
        log::info!("Reading orbit listing: {}", self.path.display());
        let text = std::fs::read_to_string(&self.path)?;
        Ok(text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}
