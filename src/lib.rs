//! insar-archive: Sentinel-1 archive inventories for InSAR processing
//!
//! Queries the SAR archive for scenes over a region of interest, keeps the
//! results as an inventory, summarizes acquisitions per relative orbit, and
//! resolves the scene and precise orbit downloads needed to set up a
//! topsApp interferogram.

pub mod types;
pub mod config;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    ArchiveError, ArchiveResult, ErrorKind, FlightDirection, Footprint, OutputFormat, Platform, SceneRecord, Snwe,
};
pub use config::ArchiveConfig;
pub use core::{Inventory, Scene, SceneLookup};
