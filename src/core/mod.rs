//! Inventory logic and processor configuration

pub mod inventory;
pub mod summary;
pub mod resolve;
pub mod cog;
pub mod topsapp;
pub mod interferogram;

// Re-export main types
pub use inventory::{Inventory, Scene};
pub use summary::{revisit_statistics, summarize_inventory, summarize_orbits, InventorySummary};
pub use resolve::{find_scenes, get_orbit_url, get_slc_urls, parse_granule, select_orbit_file, SceneLookup};
pub use cog::{colormap_for, convert_to_cog, write_cpt, ColormapKind, CogOutputs, CogRequest};
pub use topsapp::{ProcessingOptions, SceneComponent, TopsAppConfig};
pub use interferogram::{prepare_interferogram, InterferogramPlan, InterferogramRequest};
