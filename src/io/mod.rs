//! Network and filesystem access

pub mod asf_query;
pub mod inventory;
pub mod orbit_listing;
pub mod roi;
pub mod tables;
pub mod external;

pub use asf_query::ArchiveClient;
pub use inventory::{
    load_asf_json, load_inventory, merge_inventories, parse_asf_response, save_footprints, save_inventory,
    write_download_links,
};
pub use orbit_listing::{OrbitListing, RemoteListing, StaticListing};
pub use roi::{bounds_from_vector, write_snwe_files};
pub use tables::{write_inventory_summary, write_orbit_acquisitions};
pub use external::{ExternalTools, RecordingTools, ShellTools, ToolCall};
