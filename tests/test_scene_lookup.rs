use insar_archive::core::resolve::{get_orbit_url, get_slc_urls};
use insar_archive::io::orbit_listing::parse_listing_html;
use insar_archive::io::{load_inventory, OrbitListing, StaticListing};
use insar_archive::ErrorKind;
use std::path::PathBuf;

const ORBIT_URL: &str = "https://s1qc.asf.alaska.edu/aux_poeorb";

fn data(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data").join(name)
}

#[test]
fn test_get_slc_urls_single_frame() {
    let _ = env_logger::builder().is_test(true).try_init();
    let inventory = load_inventory(data("query.geojson")).expect("Failed to load inventory");

    let urls = get_slc_urls(&inventory, "20180320", 120).expect("Lookup failed");
    println!("URLs: {:?}", urls);
    assert_eq!(
        urls,
        vec!["https://datapool.asf.alaska.edu/SLC/SB/S1B_IW_SLC__1SDV_20180320T232821_20180320T232848_010121_01260A_0613.zip"]
    );

    // pure and repeatable
    assert_eq!(get_slc_urls(&inventory, "2018-03-20", 120).unwrap(), urls);
}

#[test]
fn test_get_slc_urls_multiple_frames_and_misses() {
    let inventory = load_inventory(data("query.geojson")).unwrap();

    let urls = get_slc_urls(&inventory, "20180314", 120).unwrap();
    assert_eq!(urls.len(), 2);
    assert!(urls.iter().all(|u| u.contains("20180314")));

    // wrong track for the date, and a date with no acquisitions
    assert!(get_slc_urls(&inventory, "20180320", 42).unwrap().is_empty());
    assert!(get_slc_urls(&inventory, "20190101", 120).unwrap().is_empty());
}

#[test]
fn test_get_orbit_url_from_static_listing() {
    let _ = env_logger::builder().is_test(true).try_init();
    let listing = StaticListing::new(data("poeorb.txt"), ORBIT_URL);

    let url = get_orbit_url("S1B_IW_SLC__1SDV_20171117T015310_20171117T015337_008315_00EB6C_40CA", &listing)
        .expect("Orbit lookup failed");
    println!("Orbit URL: {}", url);
    assert!(url.ends_with(".EOF"));
    assert!(url.contains("AUX_POEORB"));
    assert_eq!(
        url,
        "https://s1qc.asf.alaska.edu/aux_poeorb/S1B_OPER_AUX_POEORB_OPOD_20171207T111412_V20171116T225942_20171118T005942.EOF"
    );

    let url = get_orbit_url("S1B_IW_SLC__1SDV_20180320T232821_20180320T232848_010121_01260A_0613", &listing).unwrap();
    assert!(url.contains("_V20180319T"));
}

#[test]
fn test_get_orbit_url_miss_is_lookup_error() {
    let listing = StaticListing::new(data("poeorb.txt"), ORBIT_URL);

    let err = get_orbit_url("S1A_IW_SLC__1SDV_20180101T232903_20180101T232930_019942_021F6A_1A2B", &listing)
        .expect_err("Expected a lookup miss");
    println!("Expected error: {}", err);
    assert_eq!(err.kind(), ErrorKind::LookupMiss);
}

#[test]
fn test_html_listing_matches_static_listing() {
    let html = std::fs::read_to_string(data("poeorb.html")).unwrap();
    let hrefs = parse_listing_html(&html);
    assert!(hrefs.contains(&"/".to_string()));
    assert_eq!(hrefs.iter().filter(|h| h.ends_with(".EOF")).count(), 3);

    let listing = StaticListing::new(data("poeorb.txt"), ORBIT_URL);
    let entries = listing.entries().unwrap();
    for href in hrefs.iter().filter(|h| h.ends_with(".EOF")) {
        assert!(entries.contains(href), "{} missing from static listing", href);
    }
}
