use insar_archive::core::cog::{convert_to_cog, CogRequest};
use insar_archive::io::external::{ThumbnailFormat, OVERVIEW_LEVELS};
use insar_archive::io::{RecordingTools, ToolCall};
use std::path::PathBuf;

#[test]
fn test_single_band_cog() {
    let _ = env_logger::builder().is_test(true).try_init();
    let tools = RecordingTools::new();
    let request = CogRequest::new("merged/filt_topophase.unw.geo.vrt");

    let outputs = convert_to_cog(&tools, &request).expect("COG conversion failed");
    assert_eq!(outputs.cog, PathBuf::from("merged/filt_topophase.unw.geo-cog.tif"));
    assert!(outputs.rgb.is_none());

    let calls = tools.calls();
    assert_eq!(
        calls,
        vec![
            ToolCall::ExtractBand {
                input: PathBuf::from("merged/filt_topophase.unw.geo.vrt"),
                band: 1,
                output: PathBuf::from("./tmp.vrt"),
            },
            ToolCall::BuildOverviews {
                input: PathBuf::from("./tmp.vrt"),
                levels: OVERVIEW_LEVELS.to_vec(),
            },
            ToolCall::MakeCog {
                input: PathBuf::from("./tmp.vrt"),
                output: PathBuf::from("merged/filt_topophase.unw.geo-cog.tif"),
            },
        ]
    );
}

#[test]
fn test_colored_cog_with_thumbnail() {
    let tools = RecordingTools::new();
    let dir = tempfile::tempdir().unwrap();
    let cpt_dir = dir.path().join("cpt");
    let work_dir = dir.path().join("work");
    let mut request = CogRequest::new("merged/phsig.cor.geo.vrt");
    request.band = 2;
    request.output = Some(PathBuf::from("coherence-cog.tif"));
    request.cpt_dir = Some(cpt_dir.clone());
    request.thumbnail = true;
    request.work_dir = work_dir.clone();

    let outputs = convert_to_cog(&tools, &request).unwrap();
    assert_eq!(outputs.rgb, Some(PathBuf::from("coherence-cog-rgb.tif")));
    assert_eq!(outputs.thumbnail, Some(PathBuf::from("coherence-cog-rgb-thumb.jpeg")));

    // the missing color table was generated
    let cpt = cpt_dir.join("coherence-cog.cpt");
    let table = std::fs::read_to_string(&cpt).unwrap();
    assert_eq!(table.lines().last(), Some("nv 0 0 0 0"));

    let calls = tools.calls();
    assert_eq!(calls.len(), 7);
    assert_eq!(
        calls[3],
        ToolCall::ColorRelief {
            input: PathBuf::from("coherence-cog.tif"),
            cpt,
            output: work_dir.join("tmp.tif"),
        }
    );
    assert_eq!(
        calls[6],
        ToolCall::MakeThumbnail {
            input: PathBuf::from("coherence-cog-rgb.tif"),
            percent: 5,
            format: ThumbnailFormat::Jpeg,
        }
    );
}

#[test]
fn test_existing_color_table_is_kept() {
    let tools = RecordingTools::new();
    let dir = tempfile::tempdir().unwrap();
    let custom = "0 1 2 3\nnv 0 0 0 0\n";
    std::fs::write(dir.path().join("amplitude-cog.cpt"), custom).unwrap();

    let mut request = CogRequest::new("merged/filt_topophase.flat.geo.vrt");
    request.cpt_dir = Some(dir.path().to_path_buf());
    request.work_dir = dir.path().to_path_buf();
    convert_to_cog(&tools, &request).unwrap();

    let table = std::fs::read_to_string(dir.path().join("amplitude-cog.cpt")).unwrap();
    assert_eq!(table, custom);
}

#[test]
fn test_scratch_files_removed() {
    let tools = RecordingTools::new();
    let work = tempfile::tempdir().unwrap();
    // leftovers the external tools would have written
    for name in ["tmp.vrt", "tmp.vrt.ovr", "tmp.tif"] {
        std::fs::write(work.path().join(name), "scratch").unwrap();
    }
    let mut request = CogRequest::new("merged/phsig.cor.geo.vrt");
    request.output = Some(work.path().join("coherence-cog.tif"));
    request.cpt_dir = Some(work.path().join("cpt"));
    request.work_dir = work.path().to_path_buf();

    let outputs = convert_to_cog(&tools, &request).unwrap();
    assert!(outputs.rgb.is_some());
    for name in ["tmp.vrt", "tmp.vrt.ovr", "tmp.tif"] {
        assert!(!work.path().join(name).exists(), "{} was left behind", name);
    }
}
