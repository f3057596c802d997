//! Cloud-optimized GeoTIFF conversion of processor outputs.
//!
//! All raster work is delegated to [`ExternalTools`]; this module decides
//! file names, the order of operations and the color tables handed to
//! `gdaldem color-relief`.

use crate::io::external::{strip_extension, ExternalTools, ThumbnailFormat, OVERVIEW_LEVELS};
use crate::types::ArchiveResult;
use colorous::Gradient;
use std::io::Write;
use std::path::{Path, PathBuf};

const COHERENCE_FILES: [&str; 2] = ["phsig.cor.geo.vrt", "topophase.cor.geo.vrt"];
const UNWRAPPED_PHASE_FILES: [&str; 1] = ["filt_topophase.unw.geo.vrt"];

/// Entries in a generated color table, not counting the nodata line
const CPT_STEPS: usize = 64;
/// Period used to re-wrap unwrapped phase for display
const PHASE_WRAP: f64 = 6.28;

/// Colormap family suited to a processor output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColormapKind {
    Coherence,
    WrappedPhase,
    Amplitude,
}

impl ColormapKind {
    /// Conventional cpt file name for this family
    pub fn cpt_name(&self) -> &'static str {
        match self {
            ColormapKind::Coherence => "coherence-cog.cpt",
            ColormapKind::WrappedPhase => "unwrapped-phase-cog.cpt",
            ColormapKind::Amplitude => "amplitude-cog.cpt",
        }
    }

    fn gradient(&self) -> Gradient {
        match self {
            ColormapKind::Coherence => colorous::INFERNO,
            ColormapKind::WrappedPhase => colorous::PLASMA,
            ColormapKind::Amplitude => colorous::GREYS,
        }
    }

    /// Data range covered by the table
    fn range(&self) -> (f64, f64) {
        match self {
            ColormapKind::Coherence => (1e-5, 1.0),
            ColormapKind::WrappedPhase => (-50.0, 50.0),
            ColormapKind::Amplitude => (1.0, 1e5),
        }
    }

    /// Position on the gradient, in [0, 1], of a data value
    fn normalize(&self, value: f64) -> f64 {
        let (lo, hi) = self.range();
        let t = match self {
            ColormapKind::Coherence => (value - lo) / (hi - lo),
            ColormapKind::WrappedPhase => value.rem_euclid(PHASE_WRAP) / PHASE_WRAP,
            ColormapKind::Amplitude => (value.ln() - lo.ln()) / (hi.ln() - lo.ln()),
        };
        let t = t.clamp(0.0, 1.0);
        // greys runs white to black; amplitude is drawn dark to bright
        match self {
            ColormapKind::Amplitude => 1.0 - t,
            _ => t,
        }
    }
}

/// Lines of a `gdaldem` color table: `value R G B` over the family's range,
/// then a black `nv` entry for nodata.
pub fn cpt_lines(kind: ColormapKind) -> Vec<String> {
    let (lo, hi) = kind.range();
    let step = (hi - lo) / (CPT_STEPS - 1) as f64;
    let gradient = kind.gradient();
    let mut lines: Vec<String> = (0..CPT_STEPS)
        .map(|i| {
            let value = if i == CPT_STEPS - 1 { hi } else { lo + step * i as f64 };
            let color = gradient.eval_continuous(kind.normalize(value));
            format!("{} {} {} {}", value, color.r, color.g, color.b)
        })
        .collect();
    lines.push("nv 0 0 0 0".to_string());
    lines
}

/// Write the color table for `kind` into `dir`, creating the directory
pub fn write_cpt(kind: ColormapKind, dir: &Path) -> ArchiveResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(kind.cpt_name());
    let mut file = std::io::BufWriter::new(std::fs::File::create(&path)?);
    for line in cpt_lines(kind) {
        writeln!(file, "{}", line)?;
    }
    file.flush()?;
    log::info!("Wrote color table {}", path.display());
    Ok(path)
}

/// Remove an intermediate file; a file that is already gone is fine
fn remove_scratch(path: &Path) -> ArchiveResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            log::debug!("Removed {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Pick the colormap family from the processor's output file name
pub fn colormap_for(input: &Path) -> ColormapKind {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if COHERENCE_FILES.contains(&name.as_str()) {
        ColormapKind::Coherence
    } else if UNWRAPPED_PHASE_FILES.contains(&name.as_str()) {
        ColormapKind::WrappedPhase
    } else {
        ColormapKind::Amplitude
    }
}

#[derive(Debug, Clone)]
pub struct CogRequest {
    pub input: PathBuf,
    pub band: u32,
    /// Defaults to `<input stem>-cog.tif`
    pub output: Option<PathBuf>,
    /// Directory holding cpt files; enables the colored RGB product.
    /// Missing tables are generated there.
    pub cpt_dir: Option<PathBuf>,
    /// Thumbnail of the RGB product, only made when an RGB product is made
    pub thumbnail: bool,
    /// Scratch directory for intermediate files
    pub work_dir: PathBuf,
}

impl CogRequest {
    pub fn new<P: AsRef<Path>>(input: P) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            band: 1,
            output: None,
            cpt_dir: None,
            thumbnail: false,
            work_dir: PathBuf::from("."),
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}-cog.tif", strip_extension(&self.input))))
    }
}

/// Files produced by [`convert_to_cog`]
#[derive(Debug, Clone, PartialEq)]
pub struct CogOutputs {
    pub cog: PathBuf,
    pub rgb: Option<PathBuf>,
    pub thumbnail: Option<PathBuf>,
}

/// Band → VRT → overviews → COG, then optionally the same for a colored RGB
/// rendering and a thumbnail of it.
///
/// `tmp.vrt`, its external overviews and `tmp.tif` are removed from the work
/// directory once the product built from them is written.
pub fn convert_to_cog(tools: &dyn ExternalTools, request: &CogRequest) -> ArchiveResult<CogOutputs> {
    let cog = request.output_path();
    log::info!(
        "Creating COG {} from {} (band {})",
        cog.display(),
        request.input.display(),
        request.band
    );

    let tmp_vrt = request.work_dir.join("tmp.vrt");
    tools.extract_band(&request.input, request.band, &tmp_vrt)?;
    tools.build_overviews(&tmp_vrt, &OVERVIEW_LEVELS)?;
    tools.make_cog(&tmp_vrt, &cog)?;
    remove_scratch(&tmp_vrt)?;
    remove_scratch(&request.work_dir.join("tmp.vrt.ovr"))?;

    let Some(cpt_dir) = &request.cpt_dir else {
        log::info!("Skipping RGB image creation");
        return Ok(CogOutputs { cog, rgb: None, thumbnail: None });
    };

    let rgb = PathBuf::from(format!("{}-rgb.tif", strip_extension(&cog)));
    let kind = colormap_for(&request.input);
    let cpt = cpt_dir.join(kind.cpt_name());
    if !cpt.exists() {
        write_cpt(kind, cpt_dir)?;
    }
    log::info!("Creating RGB file {} with {}", rgb.display(), cpt.display());

    let tmp_tif = request.work_dir.join("tmp.tif");
    tools.color_relief(&cog, &cpt, &tmp_tif)?;
    tools.build_overviews(&tmp_tif, &OVERVIEW_LEVELS)?;
    tools.make_cog(&tmp_tif, &rgb)?;
    remove_scratch(&tmp_tif)?;

    let thumbnail = if request.thumbnail {
        Some(tools.make_thumbnail(&rgb, 5, ThumbnailFormat::Jpeg)?)
    } else {
        None
    };

    Ok(CogOutputs { cog, rgb: Some(rgb), thumbnail })
}
