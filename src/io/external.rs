//! External command-line tools (GDAL utilities, wget, AWS CLI).
//!
//! Inventory logic never spawns processes itself; it goes through
//! [`ExternalTools`] so that tests and dry runs can substitute
//! [`RecordingTools`].

use crate::types::{ArchiveError, ArchiveResult};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;

/// Overview decimation levels for cloud-optimized output
pub const OVERVIEW_LEVELS: [u32; 5] = [2, 4, 8, 16, 32];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailFormat {
    Jpeg,
    Png,
}

impl ThumbnailFormat {
    pub fn driver(&self) -> &'static str {
        match self {
            ThumbnailFormat::Jpeg => "JPEG",
            ThumbnailFormat::Png => "PNG",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ThumbnailFormat::Jpeg => "jpeg",
            ThumbnailFormat::Png => "png",
        }
    }
}

/// `<input minus its 4-char extension>-thumb.<ext>`
pub fn thumbnail_path(input: &Path, format: ThumbnailFormat) -> PathBuf {
    PathBuf::from(format!("{}-thumb.{}", strip_extension(input), format.extension()))
}

/// Drop a trailing `.xxx` extension the way the processing scripts name outputs
pub fn strip_extension(path: &Path) -> String {
    let text = path.to_string_lossy();
    let cut = text.len().saturating_sub(4);
    match text.get(cut..) {
        Some(ext) if ext.starts_with('.') => text[..cut].to_string(),
        _ => text.to_string(),
    }
}

pub trait ExternalTools {
    /// Single band of `input` as a VRT with nodata 0
    fn extract_band(&self, input: &Path, band: u32, output: &Path) -> ArchiveResult<()>;

    fn build_overviews(&self, input: &Path, levels: &[u32]) -> ArchiveResult<()>;

    /// Tiled, deflate-compressed GeoTIFF keeping source overviews
    fn make_cog(&self, input: &Path, output: &Path) -> ArchiveResult<()>;

    fn color_relief(&self, input: &Path, cpt: &Path, output: &Path) -> ArchiveResult<()>;

    fn make_thumbnail(&self, input: &Path, percent: u32, format: ThumbnailFormat) -> ArchiveResult<PathBuf>;

    /// Download `url` into `dest_dir` unless already present
    fn fetch(&self, url: &str, dest_dir: &Path) -> ArchiveResult<()>;

    /// Mirror the `.SAFE` auxiliary calibration files listed under `url`
    fn fetch_aux_calibration(&self, url: &str, dest_dir: &Path) -> ArchiveResult<()>;

    fn sync_to_object_store(&self, dir: &Path, bucket: &str) -> ArchiveResult<()>;
}

/// Runs the real command-line tools found on `PATH`
#[derive(Debug, Default, Clone)]
pub struct ShellTools;

impl ShellTools {
    pub fn new() -> Self {
        Self
    }

    fn run(&self, program: &str, args: &[String], cwd: Option<&Path>) -> ArchiveResult<()> {
        log::info!("{} {}", program, args.join(" "));
        let mut command = Command::new(program);
        command.args(args);
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        let status = command
            .status()
            .map_err(|e| ArchiveError::Process(format!("Failed to launch {}: {}", program, e)))?;

        if !status.success() {
            return Err(ArchiveError::Process(format!("{} exited with {}", program, status)));
        }
        log::debug!("{} finished", program);
        Ok(())
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

impl ExternalTools for ShellTools {
    fn extract_band(&self, input: &Path, band: u32, output: &Path) -> ArchiveResult<()> {
        let args = vec![
            "-of".to_string(),
            "VRT".to_string(),
            "-b".to_string(),
            band.to_string(),
            "-a_nodata".to_string(),
            "0.0".to_string(),
            path_arg(input),
            path_arg(output),
        ];
        self.run("gdal_translate", &args, None)
    }

    fn build_overviews(&self, input: &Path, levels: &[u32]) -> ArchiveResult<()> {
        let mut args = vec![path_arg(input)];
        args.extend(levels.iter().map(|l| l.to_string()));
        self.run("gdaladdo", &args, None)
    }

    fn make_cog(&self, input: &Path, output: &Path) -> ArchiveResult<()> {
        let mut args = vec![path_arg(input), path_arg(output)];
        for option in ["COMPRESS=DEFLATE", "TILED=YES", "BLOCKXSIZE=512", "BLOCKYSIZE=512", "COPY_SRC_OVERVIEWS=YES"] {
            args.push("-co".to_string());
            args.push(option.to_string());
        }
        args.extend(["--config", "GDAL_TIFF_OVR_BLOCKSIZE", "512"].map(String::from));
        self.run("gdal_translate", &args, None)
    }

    fn color_relief(&self, input: &Path, cpt: &Path, output: &Path) -> ArchiveResult<()> {
        let args = vec!["color-relief".to_string(), path_arg(input), path_arg(cpt), path_arg(output)];
        self.run("gdaldem", &args, None)
    }

    fn make_thumbnail(&self, input: &Path, percent: u32, format: ThumbnailFormat) -> ArchiveResult<PathBuf> {
        let output = thumbnail_path(input, format);
        let args = vec![
            "-of".to_string(),
            format.driver().to_string(),
            "-r".to_string(),
            "cubic".to_string(),
            "-outsize".to_string(),
            format!("{}%", percent),
            "0".to_string(),
            path_arg(input),
            path_arg(&output),
        ];
        self.run("gdal_translate", &args, None)?;
        Ok(output)
    }

    fn fetch(&self, url: &str, dest_dir: &Path) -> ArchiveResult<()> {
        std::fs::create_dir_all(dest_dir)?;
        // credentials come from ~/.netrc
        let args = ["-q", "-nc", "-c"].iter().map(|s| s.to_string()).chain([url.to_string()]).collect::<Vec<_>>();
        self.run("wget", &args, Some(dest_dir))
    }

    fn fetch_aux_calibration(&self, url: &str, dest_dir: &Path) -> ArchiveResult<()> {
        std::fs::create_dir_all(dest_dir)?;
        let mut args: Vec<String> = ["-q", "-r", "-l2", "-nc", "-nd", "-np", "-nH", "-A", "SAFE"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        args.push(url.to_string());
        self.run("wget", &args, Some(dest_dir))
    }

    fn sync_to_object_store(&self, dir: &Path, bucket: &str) -> ArchiveResult<()> {
        let args = vec![
            "s3".to_string(),
            "sync".to_string(),
            path_arg(dir),
            format!("s3://{}", bucket.trim_start_matches("s3://")),
        ];
        self.run("aws", &args, None)
    }
}

/// One invocation captured by [`RecordingTools`]
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    ExtractBand { input: PathBuf, band: u32, output: PathBuf },
    BuildOverviews { input: PathBuf, levels: Vec<u32> },
    MakeCog { input: PathBuf, output: PathBuf },
    ColorRelief { input: PathBuf, cpt: PathBuf, output: PathBuf },
    MakeThumbnail { input: PathBuf, percent: u32, format: ThumbnailFormat },
    Fetch { url: String, dest_dir: PathBuf },
    FetchAuxCalibration { url: String, dest_dir: PathBuf },
    SyncToObjectStore { dir: PathBuf, bucket: String },
}

/// Records calls instead of running anything. Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct RecordingTools {
    calls: Mutex<Vec<ToolCall>>,
}

impl RecordingTools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ToolCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: ToolCall) -> ArchiveResult<()> {
        log::debug!("dry run: {:?}", call);
        self.calls
            .lock()
            .map_err(|_| ArchiveError::Process("tool call log poisoned".to_string()))?
            .push(call);
        Ok(())
    }
}

impl ExternalTools for RecordingTools {
    fn extract_band(&self, input: &Path, band: u32, output: &Path) -> ArchiveResult<()> {
        self.record(ToolCall::ExtractBand {
            input: input.to_path_buf(),
            band,
            output: output.to_path_buf(),
        })
    }

    fn build_overviews(&self, input: &Path, levels: &[u32]) -> ArchiveResult<()> {
        self.record(ToolCall::BuildOverviews {
            input: input.to_path_buf(),
            levels: levels.to_vec(),
        })
    }

    fn make_cog(&self, input: &Path, output: &Path) -> ArchiveResult<()> {
        self.record(ToolCall::MakeCog {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
        })
    }

    fn color_relief(&self, input: &Path, cpt: &Path, output: &Path) -> ArchiveResult<()> {
        self.record(ToolCall::ColorRelief {
            input: input.to_path_buf(),
            cpt: cpt.to_path_buf(),
            output: output.to_path_buf(),
        })
    }

    fn make_thumbnail(&self, input: &Path, percent: u32, format: ThumbnailFormat) -> ArchiveResult<PathBuf> {
        self.record(ToolCall::MakeThumbnail {
            input: input.to_path_buf(),
            percent,
            format,
        })?;
        Ok(thumbnail_path(input, format))
    }

    fn fetch(&self, url: &str, dest_dir: &Path) -> ArchiveResult<()> {
        self.record(ToolCall::Fetch {
            url: url.to_string(),
            dest_dir: dest_dir.to_path_buf(),
        })
    }

    fn fetch_aux_calibration(&self, url: &str, dest_dir: &Path) -> ArchiveResult<()> {
        self.record(ToolCall::FetchAuxCalibration {
            url: url.to_string(),
            dest_dir: dest_dir.to_path_buf(),
        })
    }

    fn sync_to_object_store(&self, dir: &Path, bucket: &str) -> ArchiveResult<()> {
        self.record(ToolCall::SyncToObjectStore {
            dir: dir.to_path_buf(),
            bucket: bucket.to_string(),
        })
    }
}
