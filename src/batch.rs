//! Per-file GeoTIFF processing: reproject to a temporary Web Mercator VRT,
//! then cut it into a tile pyramid under `<output>/<source>/`.

use crate::config::Config;
use crate::toolchain::process::{CommandOutput, Invocation};
use crate::toolchain::{TileOptions, Toolchain};
use crate::traits::CommandRunner;
use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use thiserror::Error;
use walkdir::WalkDir;

/// Scratch directories are created under the output directory with this prefix.
pub const SCRATCH_PREFIX: &str = ".temp_web_mercator_";

/// Why a single raster could not be tiled.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
    #[error("could not start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} {}: {}", exit_description(.status), .stderr.trim())]
    Exit {
        program: String,
        status: Option<i32>,
        stderr: String,
    },
    /// libgdal could not read the raster
    #[error("unreadable raster: {0}")]
    Inspect(String),
    /// Another input with the same file stem was tiled earlier in the run
    #[error("tile directory '{name}' is already used by {}", .first.display())]
    Duplicate { name: String, first: PathBuf },
}

fn exit_description(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("failed with code {code}"),
        None => "was terminated".to_string(),
    }
}

#[derive(Debug)]
pub struct SourceOutcome {
    pub source: String,
    pub input: PathBuf,
    pub result: Result<(), ProcessError>,
    pub elapsed: Duration,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<SourceOutcome>,
}

impl BatchReport {
    /// Names of the sources that were tiled, in processing order
    pub fn processed(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|o| o.result.is_ok())
            .map(|o| o.source.clone())
            .collect()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

pub fn is_raster(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("tif") || ext.eq_ignore_ascii_case("tiff"))
        .unwrap_or(false)
}

/// File name without its extension, which doubles as the tile directory name.
pub fn source_name(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
}

/// GeoTIFFs directly inside `dir`, sorted by file name.
pub fn scan_inputs(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to read {}", dir.display()))?;
        if entry.file_type().is_file() && is_raster(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Subdirectories of an existing output tree, as source names.
///
/// Hidden directories are skipped; that includes scratch space left by a
/// killed run.
pub fn discover_sources(output_dir: &Path) -> anyhow::Result<Vec<String>> {
    let mut sources = Vec::new();
    for entry in WalkDir::new(output_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("Failed to read {}", output_dir.display()))?;
        let name = entry.file_name().to_string_lossy();
        if entry.file_type().is_dir() && !name.starts_with('.') {
            sources.push(name.into_owned());
        }
    }
    Ok(sources)
}

/// Deletes scratch directories left in `output_dir` by a run that was
/// killed before its guards could clean up.
pub fn remove_stale_scratch(output_dir: &Path) -> anyhow::Result<usize> {
    let mut removed = 0;
    for entry in WalkDir::new(output_dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("Failed to read {}", output_dir.display()))?;
        let name = entry.file_name().to_string_lossy();
        if !entry.file_type().is_dir() || !name.starts_with(SCRATCH_PREFIX) {
            continue;
        }
        match fs::remove_dir_all(entry.path()) {
            Ok(()) => {
                warn!("Removed stale scratch directory {}", entry.path().display());
                removed += 1;
            }
            Err(e) => warn!("Could not remove {}: {e}", entry.path().display()),
        }
    }
    Ok(removed)
}

/// Temporary reprojected raster, removed with its directory when dropped.
struct ScratchVrt {
    _dir: TempDir,
    path: PathBuf,
}

impl ScratchVrt {
    fn create(output_dir: &Path, source: &str) -> io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("{SCRATCH_PREFIX}{source}_"))
            .tempdir_in(output_dir)?;
        let path = dir.path().join(format!("{source}.vrt"));
        Ok(Self { _dir: dir, path })
    }
}

pub struct BatchDriver {
    config: Config,
    toolchain: Toolchain,
    runner: Arc<dyn CommandRunner>,
}

impl BatchDriver {
    pub fn new(config: Config, toolchain: Toolchain, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            config,
            toolchain,
            runner,
        }
    }

    fn inputs(&self) -> anyhow::Result<Vec<PathBuf>> {
        match &self.config.single_file {
            Some(name) => {
                let path = self.config.input_dir.join(name);
                if !path.is_file() {
                    anyhow::bail!("Specified file {} does not exist", path.display());
                }
                Ok(vec![path])
            }
            None => scan_inputs(&self.config.input_dir),
        }
    }

    /// Tile every input. Fails only when there is nothing to process; a
    /// broken file is logged and recorded in the report.
    pub fn run(&self) -> anyhow::Result<BatchReport> {
        let inputs = self.inputs()?;
        if inputs.is_empty() {
            anyhow::bail!("No .tif files found in {}", self.config.input_dir.display());
        }
        fs::create_dir_all(&self.config.output_dir).with_context(|| {
            format!(
                "Failed to create output directory {}",
                self.config.output_dir.display()
            )
        })?;
        remove_stale_scratch(&self.config.output_dir)?;

        info!("Found {} .tif file(s) to process", inputs.len());
        if self.toolchain.bindings() {
            info!("Inspecting rasters through libgdal before tiling");
        } else {
            info!("Using command-line GDAL tools");
        }

        let options = TileOptions::from(&self.config);
        let pb = ProgressBar::new(inputs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg}\n[{bar:40.cyan/blue}] {pos}/{len} {percent}%")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▇▆▅▄▃▂▁  "),
        );

        let mut report = BatchReport::default();
        let mut claimed: HashMap<String, PathBuf> = HashMap::new();
        for input in inputs {
            let source = source_name(&input).unwrap_or_else(|| "<unknown>".to_string());
            pb.set_message(format!("Tiling {source}"));

            let started = Instant::now();
            let result = match claimed.get(&source) {
                Some(first) => Err(ProcessError::Duplicate {
                    name: source.clone(),
                    first: first.clone(),
                }),
                None => {
                    claimed.insert(source.clone(), input.clone());
                    self.process_source(&input, &source, &options)
                }
            };
            match &result {
                Ok(()) => info!("Completed processing {source}"),
                Err(e) => error!("Error processing {}: {e}", input.display()),
            }
            report.outcomes.push(SourceOutcome {
                source,
                input,
                result,
                elapsed: started.elapsed(),
            });
            pb.inc(1);
        }
        pb.finish_with_message(format!(
            "✅ Processed {} of {} file(s)",
            report.total() - report.failed(),
            report.total()
        ));

        Ok(report)
    }

    fn process_source(
        &self,
        input: &Path,
        source: &str,
        options: &TileOptions,
    ) -> Result<(), ProcessError> {
        info!("Processing {source}...");

        if self.toolchain.bindings() {
            inspect(input, source)?;
        }

        let tile_dir = self.config.output_dir.join(source);
        fs::create_dir_all(&tile_dir).map_err(|source| ProcessError::Io {
            context: format!("Failed to create {}", tile_dir.display()),
            source,
        })?;

        let scratch =
            ScratchVrt::create(&self.config.output_dir, source).map_err(|e| ProcessError::Io {
                context: "Failed to create temporary VRT directory".to_string(),
                source: e,
            })?;

        info!("Creating Web Mercator VRT...");
        self.execute(&self.toolchain.reproject(input, &scratch.path, options.resampling))?;

        info!(
            "Generating tiles for zoom levels {} to {}...",
            options.min_zoom, options.max_zoom
        );
        self.execute(&self.toolchain.tile(&scratch.path, &tile_dir, options))?;

        Ok(())
    }

    fn execute(&self, invocation: &Invocation) -> Result<CommandOutput, ProcessError> {
        info!("Running: {invocation}");
        let output = self
            .runner
            .run(invocation)
            .map_err(|source| ProcessError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        for line in output.stdout.lines().filter(|l| !l.trim().is_empty()) {
            debug!("{}", line.trim());
        }
        if !output.success() {
            return Err(ProcessError::Exit {
                program: invocation.program.clone(),
                status: output.status,
                stderr: output.stderr,
            });
        }
        for line in output.stderr.lines().filter(|l| !l.trim().is_empty()) {
            debug!("{}", line.trim());
        }
        Ok(output)
    }
}

#[cfg(feature = "bindings")]
fn inspect(input: &Path, source: &str) -> Result<(), ProcessError> {
    let summary = crate::toolchain::bindings::inspect(input)
        .map_err(|e| ProcessError::Inspect(e.to_string()))?;
    info!("{source}: {summary}");
    Ok(())
}

#[cfg(not(feature = "bindings"))]
fn inspect(_input: &Path, _source: &str) -> Result<(), ProcessError> {
    Ok(())
}
