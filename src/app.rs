//! One full batch run up to the point where the server would start.

use crate::batch::{BatchDriver, discover_sources};
use crate::config::Config;
use crate::map::generate_viewer;
use crate::toolchain::Toolchain;
use crate::traits::CommandRunner;
use crate::utils::status::print_batch_summary;
use anyhow::Context;
use log::{info, warn};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// What is ready to be served once [`run`] returns.
#[derive(Debug)]
pub struct Prepared {
    pub sources: Vec<String>,
    pub viewer: PathBuf,
    pub failed: usize,
}

/// Validates `config`, tiles the inputs (unless serve-only) and writes the
/// viewer.
///
/// Blocks until every external command has finished. Errors are fatal for
/// the whole run; with `no_serve`, so is any file that failed to tile.
pub fn run(config: &Config, runner: Arc<dyn CommandRunner>) -> anyhow::Result<Prepared> {
    config.validate()?;

    fs::create_dir_all(&config.input_dir)
        .with_context(|| format!("Failed to create {}", config.input_dir.display()))?;
    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("Failed to create {}", config.output_dir.display()))?;

    let mut failed = 0;
    let sources = if config.serve_only {
        let sources = discover_sources(&config.output_dir)?;
        if sources.is_empty() {
            anyhow::bail!("No tile sources found in {}", config.output_dir.display());
        }
        info!(
            "Found {} source(s) to serve: {}",
            sources.len(),
            sources.join(", ")
        );
        sources
    } else {
        info!("Processing GeoTIFFs from {}", config.input_dir.display());
        info!("Output directory: {}", config.output_dir.display());
        info!("Zoom levels: {} to {}", config.min_zoom, config.max_zoom);
        info!("Format: {}", config.format.extension());
        info!("Resampling: {}", config.resampling.gdal_name());

        let toolchain = Toolchain::probe(runner.as_ref(), &config.gdalwarp, &config.gdal2tiles)?
            .with_bindings(!config.force_cli);
        info!("GDAL toolchain: {}", toolchain.version());
        if let Some(release) = toolchain.bindings_release() {
            info!("Using libgdal {release}");
        }

        let report = BatchDriver::new(config.clone(), toolchain, runner).run()?;
        print_batch_summary(&report);

        let processed = report.processed();
        failed = report.failed();
        if processed.is_empty() {
            warn!("No sources were processed");
        } else {
            info!(
                "Successfully processed {} source(s): {}",
                processed.len(),
                processed.join(", ")
            );
            info!(
                "Tiles are available in {}",
                fs::canonicalize(&config.output_dir)
                    .unwrap_or_else(|_| config.output_dir.clone())
                    .display()
            );
        }
        processed
    };

    let viewer = generate_viewer(&sources, &config.output_dir, config.port, config.format)?;
    info!("Generated HTML viewer at {}", viewer.display());

    if config.no_serve && failed > 0 {
        anyhow::bail!("Failed to process {failed} file(s)");
    }

    Ok(Prepared {
        sources,
        viewer,
        failed,
    })
}
