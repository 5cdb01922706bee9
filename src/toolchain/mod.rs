//! The external GDAL toolchain: availability probe and command construction.
//!
//! Reprojection and tiling are never done in-process. A [`Toolchain`] can
//! only be obtained from a successful [`Toolchain::probe`], so holding one is
//! proof that both tools answered their `--version` call.

#[cfg(feature = "bindings")]
pub mod bindings;
pub mod process;

use crate::config::{Config, Resampling, TileFormat};
use crate::traits::CommandRunner;
use log::debug;
use process::Invocation;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Web Mercator, the reference system every tile pyramid is built in
pub const TARGET_SRS: &str = "EPSG:3857";

#[derive(Debug, Error)]
pub enum ToolchainError {
    /// The executable could not be started
    #[error(
        "{tool} not found ({source}). Please install the GDAL command-line tools, \
         e.g. 'conda install -c conda-forge gdal'"
    )]
    Missing {
        tool: String,
        #[source]
        source: io::Error,
    },
    /// The executable started but `--version` failed
    #[error("{tool} --version failed with code {}: {}", exit_code(.status), .stderr.trim())]
    Broken {
        tool: String,
        status: Option<i32>,
        stderr: String,
    },
}

fn exit_code(status: &Option<i32>) -> String {
    status.map_or_else(|| "<signal>".to_string(), |c| c.to_string())
}

/// Everything gdal2tiles needs besides its input and output paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileOptions {
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub resampling: Resampling,
    pub format: TileFormat,
    pub tile_size: u32,
    pub processes: usize,
}

impl From<&Config> for TileOptions {
    fn from(config: &Config) -> Self {
        Self {
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            resampling: config.resampling,
            format: config.format,
            tile_size: config.tile_size,
            processes: config.processes(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toolchain {
    gdalwarp: String,
    gdal2tiles: String,
    version: String,
    bindings: bool,
}

impl Toolchain {
    /// Runs `--version` on both tools once.
    pub fn probe(
        runner: &dyn CommandRunner,
        gdalwarp: &str,
        gdal2tiles: &str,
    ) -> Result<Self, ToolchainError> {
        let version = probe_tool(runner, gdalwarp)?;
        let tiler_version = probe_tool(runner, gdal2tiles)?;
        debug!("Found {gdalwarp}: {version}");
        debug!("Found {gdal2tiles}: {tiler_version}");

        Ok(Self {
            gdalwarp: gdalwarp.to_string(),
            gdal2tiles: gdal2tiles.to_string(),
            version,
            bindings: false,
        })
    }

    /// Enable per-file inspection through libgdal. Ignored unless the crate
    /// was built with the `bindings` feature.
    pub fn with_bindings(mut self, enabled: bool) -> Self {
        self.bindings = enabled && cfg!(feature = "bindings");
        self
    }

    pub fn bindings(&self) -> bool {
        self.bindings
    }

    /// libgdal release used for inspection, when enabled
    #[cfg(feature = "bindings")]
    pub fn bindings_release(&self) -> Option<String> {
        self.bindings.then(bindings::release_name)
    }

    #[cfg(not(feature = "bindings"))]
    pub fn bindings_release(&self) -> Option<String> {
        None
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// gdalwarp into a Web Mercator VRT
    pub fn reproject(&self, input: &Path, vrt: &Path, resampling: Resampling) -> Invocation {
        Invocation::new(&self.gdalwarp)
            .arg("-t_srs")
            .arg(TARGET_SRS)
            .arg("-r")
            .arg(resampling.gdal_name())
            .arg("-of")
            .arg("VRT")
            .arg(input)
            .arg(vrt)
    }

    /// gdal2tiles over the reprojected VRT, XYZ tile numbering
    pub fn tile(&self, vrt: &Path, tile_dir: &Path, options: &TileOptions) -> Invocation {
        Invocation::new(&self.gdal2tiles)
            .arg("--zoom")
            .arg(format!("{}-{}", options.min_zoom, options.max_zoom))
            .arg("--resampling")
            .arg(options.resampling.gdal_name())
            .arg("--webviewer")
            .arg("none")
            .arg("--xyz")
            .arg("--tilesize")
            .arg(options.tile_size.to_string())
            .arg("--processes")
            .arg(options.processes.to_string())
            .arg("--tiledriver")
            .arg(options.format.gdal_driver())
            .arg(vrt)
            .arg(tile_dir)
    }
}

fn probe_tool(runner: &dyn CommandRunner, tool: &str) -> Result<String, ToolchainError> {
    let output = runner
        .run(&Invocation::new(tool).arg("--version"))
        .map_err(|source| ToolchainError::Missing {
            tool: tool.to_string(),
            source,
        })?;
    if !output.success() {
        return Err(ToolchainError::Broken {
            tool: tool.to_string(),
            status: output.status,
            stderr: output.stderr,
        });
    }
    Ok(output.stdout.lines().next().unwrap_or_default().trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::process::CommandOutput;
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    struct Scripted {
        calls: Mutex<Vec<Invocation>>,
        reply: fn(&Invocation) -> io::Result<CommandOutput>,
    }

    impl CommandRunner for Scripted {
        fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
            self.calls.lock().unwrap().push(invocation.clone());
            (self.reply)(invocation)
        }
    }

    fn scripted(reply: fn(&Invocation) -> io::Result<CommandOutput>) -> Scripted {
        Scripted {
            calls: Mutex::new(Vec::new()),
            reply,
        }
    }

    fn options() -> TileOptions {
        TileOptions {
            min_zoom: 3,
            max_zoom: 9,
            resampling: Resampling::Nearest,
            format: TileFormat::Webp,
            tile_size: 512,
            processes: 4,
        }
    }

    #[test]
    fn probe_reads_first_version_line() {
        let runner = scripted(|_| {
            Ok(CommandOutput {
                status: Some(0),
                stdout: "GDAL 3.9.1, released 2024/06/22\n".into(),
                stderr: String::new(),
            })
        });
        let toolchain = Toolchain::probe(&runner, "gdalwarp", "gdal2tiles.py").unwrap();
        assert_eq!(toolchain.version(), "GDAL 3.9.1, released 2024/06/22");
        assert!(!toolchain.bindings());

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].to_string(), "gdalwarp --version");
        assert_eq!(calls[1].to_string(), "gdal2tiles.py --version");
    }

    #[test]
    fn probe_reports_missing_tool() {
        let runner = scripted(|_| Err(io::Error::from(io::ErrorKind::NotFound)));
        let err = Toolchain::probe(&runner, "gdalwarp", "gdal2tiles.py").unwrap_err();
        assert!(matches!(err, ToolchainError::Missing { ref tool, .. } if tool == "gdalwarp"));
        assert!(err.to_string().contains("install the GDAL command-line tools"));
        assert_eq!(runner.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn probe_reports_failing_tool() {
        let runner = scripted(|inv| {
            Ok(CommandOutput {
                status: Some(if inv.program == "gdal2tiles.py" { 1 } else { 0 }),
                stdout: "GDAL 3.9.1\n".into(),
                stderr: "ModuleNotFoundError: No module named 'osgeo'\n".into(),
            })
        });
        let err = Toolchain::probe(&runner, "gdalwarp", "gdal2tiles.py").unwrap_err();
        assert!(matches!(err, ToolchainError::Broken { status: Some(1), .. }));
        assert!(err.to_string().contains("No module named 'osgeo'"));
    }

    #[test]
    fn builds_reprojection_and_tiling_commands() {
        let toolchain = Toolchain {
            gdalwarp: "gdalwarp".into(),
            gdal2tiles: "gdal2tiles.py".into(),
            version: String::new(),
            bindings: false,
        };
        let vrt = PathBuf::from("out/dem.vrt");
        let warp = toolchain.reproject(Path::new("in/dem.tif"), &vrt, Resampling::Nearest);
        assert_eq!(
            warp.to_string(),
            "gdalwarp -t_srs EPSG:3857 -r near -of VRT in/dem.tif out/dem.vrt"
        );

        let tile = toolchain.tile(&vrt, Path::new("out/dem"), &options());
        assert_eq!(
            tile.to_string(),
            "gdal2tiles.py --zoom 3-9 --resampling near --webviewer none --xyz \
             --tilesize 512 --processes 4 --tiledriver WEBP out/dem.vrt out/dem"
        );
    }
}
