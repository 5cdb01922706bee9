use clap::{Parser, ValueEnum};
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8090;

/// Image format written by the tiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TileFormat {
    Png,
    Jpg,
    Webp,
}

impl TileFormat {
    /// GDAL raster driver used for the tiles
    pub fn gdal_driver(self) -> &'static str {
        match self {
            TileFormat::Png => "PNG",
            TileFormat::Jpg => "JPEG",
            TileFormat::Webp => "WEBP",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            TileFormat::Png => "png",
            TileFormat::Jpg => "jpg",
            TileFormat::Webp => "webp",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Resampling {
    Nearest,
    Bilinear,
    Cubic,
    #[value(name = "cubicspline")]
    CubicSpline,
    Lanczos,
    Average,
    Mode,
}

impl Resampling {
    /// Name understood by both gdalwarp `-r` and gdal2tiles `--resampling`
    pub fn gdal_name(self) -> &'static str {
        match self {
            Resampling::Nearest => "near",
            Resampling::Bilinear => "bilinear",
            Resampling::Cubic => "cubic",
            Resampling::CubicSpline => "cubicspline",
            Resampling::Lanczos => "lanczos",
            Resampling::Average => "average",
            Resampling::Mode => "mode",
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(
    name = "rastertiles",
    version,
    about = "Process GeoTIFF files into XYZ tiles and serve them with a web viewer",
    long_about = None
)]
pub struct Config {
    /// Directory containing input .tif files
    #[arg(short, long, default_value = "raster_input")]
    pub input_dir: PathBuf,

    /// Directory to output raster tiles
    #[arg(short, long, default_value = "raster_tiles")]
    pub output_dir: PathBuf,

    /// Minimum zoom level to generate
    #[arg(long, default_value_t = 0)]
    pub min_zoom: u8,

    /// Maximum zoom level to generate
    #[arg(long, default_value_t = 14)]
    pub max_zoom: u8,

    /// Output format for the tiles
    #[arg(short, long, value_enum, default_value_t = TileFormat::Png)]
    pub format: TileFormat,

    /// Resampling method to use
    #[arg(short, long, value_enum, default_value_t = Resampling::Cubic)]
    pub resampling: Resampling,

    /// Port to serve the tiles on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Skip processing and only serve existing tiles
    #[arg(short, long)]
    pub serve_only: bool,

    /// Process and write the viewer, then exit without serving
    #[arg(long, conflicts_with = "serve_only")]
    pub no_serve: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Use only the GDAL command-line tools, even when built with libgdal bindings
    #[arg(long)]
    pub force_cli: bool,

    /// Process only this file from the input directory
    #[arg(long)]
    pub single_file: Option<String>,

    /// Tile edge length in pixels
    #[arg(long, default_value_t = 256)]
    pub tile_size: u32,

    /// Worker processes gdal2tiles may use (defaults to available parallelism)
    #[arg(long)]
    pub processes: Option<usize>,

    /// gdalwarp executable
    #[arg(long, default_value = "gdalwarp")]
    pub gdalwarp: String,

    /// gdal2tiles executable
    #[arg(long, default_value = "gdal2tiles.py")]
    pub gdal2tiles: String,
}

impl Default for Config {
    fn default() -> Self {
        Config::parse_from(["rastertiles"])
    }
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.min_zoom > self.max_zoom {
            anyhow::bail!(
                "Minimum zoom {} is greater than maximum zoom {}",
                self.min_zoom,
                self.max_zoom
            );
        }
        if self.tile_size == 0 {
            anyhow::bail!("Tile size must be greater than zero");
        }
        if self.processes == Some(0) {
            anyhow::bail!("--processes must be at least 1");
        }
        Ok(())
    }

    pub fn processes(&self) -> usize {
        self.processes.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}
