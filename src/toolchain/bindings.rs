use gdal::Dataset;
use std::fmt;
use std::path::Path;

/// What libgdal reports about an input before it is handed to the tools.
#[derive(Debug, Clone)]
pub struct RasterSummary {
    pub width: usize,
    pub height: usize,
    pub bands: usize,
    pub srs: Option<String>,
}

impl fmt::Display for RasterSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} px, {} band(s), CRS {}",
            self.width,
            self.height,
            self.bands,
            self.srs.as_deref().unwrap_or("unknown")
        )
    }
}

pub fn inspect(path: &Path) -> anyhow::Result<RasterSummary> {
    let ds = Dataset::open(path)?;
    let (width, height) = ds.raster_size();
    let srs = ds.spatial_ref().ok().and_then(|sref| {
        match (sref.auth_name(), sref.auth_code()) {
            (Ok(name), Ok(code)) => Some(format!("{name}:{code}")),
            _ => None,
        }
    });

    Ok(RasterSummary {
        width,
        height,
        bands: ds.raster_count(),
        srs,
    })
}

pub fn release_name() -> String {
    gdal::version::version_info("RELEASE_NAME")
}
