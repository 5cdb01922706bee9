//! Static Leaflet viewer for the generated tile pyramids.

use crate::config::TileFormat;
use anyhow::Context;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const VIEWER_FILE: &str = "viewer.html";

const VIEWER_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0"/>
  <title>Raster Tile Viewer</title>
  <link
    rel="stylesheet"
    href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css"
    integrity="sha256-p4NxAoJBhIIN+hmNHrzRCf9tD/miZyoHS5obTRR9BMY="
    crossorigin=""
  />
  <style>
    html, body { height: 100%; margin: 0; padding: 0; }
    #map { height: 100%; width: 100%; }
    .layer-control {
      position: absolute;
      top: 10px;
      right: 10px;
      z-index: 1000;
      background: white;
      padding: 10px;
      border-radius: 4px;
      box-shadow: 0 1px 4px rgba(0,0,0,0.3);
    }
    .layer-control h3 { margin: 0 0 8px 0; }
    .layer-item { margin-bottom: 4px; }
  </style>
</head>
<body>
  <div id="map"></div>
  <div class="layer-control">
    <h3>Raster Layers</h3>
    <div id="layer-list"></div>
  </div>

  <script
    src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"
    integrity="sha256-20nQCchB9co0qIjJZRGuk2/Z9VM+kNiyxNV1lvTlZBo="
    crossorigin=""
  ></script>

  <script>
    const map = L.map('map').setView([0, 0], 2);

    // OpenStreetMap basemap, always at the bottom
    const baseLayer = L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', {
      maxZoom: 19,
      attribution: '&copy; <a href="https://www.openstreetmap.org/copyright">OpenStreetMap</a> contributors'
    });
    baseLayer.setZIndex(0);
    baseLayer.addTo(map);

    const layers = [['OpenStreetMap', baseLayer]];
"#;

const VIEWER_TAIL: &str = r#"
    const layerList = document.getElementById('layer-list');
    layers.forEach(([name, layer], index) => {
      const item = document.createElement('div');
      item.className = 'layer-item';

      const checkbox = document.createElement('input');
      checkbox.type = 'checkbox';
      checkbox.id = `layer-${index}`;
      // basemap and first raster layer start visible
      checkbox.checked = index <= 1;
      if (index === 1) {
        layer.setZIndex(1);
        layer.addTo(map);
      }

      const label = document.createElement('label');
      label.htmlFor = checkbox.id;
      label.textContent = name;

      checkbox.addEventListener('change', () => {
        if (checkbox.checked) {
          layer.addTo(map);
        } else {
          map.removeLayer(layer);
        }
      });

      item.appendChild(checkbox);
      item.appendChild(label);
      layerList.appendChild(item);
    });
  </script>
</body>
</html>
"#;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LayerOptions {
    min_zoom: u8,
    max_zoom: u8,
    attribution: &'static str,
}

const RASTER_LAYER_OPTIONS: LayerOptions = LayerOptions {
    min_zoom: 0,
    max_zoom: 18,
    attribution: "Generated Raster Tiles",
};

/// `http://localhost:<port>/<source>/{z}/{x}/{y}.<ext>`, with the source
/// name percent-encoded as a single path segment
pub fn tile_url(source: &str, port: u16, format: TileFormat) -> String {
    format!(
        "http://localhost:{port}/{}/{{z}}/{{x}}/{{y}}.{}",
        urlencoding::encode(source),
        format.extension()
    )
}

/// JSON string literal that is also safe inside a `<script>` element
fn js_string(value: &str) -> anyhow::Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

pub fn render_viewer(sources: &[String], port: u16, format: TileFormat) -> anyhow::Result<String> {
    let options = serde_json::to_string(&RASTER_LAYER_OPTIONS)?;
    let mut html = String::from(VIEWER_HEAD);

    for source in sources {
        html.push_str(&format!(
            "    layers.push([{}, L.tileLayer({}, {options})]);\n",
            js_string(source)?,
            js_string(&tile_url(source, port, format))?,
        ));
    }

    html.push_str(VIEWER_TAIL);
    Ok(html)
}

/// Write `viewer.html` into `output_dir` and return its path.
pub fn generate_viewer(
    sources: &[String],
    output_dir: &Path,
    port: u16,
    format: TileFormat,
) -> anyhow::Result<PathBuf> {
    let html = render_viewer(sources, port, format)?;
    let path = output_dir.join(VIEWER_FILE);
    fs::write(&path, html).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
