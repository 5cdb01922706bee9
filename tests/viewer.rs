use rastertiles::TileFormat;
use rastertiles::map::{VIEWER_FILE, generate_viewer};
use std::fs;

fn sources() -> Vec<String> {
    vec!["alpha".to_string(), "beta".to_string()]
}

#[test]
fn writes_viewer_into_output_dir() {
    let out = tempfile::tempdir().unwrap();
    let path = generate_viewer(&sources(), out.path(), 8090, TileFormat::Png).unwrap();
    assert_eq!(path, out.path().join(VIEWER_FILE));

    let html = fs::read_to_string(&path).unwrap();
    let raster_layers = html.matches("\"http://localhost:8090/").count();
    assert_eq!(raster_layers, 2);
    assert!(html.contains("http://localhost:8090/alpha/{z}/{x}/{y}.png"));
    assert!(html.contains("http://localhost:8090/beta/{z}/{x}/{y}.png"));
    assert_eq!(html.matches("tile.openstreetmap.org").count(), 1);
}

#[test]
fn regenerating_is_byte_identical() {
    let out = tempfile::tempdir().unwrap();
    let first = generate_viewer(&sources(), out.path(), 8090, TileFormat::Webp).unwrap();
    let before = fs::read(&first).unwrap();
    let second = generate_viewer(&sources(), out.path(), 8090, TileFormat::Webp).unwrap();
    assert_eq!(before, fs::read(&second).unwrap());
}

#[test]
fn missing_output_dir_is_an_error() {
    let out = tempfile::tempdir().unwrap();
    let missing = out.path().join("not-created");
    let err = generate_viewer(&sources(), &missing, 8090, TileFormat::Png).unwrap_err();
    assert!(err.to_string().contains("Failed to write"));
}
