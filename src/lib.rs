pub mod app;
pub mod batch;
pub mod config;
pub mod endpoints;
pub mod map;
pub mod server;
pub mod toolchain;
pub mod traits;
pub mod utils;

pub use config::{Config, Resampling, TileFormat};
pub use server::TileServer;
