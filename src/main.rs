use anyhow::Context;
use clap::Parser;
use log::{LevelFilter, error};
use rastertiles::endpoints::AllowHeaders;
use rastertiles::toolchain::process::SystemRunner;
use rastertiles::{Config, TileServer, app};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = Config::parse();

    env_logger::Builder::new()
        .filter_level(if config.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .parse_default_env()
        .init();

    if let Err(e) = run(config).await {
        error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    let batch_config = config.clone();
    tokio::task::spawn_blocking(move || app::run(&batch_config, Arc::new(SystemRunner)))
        .await
        .context("Batch processing panicked")??;

    if config.no_serve {
        return Ok(());
    }

    TileServer::new(&config.output_dir, config.port, AllowHeaders::Any)
        .with_viewer(config.format)
        .start()
        .await
}
