use clap::Parser;
use log::LevelFilter;
use rastertiles::TileServer;
use rastertiles::endpoints::AllowHeaders;

/// Serve the current directory over HTTP with CORS headers enabled
#[derive(Parser, Debug)]
#[command(name = "cors-server", version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(default_value_t = 8091)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let root = std::env::current_dir()?;
    TileServer::new(root, args.port, AllowHeaders::ContentType)
        .start()
        .await
}
