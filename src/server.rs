use crate::config::TileFormat;
use crate::endpoints::{AllowHeaders, access_log, with_cors};
use crate::map::{VIEWER_FILE, tile_url};
use anyhow::Context;
use axum::{Router, middleware};
use log::{info, warn};
use std::net::SocketAddr;
use std::path::PathBuf;
use tower_http::services::ServeDir;

/// Static file server for a tile directory, with CORS on every response.
pub struct TileServer {
    root: PathBuf,
    port: u16,
    allow_headers: AllowHeaders,
    viewer: Option<TileFormat>,
}

impl TileServer {
    pub fn new(root: impl Into<PathBuf>, port: u16, allow_headers: AllowHeaders) -> Self {
        Self {
            root: root.into(),
            port,
            allow_headers,
            viewer: None,
        }
    }

    /// Announce the generated viewer and the tile URL template at startup.
    pub fn with_viewer(mut self, format: TileFormat) -> Self {
        self.viewer = Some(format);
        self
    }

    pub fn router(&self) -> Router {
        let files = Router::new().fallback_service(ServeDir::new(&self.root));
        with_cors(files, self.allow_headers).layer(middleware::from_fn(access_log))
    }

    /// Serve until Ctrl+C.
    pub async fn start(self) -> anyhow::Result<()> {
        let app = self.router();
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;

        self.print_banner();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Server error")?;

        info!("Server stopped");
        Ok(())
    }

    fn print_banner(&self) {
        let base = format!("http://localhost:{}", self.port);
        println!(
            r#"
    🚀 Serving {} on {}/
    🔓 CORS enabled (Access-Control-Allow-Origin: *)"#,
            self.root.display(),
            base
        );
        if let Some(format) = self.viewer {
            println!(
                r#"
    🗺️ Tile URL template
       → {}

    🌍 Web viewer
       → {}/{}"#,
                tile_url("{source}", self.port, format),
                base,
                VIEWER_FILE
            );
        }
        println!("\n    Press Ctrl+C to stop the server\n");
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode, header};
    use std::fs;
    use tower::ServiceExt; // for `oneshot`

    async fn request(app: Router, method: Method, uri: &str) -> (StatusCode, String, bool) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let cors = res.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            == Some(&axum::http::HeaderValue::from_static("*"));
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&bytes).into_owned(), cors)
    }

    #[tokio::test]
    async fn serves_tiles_with_cors() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("dem/3/4")).unwrap();
        fs::write(root.path().join("dem/3/4/2.png"), b"tile").unwrap();

        let app = TileServer::new(root.path(), 0, AllowHeaders::Any).router();
        let (status, body, cors) = request(app, Method::GET, "/dem/3/4/2.png").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "tile");
        assert!(cors);
    }

    #[tokio::test]
    async fn viewer_urls_resolve_for_unusual_source_names() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("50% a#b/0/0")).unwrap();
        fs::write(root.path().join("50% a#b/0/0/0.png"), b"tile").unwrap();

        let url = tile_url("50% a#b", 0, TileFormat::Png);
        let path = url
            .trim_start_matches("http://localhost:0")
            .replace("{z}/{x}/{y}", "0/0/0");
        let app = TileServer::new(root.path(), 0, AllowHeaders::Any).router();
        let (status, body, _) = request(app, Method::GET, &path).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "tile");
    }

    #[tokio::test]
    async fn missing_file_is_404_with_cors() {
        let root = tempfile::tempdir().unwrap();
        let app = TileServer::new(root.path(), 0, AllowHeaders::Any).router();
        let (status, _, cors) = request(app, Method::GET, "/dem/9/9/9.png").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(cors);
    }

    #[tokio::test]
    async fn options_never_touches_the_filesystem() {
        let app = TileServer::new("/definitely/not/here", 0, AllowHeaders::ContentType).router();
        let (status, body, cors) = request(app, Method::OPTIONS, "/dem/0/0/0.png").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
        assert!(cors);
    }
}
