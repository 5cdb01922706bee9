use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use colored::{ColoredString, Colorize};
use log::info;

fn paint(status: StatusCode) -> ColoredString {
    let code = status.as_u16().to_string();
    if status.is_success() {
        code.green()
    } else if status.is_client_error() {
        code.yellow()
    } else if status.is_server_error() {
        code.red()
    } else {
        code.normal()
    }
}

/// One log line per request: method, path and coloured status.
pub async fn access_log(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    info!("\"{method} {path}\" {}", paint(response.status()));
    response
}
