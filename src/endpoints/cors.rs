//! Fixed, permissive CORS headers for every response.
//!
//! The middleware wraps whatever service sits below it: preflight requests
//! are answered directly, everything else is passed through and decorated
//! on the way out, whatever its status.

use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};

/// Value of `Access-Control-Allow-Headers`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowHeaders {
    /// `*`, used by the tile server
    Any,
    /// `Content-Type`, used by the standalone server
    ContentType,
}

impl AllowHeaders {
    fn value(self) -> HeaderValue {
        match self {
            AllowHeaders::Any => HeaderValue::from_static("*"),
            AllowHeaders::ContentType => HeaderValue::from_static("Content-Type"),
        }
    }
}

pub fn apply_cors_headers(headers: &mut HeaderMap, allow_headers: AllowHeaders) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, OPTIONS"),
    );
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, allow_headers.value());
}

pub async fn cors(
    State(allow_headers): State<AllowHeaders>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::OK.into_response()
    } else {
        next.run(request).await
    };
    apply_cors_headers(response.headers_mut(), allow_headers);
    response
}

/// Wrap every route and fallback of `router` with [`cors`].
pub fn with_cors<S>(router: Router<S>, allow_headers: AllowHeaders) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(allow_headers, cors))
}
