use std::{fmt::Display, time::Duration};

use axum::{
    Router,
    body::{Body, Bytes},
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::trace::TraceLayer;
use tracing::{Span, error, info, info_span};

use crate::consts::{CACHE_NAME, CACHE_STATUS_HEADER, CACHE_VERSION_HEADER, NAME, VERSION};

/// Middleware for adding version information to each response's headers.
///
/// - "Server": the package name and version.
/// - "X-Pnnx-Cache-Version": the name of the cache store in use.
pub async fn add_version(req: Request<Body>, next: Next) -> impl IntoResponse {
    let mut res = next.run(req).await;
    let headers = res.headers_mut();
    if let Ok(server) = HeaderValue::from_str(&format!("{NAME}/{VERSION}")) {
        headers.insert("Server", server);
    }
    headers.insert(CACHE_VERSION_HEADER, HeaderValue::from_static(CACHE_NAME));
    res
}

/// Middleware for logging each request.
///
/// This middleware will calculate each request latency
/// and add request's information to each info_span.
pub fn logging_route(router: Router) -> Router {
    let make_span = |req: &Request<_>| {
        let unknown = &HeaderValue::from_static("Unknown");
        let empty = &HeaderValue::from_static("");
        let headers = req.headers();
        let ua = headers
            .get("User-Agent")
            .unwrap_or(unknown)
            .to_str()
            .unwrap_or("Unknown");
        let client = headers
            .get("X-Client-Id")
            .unwrap_or(empty)
            .to_str()
            .unwrap_or("");
        info_span!("HTTP", method = ?req.method(), uri = ?req.uri(), client, ua)
    };

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(make_span)
        .on_request(|_req: &Request<_>, _span: &Span| {})
        .on_response(|res: &Response, latency: Duration, _span: &Span| {
            let cache = res
                .headers()
                .get(CACHE_STATUS_HEADER)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            info!("{} cache={cache}", format_latency(latency, res.status()));
        })
        .on_body_chunk(|_chunk: &Bytes, _latency: Duration, _span: &Span| {})
        .on_eos(|_trailers: Option<&HeaderMap>, _stream_duration: Duration, _span: &Span| {})
        .on_failure(
            |error: ServerErrorsFailureClass, latency: Duration, _span: &Span| {
                error!("{}", format_latency(latency, error));
            },
        );

    router.layer(trace_layer)
}

/// Format request latency and status message
/// return a string
fn format_latency(latency: Duration, status: impl Display) -> String {
    let micros = latency.as_micros();
    let millis = latency.as_millis();
    if micros >= 1000 {
        format!("{status} {millis}ms")
    } else {
        format!("{status} {micros}μs")
    }
}
