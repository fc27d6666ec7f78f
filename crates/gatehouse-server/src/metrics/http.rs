//! HTTP metrics middleware.

use axum::{body::Body, extract::MatchedPath, http::Request, middleware::Next, response::Response};
use metrics::{counter, histogram};
use std::time::Instant;

/// Label used for requests handled by the proxy fallback; paths there are
/// caller-controlled and would blow up label cardinality.
const PROXY_PATH_LABEL: &str = "proxy";

/// Middleware que registra metricas HTTP para cada request.
pub async fn http_metrics_middleware(
    matched_path: Option<MatchedPath>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = matched_path
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| PROXY_PATH_LABEL.to_string());

    let response = next.run(request).await;

    let status = response.status().as_u16().to_string();

    counter!(
        "gatehouse_http_requests_total",
        "method" => method.clone(),
        "path" => path.clone(),
        "status" => status
    )
    .increment(1);

    histogram!(
        "gatehouse_http_request_duration_seconds",
        "method" => method,
        "path" => path
    )
    .record(start.elapsed().as_secs_f64());

    response
}

/// Registra las metricas HTTP
pub fn register_http_metrics() {
    metrics::describe_counter!(
        "gatehouse_http_requests_total",
        "Total number of HTTP requests"
    );
    metrics::describe_histogram!(
        "gatehouse_http_request_duration_seconds",
        "HTTP request duration in seconds (until response headers)"
    );
    metrics::describe_counter!(
        "gatehouse_origin_requests_total",
        "Requests forwarded to the origin, by outcome"
    );
    metrics::describe_histogram!(
        "gatehouse_origin_response_seconds",
        "Time until the origin sent response headers"
    );
}
