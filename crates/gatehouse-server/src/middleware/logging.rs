//! Access log middleware.
//!
//! Opens one span per request. Proxied requests get the resolved domain, key
//! id and authorization decision recorded on it once the handler is done;
//! operational routes (`/health`, `/metrics`) are logged at debug so health checks
//! and scrapes do not drown the access log.

use axum::{
    body::Body,
    http::{Request, Response},
};
use std::{
    fmt,
    task::{Context, Poll},
    time::Instant,
};
use tower::{Layer, Service};
use tracing::{Instrument, Span, debug, field, info, info_span, warn};

use super::request_id::REQUEST_ID_HEADER;

/// Paths served by the proxy itself rather than the origin.
pub const OPERATIONAL_PATHS: [&str; 2] = ["/health", "/metrics"];

/// What the proxy decided for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Authorized and handed to the origin.
    Forwarded,
    /// Revoked or unknown key, or denied by the domain policy.
    Denied,
    /// Resolution or forwarding failed.
    Failed,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Forwarded => "forwarded",
            Decision::Denied => "denied",
            Decision::Failed => "failed",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Left on the response extensions by the proxy handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessLog {
    pub domain: String,
    pub key_id: String,
    pub decision: Decision,
}

/// Returns `"operational"` or `"proxy"` for `path`.
pub fn route_kind(path: &str) -> &'static str {
    if OPERATIONAL_PATHS.contains(&path) {
        "operational"
    } else {
        "proxy"
    }
}

/// Layer that writes the access log.
#[derive(Clone, Default)]
pub struct LoggingLayer;

impl<S> Layer<S> for LoggingLayer {
    type Service = LoggingMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LoggingMiddleware { inner }
    }
}

#[derive(Clone)]
pub struct LoggingMiddleware<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for LoggingMiddleware<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let start = Instant::now();
        let route = route_kind(request.uri().path());

        // Set by RequestIdMiddleware
        let request_id = request
            .headers()
            .get(&REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        let span = info_span!(
            "http_request",
            request_id = %request_id,
            method = %request.method(),
            path = %request.uri().path(),
            route,
            domain = field::Empty,
            key_id = field::Empty,
            decision = field::Empty,
        );
        let access_span = span.clone();

        let mut inner = self.inner.clone();

        Box::pin(
            async move {
                let response = inner.call(request).await?;

                let status = response.status().as_u16();
                let duration_ms = start.elapsed().as_millis() as u64;
                let decision = record_access(&access_span, &response);

                if route == "operational" {
                    debug!(status, duration_ms, "Request completed");
                } else if response.status().is_server_error() {
                    warn!(status, duration_ms, "Request failed");
                } else {
                    info!(status, duration_ms, decision, "Request completed");
                }

                Ok(response)
            }
            .instrument(span),
        )
    }
}

/// Copies the handler's `AccessLog` onto `span`. Requests rejected before
/// the handler ran (missing host or credentials) count as denied.
fn record_access(span: &Span, response: &Response<Body>) -> &'static str {
    match response.extensions().get::<AccessLog>() {
        Some(access) => {
            span.record("domain", access.domain.as_str());
            span.record("key_id", access.key_id.as_str());
            span.record("decision", access.decision.as_str());
            access.decision.as_str()
        },
        None if response.status().is_client_error() => {
            span.record("decision", Decision::Denied.as_str());
            Decision::Denied.as_str()
        },
        None => "-",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[test]
    fn test_route_kind() {
        assert_eq!(route_kind("/health"), "operational");
        assert_eq!(route_kind("/metrics"), "operational");
        assert_eq!(route_kind("/health/deep"), "proxy");
        assert_eq!(route_kind("/bucket/object"), "proxy");
    }

    #[test]
    fn test_record_access_reads_extension() {
        let mut response = Response::new(Body::empty());
        response.extensions_mut().insert(AccessLog {
            domain: "example.com".into(),
            key_id: "AKID1".into(),
            decision: Decision::Denied,
        });

        assert_eq!(record_access(&Span::none(), &response), "denied");
    }

    #[test]
    fn test_rejection_before_handler_counts_as_denied() {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::UNAUTHORIZED;

        assert_eq!(record_access(&Span::none(), &response), "denied");
        assert_eq!(record_access(&Span::none(), &Response::new(Body::empty())), "-");
    }

    #[tokio::test]
    async fn test_access_log_reaches_caller() {
        let service = LoggingLayer.layer(tower::service_fn(|_req: Request<Body>| async {
            let mut response = Response::new(Body::empty());
            response.extensions_mut().insert(AccessLog {
                domain: "example.com".into(),
                key_id: "AKID1".into(),
                decision: Decision::Forwarded,
            });
            Ok::<_, std::convert::Infallible>(response)
        }));

        let response = service
            .oneshot(Request::get("/bucket").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(
            response.extensions().get::<AccessLog>().map(|a| a.decision),
            Some(Decision::Forwarded)
        );
    }
}
