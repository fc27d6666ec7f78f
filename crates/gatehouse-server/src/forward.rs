//! Streaming forwarder to the origin.

use std::time::Instant;

use axum::{
    body::{Body, HttpBody},
    http::{HeaderName, HeaderValue, Request, Response, header},
};
use bytes::Bytes;
use futures::StreamExt;
use gatehouse_core::{GatehouseError, Result};
use metrics::{counter, histogram};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{Span, debug, instrument};
use uuid::Uuid;

use crate::middleware::{REQUEST_ID_HEADER, RequestId};

/// Header carrying the current span id to the origin.
pub static SPAN_ID_HEADER: HeaderName = HeaderName::from_static("x-span-id");

/// Chunks buffered between the inbound body and the outbound request.
const BODY_BUFFER: usize = 16;

/// Forwards authorized requests to a single fixed origin.
///
/// Bodies are streamed both ways; nothing is buffered whole.
#[derive(Debug, Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    origin: reqwest::Url,
    tracing_enabled: bool,
}

impl Forwarder {
    pub fn new(origin_url: &str, tracing_enabled: bool) -> Result<Self> {
        let origin = reqwest::Url::parse(origin_url).map_err(|e| {
            GatehouseError::configuration(format!("invalid origin_url {origin_url}: {e}"))
        })?;
        let client = reqwest::Client::builder()
            .build()
            .map_err(GatehouseError::transport)?;

        Ok(Self {
            client,
            origin,
            tracing_enabled,
        })
    }

    pub fn origin(&self) -> &reqwest::Url {
        &self.origin
    }

    /// Sends `request` to the origin and streams the answer back.
    ///
    /// Method and headers are kept (except `Host`), credentials included.
    /// Status and headers of the origin's response are copied verbatim.
    ///
    /// # Errors
    ///
    /// `GatehouseError::Transport` if the origin cannot be reached. There is
    /// no retry.
    #[instrument(skip_all, fields(method = %request.method()))]
    pub async fn forward(&self, request: Request<Body>) -> Result<Response<Body>> {
        let start = Instant::now();
        let (parts, body) = request.into_parts();

        let mut headers = parts.headers;
        headers.remove(header::HOST);

        let request_id = parts
            .extensions
            .get::<RequestId>()
            .map(|id| id.as_str().to_string())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            headers.insert(REQUEST_ID_HEADER.clone(), value);
        }

        if self.tracing_enabled
            && let Some(id) = Span::current().id()
            && let Ok(value) = HeaderValue::from_str(&format!("{:016x}", id.into_u64()))
        {
            headers.insert(SPAN_ID_HEADER.clone(), value);
        }

        let mut outbound = self
            .client
            .request(parts.method, self.origin.clone())
            .headers(headers);
        if body.size_hint().exact() != Some(0) {
            outbound = outbound.body(stream_body(body));
        }

        let response = outbound.send().await.map_err(|e| {
            counter!("gatehouse_origin_requests_total", "outcome" => "error").increment(1);
            GatehouseError::transport(e)
        })?;

        let status = response.status();
        let headers = response.headers().clone();
        debug!(status = status.as_u16(), "Origin answered");

        counter!("gatehouse_origin_requests_total", "outcome" => "ok").increment(1);
        histogram!("gatehouse_origin_response_seconds").record(start.elapsed().as_secs_f64());

        let mut forwarded = Response::new(Body::from_stream(response.bytes_stream()));
        *forwarded.status_mut() = status;
        *forwarded.headers_mut() = headers;
        Ok(forwarded)
    }
}

/// Pipes the inbound body through a bounded channel so the origin request
/// only ever holds a few chunks in memory.
fn stream_body(body: Body) -> reqwest::Body {
    let (tx, rx) = mpsc::channel::<std::result::Result<Bytes, axum::Error>>(BODY_BUFFER);

    tokio::spawn(async move {
        let mut chunks = body.into_data_stream();
        while let Some(chunk) = chunks.next().await {
            if tx.send(chunk).await.is_err() {
                // Origin request dropped.
                break;
            }
        }
    });

    reqwest::Body::wrap_stream(ReceiverStream::new(rx))
}
