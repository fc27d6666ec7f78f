//! In-process client driving the router through `oneshot`.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use gatehouse_cache::{ControlPlaneClient, ControlPlaneConfig, Resolver};
use gatehouse_server::{AppState, Forwarder, create_router_with_state};
use http_body_util::BodyExt;
use metrics_exporter_prometheus::PrometheusBuilder;
use tower::ServiceExt;

/// Nothing listens here; operational routes never reach it.
const UNREACHABLE: &str = "http://127.0.0.1:9";

pub struct TestClient {
    app: Router,
}

impl TestClient {
    pub fn new(app: Router) -> Self {
        Self { app }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, vec![], Body::empty()).await
    }

    pub async fn get_with_headers(&self, uri: &str, headers: Vec<(&str, &str)>) -> TestResponse {
        self.send(Method::GET, uri, headers, Body::empty()).await
    }

    /// GET addressed to `host`, authenticated with a bearer key id.
    pub async fn get_as(&self, host: &str, key_id: &str, uri: &str) -> TestResponse {
        let auth = format!("Bearer {key_id}");
        self.get_with_headers(uri, vec![("host", host), ("authorization", auth.as_str())])
            .await
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        headers: Vec<(&str, &str)>,
        body: Body,
    ) -> TestResponse {
        let mut request = Request::builder().uri(uri).method(method);
        for (name, value) in headers {
            request = request.header(name, value);
        }

        let response = self
            .app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();

        TestResponse {
            status,
            headers,
            body: body.to_vec(),
        }
    }
}

/// Status, headers and fully read body of a proxy response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("JSON body")
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(self.status, expected, "body: {}", self.text());
        self
    }

    pub fn assert_header_exists(&self, name: &str) -> &Self {
        assert!(self.headers.contains_key(name), "missing header {name}");
        self
    }

    pub fn assert_header(&self, name: &str, expected: &str) -> &Self {
        assert_eq!(self.header(name), Some(expected), "header {name}");
        self
    }

    pub fn assert_content_type_contains(&self, expected: &str) -> &Self {
        let content_type = self.header(header::CONTENT_TYPE.as_str()).unwrap_or_default();
        assert!(content_type.contains(expected), "content-type {content_type}");
        self
    }
}

/// Full router whose control plane and origin are unreachable. Enough for
/// operational routes and middleware.
pub fn client() -> TestClient {
    let config = ControlPlaneConfig::builder()
        .base_url(UNREACHABLE)
        .build()
        .unwrap();
    let resolver = Resolver::bypass(Arc::new(ControlPlaneClient::new(config).unwrap()));
    let forwarder = Forwarder::new(UNREACHABLE, false).unwrap();
    let prometheus = PrometheusBuilder::new().build_recorder().handle();

    TestClient::new(create_router_with_state(
        AppState::new(resolver, forwarder),
        prometheus,
    ))
}
