//! Control plane and origin stand-ins, and a router wired to them.

use std::sync::Arc;

use gatehouse_cache::{ControlPlaneClient, ControlPlaneConfig, Resolver, ResolverConfig};
use gatehouse_server::{AppState, Forwarder, create_router_with_state};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::client::TestClient;

pub const CP_TOKEN: &str = "cp-token";
pub const ORIGIN_PATH: &str = "/origin";

/// Mock control plane and origin, plus a client for the proxy in front.
pub struct ProxyEnv {
    pub control_plane: MockServer,
    pub origin: MockServer,
    pub client: TestClient,
}

impl ProxyEnv {
    pub async fn start() -> Self {
        Self::start_with_tracing(true).await
    }

    /// Like `start`, choosing whether the forwarder sends `x-span-id`.
    pub async fn start_with_tracing(tracing_enabled: bool) -> Self {
        let control_plane = MockServer::start().await;
        let origin = MockServer::start().await;
        let origin_url = format!("{}{ORIGIN_PATH}", origin.uri());
        let client = proxy_client(&control_plane, &origin_url, tracing_enabled);

        Self {
            control_plane,
            origin,
            client,
        }
    }

    /// Key `key_id` belonging to `user_id`, with the given status.
    pub async fn key(&self, key_id: &str, user_id: &str, status: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/key/{key_id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "KeyID": key_id,
                "SecretKey": "secret",
                "UserID": user_id,
                "Status": status,
            })))
            .mount(&self.control_plane)
            .await;
    }

    /// Policy letting `principal` use `methods` on `domain`.
    pub async fn policy(&self, domain: &str, principal: &str, methods: &[&str]) {
        Mock::given(method("GET"))
            .and(path(format!("/domains/{domain}/config")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "domain": domain,
                "rules": [{"principals": [principal], "methods": methods, "path_prefix": "/"}],
            })))
            .mount(&self.control_plane)
            .await;
    }

    /// Answers any request on the origin with `template`.
    pub async fn origin_responds(&self, template: ResponseTemplate) {
        Mock::given(path(ORIGIN_PATH))
            .respond_with(template)
            .mount(&self.origin)
            .await;
    }

    pub async fn origin_requests(&self) -> Vec<wiremock::Request> {
        self.origin.received_requests().await.unwrap()
    }

    pub async fn control_plane_requests(&self) -> Vec<wiremock::Request> {
        self.control_plane.received_requests().await.unwrap()
    }
}

/// Proxy router resolving against `control_plane` and forwarding to
/// `origin_url`, caching locally.
pub fn proxy_client(
    control_plane: &MockServer,
    origin_url: &str,
    tracing_enabled: bool,
) -> TestClient {
    let config = ControlPlaneConfig::builder()
        .base_url(control_plane.uri())
        .auth_token(CP_TOKEN)
        .build()
        .unwrap();
    let resolver = Resolver::cached(
        Arc::new(ControlPlaneClient::new(config).unwrap()),
        ResolverConfig::default(),
        None,
    );
    let forwarder = Forwarder::new(origin_url, tracing_enabled).unwrap();

    // Recorder sin instalar: cada test tiene su propio handle
    let prometheus = PrometheusBuilder::new().build_recorder().handle();

    TestClient::new(create_router_with_state(
        AppState::new(resolver, forwarder),
        prometheus,
    ))
}
