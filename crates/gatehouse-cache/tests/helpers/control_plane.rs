//! Wiremock stand-in for the control plane.

use std::sync::Arc;

use gatehouse_cache::{ControlPlaneClient, ControlPlaneConfig};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "test-token";

/// Client pointed at the mock server, with a short timeout.
pub fn client_for(server: &MockServer) -> Arc<ControlPlaneClient> {
    let config = ControlPlaneConfig::builder()
        .base_url(server.uri())
        .auth_token(TOKEN)
        .timeout(std::time::Duration::from_secs(2))
        .build()
        .expect("valid config");
    Arc::new(ControlPlaneClient::new(config).expect("client"))
}

/// Serves `body` as JSON on `route` for authenticated requests.
pub async fn mount_json(server: &MockServer, route: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Answers `route` with `status` and a plain text body.
pub async fn mount_status(server: &MockServer, route: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}
