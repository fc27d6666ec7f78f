use bytes::Bytes;
use gatehouse_core::{GatehouseError, ResourceKind, Result, RoutingKey};
use tracing::{debug, instrument};

use super::ControlPlaneConfig;

/// Authenticated HTTP client for the control plane.
///
/// Performs exactly one request per call; retries are left to the caller.
#[derive(Debug, Clone)]
pub struct ControlPlaneClient {
    http: reqwest::Client,
    config: ControlPlaneConfig,
}

impl ControlPlaneClient {
    /// Creates a new client.
    pub fn new(config: ControlPlaneConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(GatehouseError::transport)?;

        Ok(Self { http, config })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &ControlPlaneConfig {
        &self.config
    }

    /// Builds the request URL for a resource.
    pub fn url_for(&self, kind: ResourceKind, key: &RoutingKey) -> String {
        let escaped = urlencoding::encode(key.as_str());
        format!("{}/{}", self.config.base_url(), kind.path_for(&escaped))
    }

    /// Fetches the raw bytes of one resource.
    ///
    /// # Errors
    ///
    /// - `GatehouseError::Transport` if the control plane cannot be reached
    ///   or the body cannot be read
    /// - `GatehouseError::Upstream` for any status above 299, carrying the
    ///   status and the body text
    #[instrument(skip_all, fields(kind = %kind, key = %key))]
    pub async fn fetch(&self, kind: ResourceKind, key: &RoutingKey) -> Result<Bytes> {
        let url = self.url_for(kind, key);

        let response = self
            .http
            .get(&url)
            .bearer_auth(self.config.auth_token())
            .send()
            .await
            .map_err(GatehouseError::transport)?;

        let status = response.status();

        // Body is read to the end on every path so the connection goes back
        // to the pool.
        let body = response.bytes().await.map_err(GatehouseError::transport)?;

        if status.as_u16() > 299 {
            debug!(status = status.as_u16(), "Control plane rejected request");
            return Err(GatehouseError::upstream(
                status.as_u16(),
                String::from_utf8_lossy(&body),
            ));
        }

        debug!(bytes = body.len(), "Fetched from control plane");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> ControlPlaneClient {
        let config = ControlPlaneConfig::builder()
            .base_url("http://cp.local/api/")
            .auth_token("t")
            .build()
            .unwrap();
        ControlPlaneClient::new(config).unwrap()
    }

    #[test]
    fn test_url_for_each_kind() {
        let client = client();
        let domain = RoutingKey::new("example.com").unwrap();
        let key = RoutingKey::new("AKID123").unwrap();

        assert_eq!(
            client.url_for(ResourceKind::Policy, &domain),
            "http://cp.local/api/domains/example.com/config"
        );
        assert_eq!(
            client.url_for(ResourceKind::Certificate, &domain),
            "http://cp.local/api/domains/example.com/cert"
        );
        assert_eq!(
            client.url_for(ResourceKind::ApiKey, &key),
            "http://cp.local/api/key/AKID123"
        );
    }

    #[test]
    fn test_url_escapes_key() {
        let client = client();
        let key = RoutingKey::new("a/b c").unwrap();

        assert_eq!(
            client.url_for(ResourceKind::ApiKey, &key),
            "http://cp.local/api/key/a%2Fb%20c"
        );
    }
}
