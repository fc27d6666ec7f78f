//! Control-plane client configuration.

use std::time::Duration;

use gatehouse_core::GatehouseError;

/// Configuration for the control-plane client.
///
/// Not serializable: the token only leaves the process as a request header.
#[derive(Clone)]
pub struct ControlPlaneConfig {
    /// Base URL, e.g. `https://control.example.com/v1`.
    base_url: String,

    /// Bearer token sent on every request.
    auth_token: String,

    /// Request timeout.
    timeout: Duration,
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

impl ControlPlaneConfig {
    /// Creates a new builder for ControlPlaneConfig.
    pub fn builder() -> ControlPlaneConfigBuilder {
        ControlPlaneConfigBuilder::default()
    }

    /// Returns the base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the bearer token.
    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    /// Returns the request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl std::fmt::Debug for ControlPlaneConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlPlaneConfig")
            .field("base_url", &self.base_url)
            .field("auth_token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Builder for ControlPlaneConfig.
#[derive(Debug, Default)]
pub struct ControlPlaneConfigBuilder {
    base_url: Option<String>,
    auth_token: Option<String>,
    timeout: Option<Duration>,
}

impl ControlPlaneConfigBuilder {
    /// Sets the control-plane base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the bearer token.
    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the base URL is missing or not http(s).
    pub fn build(self) -> Result<ControlPlaneConfig, GatehouseError> {
        let base_url = self
            .base_url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| GatehouseError::configuration("control plane base URL is required"))?;

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(GatehouseError::configuration(format!(
                "control plane base URL must be http(s): {base_url}"
            )));
        }

        Ok(ControlPlaneConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token: self.auth_token.unwrap_or_default(),
            timeout: self.timeout.unwrap_or_else(default_timeout),
        })
    }
}
