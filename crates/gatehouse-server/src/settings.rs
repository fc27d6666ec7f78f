//! Process configuration.
//!
//! Loaded from an optional TOML file overlaid by `GATEHOUSE__*` environment
//! variables, e.g. `GATEHOUSE__CACHE__PEERS=http://a:9000,http://b:9000`.

use std::net::SocketAddr;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat};
use gatehouse_cache::{ControlPlaneConfig, GroupConfig, PeerConfig, ResolverConfig};
use gatehouse_core::{GatehouseError, Result};
use serde::Deserialize;

/// Default config file, overridable with `GATEHOUSE_CONFIG`.
pub const DEFAULT_CONFIG_FILE: &str = "gatehouse.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub listen_addr: SocketAddr,
    pub control_plane: ControlPlaneSettings,
    /// Every authorized request is forwarded here.
    pub origin_url: String,
    /// Sends `x-span-id` to the origin when set.
    pub tracing_enabled: bool,
    pub cache: CacheSettings,
    pub shutdown: ShutdownSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlPlaneSettings {
    pub base_url: String,
    pub auth_token: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Bypass mode when false.
    pub enabled: bool,
    pub self_addr: String,
    pub peers: Vec<String>,
    pub replicas: usize,
    pub peer_timeout_ms: u64,
    pub policy: GroupSettings,
    pub keys: GroupSettings,
    pub certificates: GroupSettings,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct GroupSettings {
    pub ttl_seconds: u64,
    pub capacity_bytes: u64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ShutdownSettings {
    /// Sleep after the signal so a load balancer can deregister us.
    pub drain_seconds: u64,
    /// Hard deadline for graceful shutdown.
    pub grace_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            control_plane: ControlPlaneSettings::default(),
            origin_url: String::new(),
            tracing_enabled: false,
            cache: CacheSettings::default(),
            shutdown: ShutdownSettings::default(),
        }
    }
}

impl Default for ControlPlaneSettings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            auth_token: String::new(),
            timeout_ms: 10_000,
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            self_addr: String::new(),
            peers: Vec::new(),
            replicas: gatehouse_cache::peer::DEFAULT_REPLICAS,
            peer_timeout_ms: 5_000,
            policy: GroupSettings::default(),
            keys: GroupSettings::default(),
            certificates: GroupSettings::default(),
        }
    }
}

impl Default for GroupSettings {
    fn default() -> Self {
        Self {
            ttl_seconds: 300,
            capacity_bytes: 10_000_000,
        }
    }
}

impl Default for ShutdownSettings {
    fn default() -> Self {
        Self {
            drain_seconds: 0,
            grace_seconds: 10,
        }
    }
}

impl Settings {
    /// Loads settings from the config file and the process environment.
    pub fn load() -> std::result::Result<Self, ConfigError> {
        let path =
            std::env::var("GATEHOUSE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        Self::build(
            File::new(&path, FileFormat::Toml).required(false),
            Self::environment(),
        )
    }

    /// Parses settings from TOML text, overlaid by `env`. Used by tests.
    pub fn from_toml(toml: &str, env: Environment) -> std::result::Result<Self, ConfigError> {
        Self::build(File::from_str(toml, FileFormat::Toml), env)
    }

    /// The environment source, `GATEHOUSE__SECTION__FIELD`.
    pub fn environment() -> Environment {
        Environment::with_prefix("GATEHOUSE")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("cache.peers")
            .try_parsing(true)
    }

    fn build<F>(file: F, env: Environment) -> std::result::Result<Self, ConfigError>
    where
        F: config::Source + Send + Sync + 'static,
    {
        Config::builder()
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()
    }

    /// Rejects settings the process cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.control_plane.base_url.is_empty() {
            return Err(GatehouseError::configuration(
                "control_plane.base_url is required",
            ));
        }
        if self.origin_url.is_empty() {
            return Err(GatehouseError::configuration("origin_url is required"));
        }

        for (name, group) in [
            ("policy", &self.cache.policy),
            ("keys", &self.cache.keys),
            ("certificates", &self.cache.certificates),
        ] {
            if group.capacity_bytes == 0 {
                return Err(GatehouseError::configuration(format!(
                    "cache.{name}.capacity_bytes must be positive"
                )));
            }
        }

        if self.cache.enabled {
            let self_addr = self.cache.self_addr.trim_end_matches('/');
            if self_addr.is_empty() {
                return Err(GatehouseError::configuration(
                    "cache.self_addr is required when caching is enabled",
                ));
            }
            if !self
                .cache
                .peers
                .iter()
                .any(|peer| peer.trim().trim_end_matches('/') == self_addr)
            {
                return Err(GatehouseError::configuration(format!(
                    "cache.peers must include cache.self_addr ({self_addr})"
                )));
            }
        }

        Ok(())
    }

    pub fn control_plane_config(&self) -> Result<ControlPlaneConfig> {
        ControlPlaneConfig::builder()
            .base_url(&self.control_plane.base_url)
            .auth_token(&self.control_plane.auth_token)
            .timeout(self.control_plane.timeout())
            .build()
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            policy: self.cache.policy.group_config(),
            keys: self.cache.keys.group_config(),
            certificates: self.cache.certificates.group_config(),
        }
    }

    pub fn peer_config(&self) -> PeerConfig {
        PeerConfig {
            replicas: self.cache.replicas,
            timeout: Duration::from_millis(self.cache.peer_timeout_ms),
        }
    }
}

impl ControlPlaneSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl GroupSettings {
    pub fn group_config(&self) -> GroupConfig {
        GroupConfig::new(self.ttl_seconds, self.capacity_bytes)
    }
}

impl ShutdownSettings {
    pub fn drain(&self) -> Duration {
        Duration::from_secs(self.drain_seconds)
    }

    pub fn grace(&self) -> Duration {
        Duration::from_secs(self.grace_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const BASE: &str = r#"
        origin_url = "http://origin.internal:9000"

        [control_plane]
        base_url = "http://cp.internal"
        auth_token = "secret"
    "#;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::environment().source(Some(map))
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_toml(BASE, env(&[])).unwrap();

        assert_eq!(settings.listen_addr.port(), 8080);
        assert!(!settings.cache.enabled);
        assert_eq!(settings.cache.replicas, 50);
        assert_eq!(settings.cache.policy.ttl_seconds, 300);
        assert_eq!(settings.cache.certificates.capacity_bytes, 10_000_000);
        assert_eq!(settings.control_plane.timeout(), Duration::from_secs(10));
        assert_eq!(settings.shutdown.grace(), Duration::from_secs(10));
        assert_eq!(settings.shutdown.drain(), Duration::ZERO);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_environment_overrides_file() {
        let settings = Settings::from_toml(
            BASE,
            env(&[
                ("GATEHOUSE__CACHE__ENABLED", "true"),
                ("GATEHOUSE__CACHE__SELF_ADDR", "http://10.0.0.1:9000"),
                (
                    "GATEHOUSE__CACHE__PEERS",
                    "http://10.0.0.1:9000,http://10.0.0.2:9000",
                ),
                ("GATEHOUSE__CACHE__POLICY__TTL_SECONDS", "60"),
                ("GATEHOUSE__SHUTDOWN__DRAIN_SECONDS", "5"),
            ]),
        )
        .unwrap();

        assert!(settings.cache.enabled);
        assert_eq!(settings.cache.peers.len(), 2);
        assert_eq!(settings.cache.policy.ttl_seconds, 60);
        assert_eq!(settings.shutdown.drain(), Duration::from_secs(5));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_self_addr_must_be_a_peer() {
        let settings = Settings::from_toml(
            BASE,
            env(&[
                ("GATEHOUSE__CACHE__ENABLED", "true"),
                ("GATEHOUSE__CACHE__SELF_ADDR", "http://10.0.0.3:9000"),
                ("GATEHOUSE__CACHE__PEERS", "http://10.0.0.1:9000,http://10.0.0.2:9000"),
            ]),
        )
        .unwrap();

        let err = settings.validate().unwrap_err();
        assert!(matches!(err, GatehouseError::Configuration(_)));
    }

    #[test]
    fn test_missing_origin_is_rejected() {
        let settings = Settings::from_toml(
            r#"
            [control_plane]
            base_url = "http://cp.internal"
            "#,
            env(&[]),
        )
        .unwrap();

        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let settings = Settings::from_toml(
            BASE,
            env(&[("GATEHOUSE__CACHE__KEYS__CAPACITY_BYTES", "0")]),
        )
        .unwrap();

        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_derived_configs() {
        let settings = Settings::from_toml(BASE, env(&[])).unwrap();

        assert_eq!(settings.resolver_config(), ResolverConfig::default());
        assert_eq!(settings.peer_config(), PeerConfig::default());
        assert_eq!(
            settings.control_plane_config().unwrap().base_url(),
            "http://cp.internal"
        );
    }
}
