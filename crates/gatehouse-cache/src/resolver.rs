//! Typed access to control-plane documents through the cache groups.

use std::sync::Arc;

use gatehouse_core::{
    CertificateBundle, KeyRecord, PolicyConfig, ResourceKind, Result, RoutingKey,
};
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::client::{ControlPlaneClient, ControlPlaneLoader};
use crate::group::{CacheGroup, GroupConfig, GroupRegistry};
use crate::peer::PeerCoordinator;
use crate::tls::TlsCertificate;

/// TTL and capacity of each group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolverConfig {
    pub policy: GroupConfig,
    pub keys: GroupConfig,
    pub certificates: GroupConfig,
}

/// Resolves routing keys into decoded documents.
///
/// Each resource kind has its own group, so a miss on a policy never waits
/// behind a certificate load for the same domain.
#[derive(Debug, Clone)]
pub struct Resolver {
    policy: CacheGroup,
    keys: CacheGroup,
    certificates: CacheGroup,
}

impl Resolver {
    /// Resolver with caching disabled: every call reaches the control plane.
    pub fn bypass(client: Arc<ControlPlaneClient>) -> Self {
        let group = |kind: ResourceKind| {
            CacheGroup::builder(
                kind.group_name(),
                Arc::new(ControlPlaneLoader::new(Arc::clone(&client), kind)),
            )
            .bypass(true)
            .build()
        };

        Self::from_groups(
            group(ResourceKind::Policy),
            group(ResourceKind::ApiKey),
            group(ResourceKind::Certificate),
        )
    }

    /// Caching resolver. With `peers`, loads are routed to each key's owner;
    /// without, this instance owns every key.
    pub fn cached(
        client: Arc<ControlPlaneClient>,
        config: ResolverConfig,
        peers: Option<Arc<PeerCoordinator>>,
    ) -> Self {
        let group = |kind: ResourceKind, group_config: GroupConfig| {
            let builder = CacheGroup::builder(
                kind.group_name(),
                Arc::new(ControlPlaneLoader::new(Arc::clone(&client), kind)),
            )
            .config(group_config);

            match &peers {
                Some(peers) => builder.peers(Arc::clone(peers)).build(),
                None => builder.build(),
            }
        };

        Self::from_groups(
            group(ResourceKind::Policy, config.policy),
            group(ResourceKind::ApiKey, config.keys),
            group(ResourceKind::Certificate, config.certificates),
        )
    }

    /// Builds a resolver over existing groups.
    pub fn from_groups(policy: CacheGroup, keys: CacheGroup, certificates: CacheGroup) -> Self {
        Self {
            policy,
            keys,
            certificates,
        }
    }

    /// The group serving `kind`.
    pub fn group(&self, kind: ResourceKind) -> &CacheGroup {
        match kind {
            ResourceKind::Policy => &self.policy,
            ResourceKind::ApiKey => &self.keys,
            ResourceKind::Certificate => &self.certificates,
        }
    }

    /// Registry of the three groups, for the peer listener.
    pub fn groups(&self) -> GroupRegistry {
        ResourceKind::ALL
            .iter()
            .map(|kind| self.group(*kind).clone())
            .collect()
    }

    /// Access policy of `domain`.
    #[instrument(skip(self))]
    pub async fn resolve_policy(&self, domain: &str) -> Result<PolicyConfig> {
        self.resolve_json(ResourceKind::Policy, domain).await
    }

    /// Key record of `key_id`.
    #[instrument(skip(self))]
    pub async fn resolve_key(&self, key_id: &str) -> Result<KeyRecord> {
        self.resolve_json(ResourceKind::ApiKey, key_id).await
    }

    /// Certificate of `domain`, loaded and ready for TLS.
    #[instrument(skip(self))]
    pub async fn resolve_certificate(&self, domain: &str) -> Result<TlsCertificate> {
        let bundle: CertificateBundle = self.resolve_json(ResourceKind::Certificate, domain).await?;
        TlsCertificate::from_bundle(&bundle)
    }

    async fn resolve_json<T: DeserializeOwned>(&self, kind: ResourceKind, key: &str) -> Result<T> {
        let key = RoutingKey::new(key)?;
        let bytes = self.group(kind).get(&key).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
