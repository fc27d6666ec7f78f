use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use gatehouse_core::{GatehouseError, Result, RoutingKey};
use parking_lot::RwLock;
use reqwest::StatusCode;
use tracing::{debug, info, instrument};

use super::protocol::{EXPIRES_AT_HEADER, PeerErrorBody, peer_url};
use super::ring::{DEFAULT_REPLICAS, HashRing};
use crate::group::CacheEntry;

/// Configuracion del coordinador de peers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerConfig {
    /// Virtual nodes per peer on the ring
    pub replicas: usize,
    /// Timeout of one peer request
    pub timeout: Duration,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            replicas: DEFAULT_REPLICAS,
            timeout: Duration::from_secs(5),
        }
    }
}

/// Snapshot of the peer set. Replaced as a whole, never mutated.
#[derive(Debug)]
struct Membership {
    self_addr: String,
    ring: HashRing,
}

/// Owns the peer ring and routes loads to each key's owner.
///
/// Every instance in the cluster must be configured with the same peer
/// set, or they will disagree on ownership.
#[derive(Debug)]
pub struct PeerCoordinator {
    membership: RwLock<Arc<Membership>>,
    http: reqwest::Client,
    config: PeerConfig,
}

impl PeerCoordinator {
    /// Builds a coordinator and configures it in one step.
    pub fn new<S: AsRef<str>>(peers: &[S], self_addr: &str, config: PeerConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(GatehouseError::transport)?;

        let membership = build_membership(peers, self_addr, config.replicas)?;

        Ok(Self {
            membership: RwLock::new(Arc::new(membership)),
            http,
            config,
        })
    }

    /// Replaces the peer set.
    ///
    /// # Errors
    ///
    /// Returns `GatehouseError::Configuration` if `self_addr` is not one of
    /// `peers`. The previous ring stays in place.
    pub fn configure<S: AsRef<str>>(&self, peers: &[S], self_addr: &str) -> Result<()> {
        let membership = build_membership(peers, self_addr, self.config.replicas)?;
        info!(
            self_addr = %membership.self_addr,
            peers = membership.ring.peers().len(),
            "Peer set configured"
        );
        *self.membership.write() = Arc::new(membership);
        Ok(())
    }

    fn snapshot(&self) -> Arc<Membership> {
        Arc::clone(&self.membership.read())
    }

    /// Returns the address of the peer owning `key`.
    pub fn owner_of(&self, key: &str) -> String {
        let membership = self.snapshot();
        membership
            .ring
            .owner(key)
            .unwrap_or(membership.self_addr.as_str())
            .to_string()
    }

    pub fn is_self(&self, peer: &str) -> bool {
        normalize(peer) == self.snapshot().self_addr
    }

    pub fn self_addr(&self) -> String {
        self.snapshot().self_addr.clone()
    }

    pub fn peers(&self) -> Vec<String> {
        self.snapshot().ring.peers().to_vec()
    }

    /// Runs `local` if `peer` is this instance, otherwise asks `peer` for
    /// the value over the internal listener.
    #[instrument(skip_all, fields(peer = %peer, group = %group, key = %key))]
    pub async fn route<F, Fut>(
        &self,
        peer: &str,
        group: &str,
        key: &RoutingKey,
        local: F,
    ) -> Result<CacheEntry>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CacheEntry>>,
    {
        if self.is_self(peer) {
            return local().await;
        }

        self.fetch_remote(peer, group, key).await
    }

    async fn fetch_remote(&self, peer: &str, group: &str, key: &RoutingKey) -> Result<CacheEntry> {
        let url = peer_url(peer, group, key.as_str());
        debug!(url = %url, "Asking owner");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(GatehouseError::transport)?;

        let status = response.status();
        let expires_at = response
            .headers()
            .get(EXPIRES_AT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        let body = response.bytes().await.map_err(GatehouseError::transport)?;

        match status {
            StatusCode::OK => {
                let millis = expires_at.ok_or_else(|| {
                    GatehouseError::transport(format!("peer {peer} sent no expiry"))
                })?;
                Ok(CacheEntry::new(body, CacheEntry::expiry_from_millis(millis)))
            },
            StatusCode::NOT_FOUND => Err(GatehouseError::UnknownGroup(group.to_string())),
            StatusCode::BAD_GATEWAY => match serde_json::from_slice::<PeerErrorBody>(&body) {
                Ok(error) => Err(error.into()),
                Err(_) => Err(GatehouseError::transport(format!(
                    "peer {peer} failed: {}",
                    String::from_utf8_lossy(&body)
                ))),
            },
            other => Err(GatehouseError::transport(format!(
                "peer {peer} returned {other}"
            ))),
        }
    }
}

fn build_membership<S: AsRef<str>>(
    peers: &[S],
    self_addr: &str,
    replicas: usize,
) -> Result<Membership> {
    let self_addr = normalize(self_addr);
    let peers: Vec<String> = peers.iter().map(|p| normalize(p.as_ref())).collect();

    if !peers.contains(&self_addr) {
        return Err(GatehouseError::configuration(format!(
            "self address {self_addr} is not in the peer set"
        )));
    }

    Ok(Membership {
        self_addr,
        ring: HashRing::new(peers, replicas),
    })
}

fn normalize(addr: &str) -> String {
    addr.trim().trim_end_matches('/').to_string()
}
