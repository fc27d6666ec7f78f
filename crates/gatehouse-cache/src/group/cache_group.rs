//! Read-through cache group backed by Moka.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use futures::FutureExt;
use gatehouse_core::{Result, RoutingKey};
use moka::Expiry;
use moka::notification::RemovalCause;
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use tracing::{debug, instrument, warn};

use super::flight::{FlightGuard, Flights, SharedLoad};
use super::{CacheEntry, CacheStats, Clock, Loader, SystemClock};
use crate::peer::PeerCoordinator;

/// Configuracion de una cache group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupConfig {
    /// TTL de cada entry (default: 300 segundos)
    pub ttl: Duration,
    /// Presupuesto total en bytes (default: 10_000_000)
    pub capacity_bytes: u64,
}

impl GroupConfig {
    pub fn new(ttl_seconds: u64, capacity_bytes: u64) -> Self {
        Self {
            ttl: Duration::from_secs(ttl_seconds),
            capacity_bytes,
        }
    }
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self::new(300, 10_000_000)
    }
}

/// Which side of the ownership split a load runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadPath {
    /// Ask the ring who owns the key and route there.
    Routed,
    /// This instance was asked as the owner; load here.
    Local,
}

enum Lookup {
    Fresh(CacheEntry),
    Wait(SharedLoad),
}

/// Peer-aware, TTL-bound, singleflight read-through cache for one
/// resource kind.
///
/// Cloning is cheap; clones share storage and in-flight loads.
///
/// # Examples
///
/// ```ignore
/// let group = CacheGroup::builder("policy", Arc::new(loader))
///     .config(GroupConfig::new(300, 10_000_000))
///     .peers(coordinator)
///     .build();
///
/// let bytes = group.get(&RoutingKey::new("example.com")?).await?;
/// ```
#[derive(Clone)]
pub struct CacheGroup {
    inner: Arc<GroupInner>,
}

struct GroupInner {
    name: String,
    loader: Arc<dyn Loader>,
    config: GroupConfig,
    peers: Option<Arc<PeerCoordinator>>,
    bypass: bool,
    store: Cache<String, CacheEntry>,
    flights: Flights,
    clock: Arc<dyn Clock>,
    stats: CacheStats,
}

impl CacheGroup {
    /// Starts building a group named `name` that fills misses from `loader`.
    pub fn builder(name: impl Into<String>, loader: Arc<dyn Loader>) -> CacheGroupBuilder {
        CacheGroupBuilder {
            name: name.into(),
            loader,
            config: GroupConfig::default(),
            peers: None,
            clock: Arc::new(SystemClock),
            bypass: false,
        }
    }

    /// Returns the value for `key`, loading it on a miss or once stale.
    ///
    /// Concurrent callers for the same key share one load and observe the
    /// same outcome. Errors are not cached. In bypass mode every call goes
    /// straight to the loader.
    #[instrument(skip_all, fields(group = %self.inner.name, key = %key))]
    pub async fn get(&self, key: &RoutingKey) -> Result<Bytes> {
        if self.inner.bypass {
            self.inner.stats.record_load();
            return self
                .inner
                .loader
                .load(key)
                .await
                .inspect_err(|err| self.inner.stats.record_load_error(err.kind()));
        }

        self.get_entry(key, LoadPath::Routed)
            .await
            .map(|entry| entry.value)
    }

    /// Serves `key` as its owner: never routes to another peer.
    ///
    /// Used by the peer listener, so a ring disagreement between two
    /// instances cannot bounce a request back and forth.
    #[instrument(skip_all, fields(group = %self.inner.name, key = %key))]
    pub async fn get_as_owner(&self, key: &RoutingKey) -> Result<CacheEntry> {
        if self.inner.bypass {
            let value = self.inner.loader.load(key).await?;
            return Ok(CacheEntry::new(
                value,
                self.inner.clock.now() + self.inner.config.ttl,
            ));
        }

        self.get_entry(key, LoadPath::Local).await
    }

    async fn get_entry(&self, key: &RoutingKey, path: LoadPath) -> Result<CacheEntry> {
        if let Some(entry) = self.lookup(key) {
            self.inner.stats.record_hit();
            debug!("Cache hit");
            return Ok(entry);
        }

        self.inner.stats.record_miss();

        match self.join_or_start(key, path) {
            Lookup::Fresh(entry) => Ok(entry),
            Lookup::Wait(flight) => flight.await,
        }
    }

    fn lookup(&self, key: &RoutingKey) -> Option<CacheEntry> {
        self.inner
            .store
            .get(key.as_str())
            .filter(|entry| entry.is_fresh(self.inner.clock.now()))
    }

    fn join_or_start(&self, key: &RoutingKey, path: LoadPath) -> Lookup {
        let mut table = self.inner.flights.lock();

        if let Some(flight) = table.joinable(key.as_str()) {
            debug!("Joining in-flight load");
            return Lookup::Wait(flight);
        }

        // A flight may have completed between the first lookup and the lock.
        if let Some(entry) = self.lookup(key) {
            return Lookup::Fresh(entry);
        }

        let flight = table.reserve(key.as_str());
        let id = flight.id();
        let load = self.clone().load(key.clone(), path, flight).boxed();
        Lookup::Wait(table.start(key.as_str(), id, load))
    }

    /// Runs one flight. Dropping this future (every waiter gone) aborts the
    /// outbound call and releases the flight through `flight`.
    async fn load(
        self,
        key: RoutingKey,
        path: LoadPath,
        flight: FlightGuard,
    ) -> Result<CacheEntry> {
        let inner = &self.inner;

        let result = match (&inner.peers, path) {
            (Some(peers), LoadPath::Routed) => {
                let owner = peers.owner_of(key.as_str());
                let remote = !peers.is_self(&owner);
                debug!(owner = %owner, remote, "Routing load to owner");

                let result = peers
                    .route(&owner, &inner.name, &key, || self.load_locally(&key))
                    .await;
                if remote && result.is_ok() {
                    inner.stats.record_peer_load();
                }
                result
            },
            _ => self.load_locally(&key).await,
        };

        match &result {
            Ok(entry) => inner.store.insert(key.to_string(), entry.clone()),
            Err(err) => {
                inner.stats.record_load_error(err.kind());
                warn!(group = %inner.name, key = %key, error = %err, "Load failed");
            },
        }

        drop(flight);
        result
    }

    async fn load_locally(&self, key: &RoutingKey) -> Result<CacheEntry> {
        self.inner.stats.record_load();
        let value = self.inner.loader.load(key).await?;
        let expires_at = self.inner.clock.now() + self.inner.config.ttl;
        Ok(CacheEntry::new(value, expires_at))
    }

    /// Drops the entry for `key`, if present.
    pub fn invalidate(&self, key: &RoutingKey) {
        self.inner.store.invalidate(key.as_str());
    }

    /// Returns the group name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn config(&self) -> &GroupConfig {
        &self.inner.config
    }

    /// Returns true when caching is disabled for this group.
    pub fn is_bypass(&self) -> bool {
        self.inner.bypass
    }

    /// Retorna el numero aproximado de entries en cache.
    pub fn entry_count(&self) -> u64 {
        self.inner.store.entry_count()
    }

    /// Bytes currently charged against the capacity.
    pub fn weighted_size(&self) -> u64 {
        self.inner.store.weighted_size()
    }

    /// Number of loads currently in flight.
    pub fn in_flight(&self) -> usize {
        self.inner.flights.len()
    }

    pub fn stats(&self) -> &CacheStats {
        &self.inner.stats
    }

    /// Applies pending evictions and expirations now instead of lazily.
    pub fn sync(&self) {
        self.inner.store.run_pending_tasks();
    }
}

impl std::fmt::Debug for CacheGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheGroup")
            .field("name", &self.inner.name)
            .field("loader", &self.inner.loader.name())
            .field("config", &self.inner.config)
            .field("bypass", &self.inner.bypass)
            .field("entries", &self.inner.store.entry_count())
            .finish()
    }
}

/// Builder for CacheGroup.
pub struct CacheGroupBuilder {
    name: String,
    loader: Arc<dyn Loader>,
    config: GroupConfig,
    peers: Option<Arc<PeerCoordinator>>,
    clock: Arc<dyn Clock>,
    bypass: bool,
}

impl CacheGroupBuilder {
    /// Sets TTL and capacity.
    pub fn config(mut self, config: GroupConfig) -> Self {
        self.config = config;
        self
    }

    /// Routes loads through the given peer coordinator. Without peers the
    /// group behaves as a single-node cache.
    pub fn peers(mut self, peers: Arc<PeerCoordinator>) -> Self {
        self.peers = Some(peers);
        self
    }

    /// Sets the clock used to stamp and check expiry.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Disables caching: every get calls the loader.
    pub fn bypass(mut self, bypass: bool) -> Self {
        self.bypass = bypass;
        self
    }

    pub fn build(self) -> CacheGroup {
        let stats = CacheStats::new(&self.name);
        let store = build_store(&self.config, Arc::clone(&self.clock), stats.clone());

        CacheGroup {
            inner: Arc::new(GroupInner {
                name: self.name,
                loader: self.loader,
                config: self.config,
                peers: self.peers,
                bypass: self.bypass,
                store,
                flights: Flights::default(),
                clock: self.clock,
                stats,
            }),
        }
    }
}

fn build_store(
    config: &GroupConfig,
    clock: Arc<dyn Clock>,
    stats: CacheStats,
) -> Cache<String, CacheEntry> {
    Cache::builder()
        .max_capacity(config.capacity_bytes)
        .weigher(|key: &String, entry: &CacheEntry| entry.weight(key))
        .eviction_policy(EvictionPolicy::lru())
        .expire_after(EntryExpiry { clock })
        .eviction_listener(move |_key, _value, cause| {
            let reason = match cause {
                RemovalCause::Expired => "ttl",
                RemovalCause::Size => "capacity",
                RemovalCause::Explicit => "manual",
                RemovalCause::Replaced => return,
            };
            stats.record_eviction(reason);
        })
        .build()
}

/// Lets Moka reclaim entries once their own expiry has passed. Freshness on
/// read is still decided against the group clock.
struct EntryExpiry {
    clock: Arc<dyn Clock>,
}

impl Expiry<String, CacheEntry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.remaining(self.clock.now()))
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.remaining(self.clock.now()))
    }
}
