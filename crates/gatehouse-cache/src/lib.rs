//! # Gatehouse Cache
//!
//! Distributed, pull-through cache that sits between the proxy and the
//! control plane.
//!
//! ## Features
//!
//! - Authenticated control-plane client with typed failures
//! - One cache group per resource kind, each with its own TTL and byte budget
//! - Singleflight: concurrent misses for one key share a single load
//! - Key ownership by consistent hashing over an identical peer set
//! - Internal HTTP listener answering peer load requests
//! - Typed resolvers that decode cached bytes into policies, key records and
//!   TLS certificates
//!
//! ## Example
//!
//! ```ignore
//! use gatehouse_cache::{ControlPlaneClient, ControlPlaneConfig, Resolver};
//!
//! let config = ControlPlaneConfig::builder()
//!     .base_url("https://control.example.com")
//!     .auth_token("secret")
//!     .build()?;
//!
//! let resolver = Resolver::bypass(Arc::new(ControlPlaneClient::new(config)?));
//! let policy = resolver.resolve_policy("example.com").await?;
//! ```

pub mod client;
pub mod group;
pub mod peer;
pub mod resolver;
pub mod tls;

// Re-exports
pub use client::{ControlPlaneClient, ControlPlaneConfig, ControlPlaneLoader};
pub use group::{
    CacheEntry, CacheGroup, CacheStats, Clock, GroupConfig, GroupRegistry, Loader, ManualClock,
    SystemClock,
};
pub use peer::{HashRing, PeerConfig, PeerCoordinator, PeerServer, PeerServerHandle};
pub use resolver::{Resolver, ResolverConfig};
pub use tls::TlsCertificate;

// Re-export gatehouse_core for consumers
pub use gatehouse_core;
