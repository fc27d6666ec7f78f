//! Peer coordination.
//!
//! Key ownership is decided by a consistent-hash ring over the configured
//! peer set. Loads for keys owned elsewhere are sent to the owner's
//! internal listener; the owner loads locally and replies with the value
//! and its expiry.

mod coordinator;
pub mod protocol;
mod ring;
mod server;

pub use coordinator::{PeerConfig, PeerCoordinator};
pub use ring::{DEFAULT_REPLICAS, HashRing};
pub use server::{PeerServer, PeerServerHandle};
