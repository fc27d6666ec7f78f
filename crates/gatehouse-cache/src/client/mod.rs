//! Control-plane client.
//!
//! Fetches raw resource bytes from the authoritative control plane. Payloads
//! are returned verbatim; decoding belongs to the resolver.

mod config;
mod control_plane;
mod loader;

pub use config::{ControlPlaneConfig, ControlPlaneConfigBuilder};
pub use control_plane::ControlPlaneClient;
pub use loader::ControlPlaneLoader;
