//! Gatehouse Core - Domain types and errors
//!
//! This crate provides the foundational types shared by the cache layer and
//! the proxy server: routing keys, resource kinds, the decoded control-plane
//! documents and the error taxonomy.

pub mod error;
pub mod types;

mod certificate;
mod key_record;
mod policy;

pub use certificate::CertificateBundle;
pub use error::{GatehouseError, Result};
pub use key_record::{KeyRecord, KeyStatus};
pub use policy::{PolicyConfig, PolicyRule};
pub use types::{ResourceKind, RoutingKey};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_defined() {
        assert!(!version().is_empty());
    }

    #[test]
    fn version_is_semver() {
        let v = version();
        assert_eq!(v.split('.').count(), 3, "Version should be semver");
    }
}
