//! Loader trait definition.

use async_trait::async_trait;
use bytes::Bytes;
use gatehouse_core::{Result, RoutingKey};

/// A source of raw values for a cache group.
///
/// The owning instance calls `load` on a miss; the returned bytes are cached
/// until the group's TTL elapses.
///
/// # Implementors
///
/// - `ControlPlaneLoader` - Fetches one resource kind from the control plane
///
/// # Example
///
/// ```ignore
/// use gatehouse_cache::Loader;
///
/// struct StaticLoader;
///
/// #[async_trait]
/// impl Loader for StaticLoader {
///     async fn load(&self, key: &RoutingKey) -> Result<Bytes> {
///         Ok(Bytes::from(format!("value for {key}")))
///     }
/// }
/// ```
#[async_trait]
pub trait Loader: Send + Sync {
    /// Loads the value for `key`.
    ///
    /// Errors are returned to every caller waiting on this load and are
    /// never cached.
    async fn load(&self, key: &RoutingKey) -> Result<Bytes>;

    /// Returns the name of this loader, used for logging.
    fn name(&self) -> &str {
        "loader"
    }
}
