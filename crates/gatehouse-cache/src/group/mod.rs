//! Cache groups.
//!
//! One group per resource kind. Each group is a TTL-bound, byte-budgeted,
//! singleflight-deduplicated read-through cache whose loads are routed to
//! the key's owning peer.

mod cache_group;
mod clock;
mod entry;
mod flight;
mod loader;
mod registry;
mod stats;

pub use cache_group::{CacheGroup, CacheGroupBuilder, GroupConfig};
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use loader::Loader;
pub use registry::GroupRegistry;
pub use stats::{CacheStats, register_cache_metrics};
