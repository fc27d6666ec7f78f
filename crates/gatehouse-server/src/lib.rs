//! Gatehouse Server - authorizing reverse proxy.
//!
//! Every request that is not an operational route (`/health`, `/metrics`)
//! is authorized against the caller's API key record and the target
//! domain's policy, then streamed to the configured origin.

pub mod error;
pub mod extractors;
pub mod forward;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod server;
pub mod settings;
pub mod state;

pub use error::AppError;
pub use forward::Forwarder;
pub use handlers::health::HealthResponse;
pub use server::{create_router_with_state, run};
pub use settings::Settings;
pub use state::AppState;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
