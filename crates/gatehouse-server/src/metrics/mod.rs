//! Metrics module for the proxy server.

pub mod http;
pub mod setup;

pub use setup::{init_metrics, register_metrics};
