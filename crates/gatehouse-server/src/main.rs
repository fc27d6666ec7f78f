//! Gatehouse proxy binary.

use anyhow::Context;
use gatehouse_server::{Settings, metrics::init_metrics, run};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load().context("failed to load settings")?;
    settings.validate().context("invalid settings")?;

    tracing::info!("Starting Gatehouse v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Control plane: {}", settings.control_plane.base_url);
    tracing::info!("Origin: {}", settings.origin_url);

    let prometheus_handle = init_metrics()?;

    run(settings, prometheus_handle).await
}
