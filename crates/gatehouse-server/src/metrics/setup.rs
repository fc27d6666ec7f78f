//! Metrics setup and initialization.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Inicializa el sistema de metricas y retorna el handle para el endpoint.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    // Buckets para histogramas (en segundos)
    let handle = PrometheusBuilder::new()
        .set_buckets(&[
            0.0005, // 500 microsegundos
            0.001,  // 1 milisegundo
            0.005,  // 5 milisegundos
            0.01,   // 10 milisegundos
            0.025,  // 25 milisegundos
            0.05,   // 50 milisegundos
            0.1,    // 100 milisegundos
            0.25,   // 250 milisegundos
            0.5,    // 500 milisegundos
            1.0,    // 1 segundo
            2.5,    // 2.5 segundos
            5.0,    // 5 segundos
            10.0,   // 10 segundos
            30.0,   // uploads largos
        ])?
        .install_recorder()?;

    register_metrics();
    info!("Metrics system initialized");
    Ok(handle)
}

/// Describe todas las metricas del proceso.
pub fn register_metrics() {
    super::http::register_http_metrics();
    gatehouse_cache::group::register_cache_metrics();
}
