//! Prometheus scrape endpoint.

use axum::{extract::State, http::header, response::IntoResponse};
use gatehouse_cache::GroupRegistry;
use metrics::gauge;
use metrics_exporter_prometheus::PrometheusHandle;

/// State of the `/metrics` route.
#[derive(Clone)]
pub struct MetricsState {
    pub prometheus: PrometheusHandle,
    pub groups: GroupRegistry,
}

/// Publishes cache occupancy, then renders every metric in text format.
pub async fn metrics_handler(State(state): State<MetricsState>) -> impl IntoResponse {
    publish_cache_gauges(&state.groups);

    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.prometheus.render(),
    )
}

/// Entry count and charged bytes of each group, sampled at scrape time.
pub fn publish_cache_gauges(groups: &GroupRegistry) {
    for name in groups.names() {
        let Some(group) = groups.get(&name) else {
            continue;
        };
        gauge!("gatehouse_cache_entries", "group" => name.clone())
            .set(group.entry_count() as f64);
        gauge!("gatehouse_cache_bytes", "group" => name).set(group.weighted_size() as f64);
    }
}
