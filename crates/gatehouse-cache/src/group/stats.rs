//! Cache group statistics.

use metrics::counter;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Registra las metricas de cache.
/// Llamar una vez al inicio, despues de instalar el recorder.
pub fn register_cache_metrics() {
    metrics::describe_counter!("gatehouse_cache_hits_total", "Total number of cache hits");
    metrics::describe_counter!(
        "gatehouse_cache_misses_total",
        "Total number of cache misses"
    );
    metrics::describe_counter!(
        "gatehouse_cache_loads_total",
        "Loads executed locally against the control plane"
    );
    metrics::describe_counter!(
        "gatehouse_cache_peer_loads_total",
        "Loads answered by the owning peer"
    );
    metrics::describe_counter!(
        "gatehouse_cache_load_errors_total",
        "Loads that ended in an error"
    );
    metrics::describe_counter!(
        "gatehouse_cache_evictions_total",
        "Total number of cache evictions"
    );
    metrics::describe_gauge!(
        "gatehouse_cache_entries",
        "Entries held by the group, sampled at scrape time"
    );
    metrics::describe_gauge!(
        "gatehouse_cache_bytes",
        "Bytes charged against the group capacity, sampled at scrape time"
    );
}

/// Contadores de una cache group.
/// Usa atomic counters internos y publica en el facade `metrics`.
#[derive(Debug, Clone)]
pub struct CacheStats {
    group: Arc<str>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    loads: Arc<AtomicU64>,
    peer_loads: Arc<AtomicU64>,
    load_errors: Arc<AtomicU64>,
}

impl CacheStats {
    pub fn new(group: &str) -> Self {
        Self {
            group: Arc::from(group),
            hits: Arc::default(),
            misses: Arc::default(),
            loads: Arc::default(),
            peer_loads: Arc::default(),
            load_errors: Arc::default(),
        }
    }

    /// Registra un cache hit
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        counter!("gatehouse_cache_hits_total", "group" => self.group.to_string()).increment(1);
    }

    /// Registra un cache miss
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        counter!("gatehouse_cache_misses_total", "group" => self.group.to_string()).increment(1);
    }

    /// Registra una carga local (loader invocado en esta instancia)
    pub fn record_load(&self) {
        self.loads.fetch_add(1, Ordering::Relaxed);
        counter!("gatehouse_cache_loads_total", "group" => self.group.to_string()).increment(1);
    }

    /// Registra una carga resuelta por el peer owner
    pub fn record_peer_load(&self) {
        self.peer_loads.fetch_add(1, Ordering::Relaxed);
        counter!("gatehouse_cache_peer_loads_total", "group" => self.group.to_string())
            .increment(1);
    }

    pub fn record_load_error(&self, kind: &'static str) {
        self.load_errors.fetch_add(1, Ordering::Relaxed);
        counter!(
            "gatehouse_cache_load_errors_total",
            "group" => self.group.to_string(),
            "kind" => kind
        )
        .increment(1);
    }

    /// Registra una eviction
    pub fn record_eviction(&self, reason: &'static str) {
        counter!(
            "gatehouse_cache_evictions_total",
            "group" => self.group.to_string(),
            "reason" => reason
        )
        .increment(1);
    }

    /// Calcula hit rate (para logging/debugging)
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total == 0.0 { 0.0 } else { hits / total }
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn loads(&self) -> u64 {
        self.loads.load(Ordering::Relaxed)
    }

    pub fn peer_loads(&self) -> u64 {
        self.peer_loads.load(Ordering::Relaxed)
    }

    pub fn load_errors(&self) -> u64 {
        self.load_errors.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_hit_rate() {
        let stats = CacheStats::new("policy");

        // 3 hits, 1 miss = 75% hit rate
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();

        assert!((stats.hit_rate() - 0.75).abs() < 0.001);
    }

    #[test]
    fn test_counters_shared_between_clones() {
        let stats = CacheStats::new("key");
        let clone = stats.clone();

        clone.record_load();
        clone.record_peer_load();
        clone.record_load_error("transport");

        assert_eq!(stats.loads(), 1);
        assert_eq!(stats.peer_loads(), 1);
        assert_eq!(stats.load_errors(), 1);
        assert_eq!(stats.hit_rate(), 0.0);
    }
}
