//! In-process loaders.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use gatehouse_cache::Loader;
use gatehouse_cache::gatehouse_core::{Result, RoutingKey};

/// Loader that answers `{label}:{key}` and counts its calls.
#[derive(Debug)]
pub struct CountingLoader {
    label: &'static str,
    calls: AtomicUsize,
}

impl CountingLoader {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Loader for CountingLoader {
    async fn load(&self, key: &RoutingKey) -> Result<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Bytes::from(format!("{}:{}", self.label, key)))
    }

    fn name(&self) -> &str {
        self.label
    }
}
