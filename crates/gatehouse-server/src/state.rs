//! Application state.

use gatehouse_cache::Resolver;

use crate::forward::Forwarder;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    resolver: Resolver,
    forwarder: Forwarder,
}

impl AppState {
    pub fn new(resolver: Resolver, forwarder: Forwarder) -> Self {
        Self {
            resolver,
            forwarder,
        }
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn forwarder(&self) -> &Forwarder {
        &self.forwarder
    }
}
