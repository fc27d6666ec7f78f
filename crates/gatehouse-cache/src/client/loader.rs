use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use gatehouse_core::{ResourceKind, Result, RoutingKey};

use super::ControlPlaneClient;
use crate::group::Loader;

/// Binds a control-plane client to one resource kind so it can back a
/// cache group.
#[derive(Debug, Clone)]
pub struct ControlPlaneLoader {
    client: Arc<ControlPlaneClient>,
    kind: ResourceKind,
}

impl ControlPlaneLoader {
    pub fn new(client: Arc<ControlPlaneClient>, kind: ResourceKind) -> Self {
        Self { client, kind }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }
}

#[async_trait]
impl Loader for ControlPlaneLoader {
    async fn load(&self, key: &RoutingKey) -> Result<Bytes> {
        self.client.fetch(self.kind, key).await
    }

    fn name(&self) -> &str {
        self.kind.group_name()
    }
}
