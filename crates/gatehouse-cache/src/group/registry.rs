use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::CacheGroup;

/// Cache groups served by this instance, by name.
///
/// The peer listener looks groups up here when another instance asks it to
/// load a key it owns.
#[derive(Debug, Clone, Default)]
pub struct GroupRegistry {
    groups: Arc<RwLock<HashMap<String, CacheGroup>>>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a group, replacing any previous group with the same name.
    pub fn register(&self, group: CacheGroup) {
        self.groups.write().insert(group.name().to_string(), group);
    }

    /// Returns the group named `name`.
    pub fn get(&self, name: &str) -> Option<CacheGroup> {
        self.groups.read().get(name).cloned()
    }

    /// Registered group names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.groups.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.groups.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.read().is_empty()
    }
}

impl FromIterator<CacheGroup> for GroupRegistry {
    fn from_iter<I: IntoIterator<Item = CacheGroup>>(iter: I) -> Self {
        let registry = Self::new();
        for group in iter {
            registry.register(group);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::Loader;
    use async_trait::async_trait;
    use bytes::Bytes;
    use gatehouse_core::{Result, RoutingKey};

    struct Echo;

    #[async_trait]
    impl Loader for Echo {
        async fn load(&self, key: &RoutingKey) -> Result<Bytes> {
            Ok(Bytes::from(key.to_string()))
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let registry: GroupRegistry = ["policy", "key"]
            .into_iter()
            .map(|name| CacheGroup::builder(name, Arc::new(Echo)).build())
            .collect();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["key", "policy"]);
        assert_eq!(registry.get("policy").unwrap().name(), "policy");
        assert!(registry.get("resource").is_none());
    }
}
