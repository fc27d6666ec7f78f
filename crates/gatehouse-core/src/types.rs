//! Common type definitions and newtypes for Gatehouse.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GatehouseError;

/// Cache lookup key and consistent-hashing input.
///
/// A routing key is either a fully-qualified domain name or an API key
/// identifier. The only constraint enforced here is that it is not empty.
///
/// # Example
///
/// ```
/// use gatehouse_core::RoutingKey;
///
/// let key = RoutingKey::new("example.com").unwrap();
/// assert_eq!(key.as_str(), "example.com");
/// assert!(RoutingKey::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoutingKey(String);

impl RoutingKey {
    /// Creates a new routing key, rejecting empty input.
    pub fn new(key: impl Into<String>) -> Result<Self, GatehouseError> {
        let key = key.into();
        if key.is_empty() {
            return Err(GatehouseError::InvalidKey(
                "routing key cannot be empty".to_string(),
            ));
        }
        Ok(Self(key))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoutingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RoutingKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoutingKey {
    type Error = GatehouseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for RoutingKey {
    type Error = GatehouseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoutingKey> for String {
    fn from(key: RoutingKey) -> Self {
        key.0
    }
}

/// The three independent kinds of control-plane resources.
///
/// Each kind has its own cache group and never shares entries with the
/// others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Authorization policy, keyed by domain.
    Policy,
    /// API key record, keyed by key identifier.
    ApiKey,
    /// TLS certificate bundle, keyed by domain.
    Certificate,
}

impl ResourceKind {
    /// All kinds, in registration order.
    pub const ALL: [ResourceKind; 3] = [Self::Policy, Self::ApiKey, Self::Certificate];

    /// Name of the cache group serving this kind.
    pub fn group_name(&self) -> &'static str {
        match self {
            Self::Policy => "policy",
            Self::ApiKey => "key",
            Self::Certificate => "resource",
        }
    }

    /// Looks a kind up by its cache group name.
    pub fn from_group_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.group_name() == name)
    }

    /// Control-plane path for the given (already escaped) key.
    ///
    /// ```
    /// use gatehouse_core::ResourceKind;
    ///
    /// assert_eq!(ResourceKind::Policy.path_for("a.com"), "domains/a.com/config");
    /// assert_eq!(ResourceKind::ApiKey.path_for("k1"), "key/k1");
    /// assert_eq!(ResourceKind::Certificate.path_for("a.com"), "domains/a.com/cert");
    /// ```
    pub fn path_for(&self, key: &str) -> String {
        match self {
            Self::Policy => format!("domains/{key}/config"),
            Self::ApiKey => format!("key/{key}"),
            Self::Certificate => format!("domains/{key}/cert"),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.group_name())
    }
}

impl FromStr for ResourceKind {
    type Err = GatehouseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_group_name(s).ok_or_else(|| GatehouseError::UnknownGroup(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_key_rejects_empty() {
        let err = RoutingKey::new("").unwrap_err();
        assert!(matches!(err, GatehouseError::InvalidKey(_)));
    }

    #[test]
    fn test_routing_key_deserialize_validates() {
        let ok: RoutingKey = serde_json::from_str(r#""example.com""#).unwrap();
        assert_eq!(ok.as_str(), "example.com");

        assert!(serde_json::from_str::<RoutingKey>(r#""""#).is_err());
    }

    #[test]
    fn test_group_names_are_distinct() {
        let names: std::collections::HashSet<_> =
            ResourceKind::ALL.iter().map(|k| k.group_name()).collect();
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn test_from_group_name_round_trip() {
        for kind in ResourceKind::ALL {
            assert_eq!(ResourceKind::from_group_name(kind.group_name()), Some(kind));
        }
        assert_eq!(ResourceKind::from_group_name("nope"), None);
        assert!("nope".parse::<ResourceKind>().is_err());
    }
}
