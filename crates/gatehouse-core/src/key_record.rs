//! API key record.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of an API key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStatus {
    #[default]
    Active,
    Revoked,
}

/// API key record as served by the control plane.
///
/// Field names follow the control plane's JSON (`KeyID`, `SecretKey`,
/// `UserID`). `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRecord {
    #[serde(rename = "KeyID")]
    pub key_id: String,

    #[serde(rename = "SecretKey", default)]
    pub secret_key: String,

    /// Owner of the key.
    #[serde(rename = "UserID")]
    pub user_id: String,

    #[serde(rename = "Status", default)]
    pub status: KeyStatus,

    #[serde(rename = "Scopes", default)]
    pub scopes: Vec<String>,
}

impl KeyRecord {
    /// Returns true if the key may be used.
    pub fn is_active(&self) -> bool {
        self.status == KeyStatus::Active
    }

    /// Returns true if the key carries the given scope.
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}

impl fmt::Debug for KeyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyRecord")
            .field("key_id", &self.key_id)
            .field("secret_key", &"<redacted>")
            .field("user_id", &self.user_id)
            .field("status", &self.status)
            .field("scopes", &self.scopes)
            .finish()
    }
}
