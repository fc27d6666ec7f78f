#![allow(dead_code)]
use gatehouse_core::{KeyRecord, PolicyConfig};

/// Helper to decode a PolicyConfig from a JSON string slice.
/// Panics if the JSON is invalid (intended for tests).
pub fn policy_from_json(json: &str) -> PolicyConfig {
    serde_json::from_str(json).expect("Failed to decode test policy")
}

/// Returns a key record fixture owned by `user_id`.
pub fn key_record(key_id: &str, user_id: &str) -> KeyRecord {
    serde_json::from_value(serde_json::json!({
        "KeyID": key_id,
        "SecretKey": "secret",
        "UserID": user_id,
    }))
    .expect("Failed to build key record fixture")
}

/// Returns a policy with read-only public access and full access for `admin`.
pub fn mixed_policy() -> PolicyConfig {
    policy_from_json(
        r#"{
        "domain": "shop.example.com",
        "rules": [
            { "principals": ["*"], "methods": ["GET", "HEAD"], "path_prefix": "/catalog" },
            { "principals": ["admin"], "methods": ["*"], "path_prefix": "/" }
        ]
    }"#,
    )
}
