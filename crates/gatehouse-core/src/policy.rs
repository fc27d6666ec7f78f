//! Authorization policy document.

use serde::{Deserialize, Serialize};

/// Wildcard matching any principal or method.
const WILDCARD: &str = "*";

/// Routing/policy configuration for one domain.
///
/// An empty rule list denies everything.
///
/// # Example
///
/// ```
/// use gatehouse_core::PolicyConfig;
///
/// let policy: PolicyConfig = serde_json::from_str(r#"{
///     "domain": "example.com",
///     "rules": [{ "principals": ["user-1"], "methods": ["GET"], "path_prefix": "/api" }]
/// }"#).unwrap();
///
/// assert!(policy.allows("user-1", "GET", "/api/items"));
/// assert!(!policy.allows("user-1", "POST", "/api/items"));
/// assert!(!policy.allows("user-2", "GET", "/api/items"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Domain this policy applies to.
    #[serde(default)]
    pub domain: String,

    /// Allow rules; a request is allowed if any rule matches.
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
}

/// A single allow rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRule {
    /// User ids allowed by this rule, or `"*"`.
    pub principals: Vec<String>,

    /// HTTP methods allowed by this rule, or `"*"`.
    #[serde(default = "any")]
    pub methods: Vec<String>,

    /// Path prefix the request path must start with.
    #[serde(default = "root")]
    pub path_prefix: String,
}

fn any() -> Vec<String> {
    vec![WILDCARD.to_string()]
}

fn root() -> String {
    "/".to_string()
}

impl PolicyRule {
    fn matches(&self, user_id: &str, method: &str, path: &str) -> bool {
        let principal_ok = self
            .principals
            .iter()
            .any(|p| p == WILDCARD || p == user_id);
        let method_ok = self
            .methods
            .iter()
            .any(|m| m == WILDCARD || m.eq_ignore_ascii_case(method));

        principal_ok && method_ok && path.starts_with(&self.path_prefix)
    }
}

impl PolicyConfig {
    /// Returns true if some rule allows `user_id` to call `method` on `path`.
    pub fn allows(&self, user_id: &str, method: &str, path: &str) -> bool {
        self.rules
            .iter()
            .any(|rule| rule.matches(user_id, method, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(principals: &[&str], methods: &[&str], prefix: &str) -> PolicyRule {
        PolicyRule {
            principals: principals.iter().map(|s| s.to_string()).collect(),
            methods: methods.iter().map(|s| s.to_string()).collect(),
            path_prefix: prefix.to_string(),
        }
    }

    #[test]
    fn test_empty_policy_denies() {
        let policy = PolicyConfig::default();
        assert!(!policy.allows("anyone", "GET", "/"));
    }

    #[test]
    fn test_wildcards() {
        let policy = PolicyConfig {
            domain: "example.com".into(),
            rules: vec![rule(&["*"], &["*"], "/")],
        };
        assert!(policy.allows("u", "DELETE", "/anything"));
    }

    #[test]
    fn test_method_match_is_case_insensitive() {
        let policy = PolicyConfig {
            domain: "example.com".into(),
            rules: vec![rule(&["u"], &["post"], "/")],
        };
        assert!(policy.allows("u", "POST", "/"));
    }

    #[test]
    fn test_rule_defaults() {
        let policy: PolicyConfig =
            serde_json::from_str(r#"{"rules":[{"principals":["u"]}]}"#).unwrap();
        assert!(policy.allows("u", "PUT", "/x"));
        assert!(policy.domain.is_empty());
    }
}
