use serde::{Deserialize, Serialize};
use std::fmt;

/// Certificate bundle record: a PEM chain and its PEM private key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateBundle {
    #[serde(rename = "Domain", default)]
    pub domain: String,

    /// Leaf first, then intermediates.
    #[serde(rename = "Cert")]
    pub cert: String,

    #[serde(rename = "Key")]
    pub key: String,
}

impl fmt::Debug for CertificateBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateBundle")
            .field("domain", &self.domain)
            .field("cert_len", &self.cert.len())
            .field("key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_and_redact() {
        let bundle: CertificateBundle = serde_json::from_str(
            r#"{"Domain":"a.com","Cert":"-----BEGIN CERTIFICATE-----","Key":"secret-pem"}"#,
        )
        .unwrap();

        assert_eq!(bundle.domain, "a.com");
        assert!(!format!("{:?}", bundle).contains("secret-pem"));
    }

    #[test]
    fn test_missing_key_fails() {
        assert!(serde_json::from_str::<CertificateBundle>(r#"{"Cert":"x"}"#).is_err());
    }
}
