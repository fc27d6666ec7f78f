//! Loaded TLS certificates.

use std::fmt;
use std::sync::Arc;

use gatehouse_core::{CertificateBundle, GatehouseError, Result};
use rustls::pki_types::CertificateDer;
use rustls::sign::CertifiedKey;
use rustls_pemfile::{certs, private_key};

/// A certificate chain and signing key ready to hand to a rustls resolver.
#[derive(Clone)]
pub struct TlsCertificate {
    domain: String,
    key: Arc<CertifiedKey>,
}

impl TlsCertificate {
    /// Parses the PEM chain and key of a bundle.
    ///
    /// # Errors
    ///
    /// Returns `GatehouseError::CertificateBuild` if the chain is empty or
    /// unparsable, the key is missing, or the key type is not supported.
    pub fn from_bundle(bundle: &CertificateBundle) -> Result<Self> {
        let chain: Vec<CertificateDer<'static>> = certs(&mut bundle.cert.as_bytes())
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| GatehouseError::certificate(format!("invalid certificate PEM: {e}")))?;

        if chain.is_empty() {
            return Err(GatehouseError::certificate("no certificate in chain"));
        }

        let key_der = private_key(&mut bundle.key.as_bytes())
            .map_err(|e| GatehouseError::certificate(format!("invalid key PEM: {e}")))?
            .ok_or_else(|| GatehouseError::certificate("no private key found"))?;

        let signing_key = rustls::crypto::ring::sign::any_supported_type(&key_der)
            .map_err(|e| GatehouseError::certificate(format!("unsupported private key: {e}")))?;

        Ok(Self {
            domain: bundle.domain.clone(),
            key: Arc::new(CertifiedKey::new(chain, signing_key)),
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Leaf certificate first.
    pub fn chain(&self) -> &[CertificateDer<'static>] {
        &self.key.cert
    }

    pub fn certified_key(&self) -> Arc<CertifiedKey> {
        Arc::clone(&self.key)
    }
}

impl fmt::Debug for TlsCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsCertificate")
            .field("domain", &self.domain)
            .field("chain_len", &self.key.cert.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(cert: &str, key: &str) -> CertificateBundle {
        CertificateBundle {
            domain: "example.com".into(),
            cert: cert.into(),
            key: key.into(),
        }
    }

    #[test]
    fn test_generated_certificate_loads() {
        let generated = rcgen::generate_simple_self_signed(vec!["example.com".into()]).unwrap();
        let cert = TlsCertificate::from_bundle(&bundle(
            &generated.cert.pem(),
            &generated.key_pair.serialize_pem(),
        ))
        .unwrap();

        assert_eq!(cert.domain(), "example.com");
        assert_eq!(cert.chain().len(), 1);
    }

    #[test]
    fn test_empty_chain_is_rejected() {
        let generated = rcgen::generate_simple_self_signed(vec!["example.com".into()]).unwrap();
        let err = TlsCertificate::from_bundle(&bundle("", &generated.key_pair.serialize_pem()))
            .unwrap_err();

        assert!(matches!(err, GatehouseError::CertificateBuild(_)));
    }

    #[test]
    fn test_missing_key_is_rejected() {
        let generated = rcgen::generate_simple_self_signed(vec!["example.com".into()]).unwrap();
        let err = TlsCertificate::from_bundle(&bundle(&generated.cert.pem(), "garbage"))
            .unwrap_err();

        assert!(matches!(err, GatehouseError::CertificateBuild(_)));
    }
}
