//! Error types for Gatehouse.
//!
//! Every failure on the cache-fill path is one of the variants below. The
//! type is `Clone` because a single load outcome is handed to every caller
//! waiting on that load.
//!
//! # Example
//!
//! ```
//! use gatehouse_core::{GatehouseError, Result};
//!
//! fn check(status: u16, body: &str) -> Result<()> {
//!     if status > 299 {
//!         return Err(GatehouseError::upstream(status, body));
//!     }
//!     Ok(())
//! }
//!
//! let err = check(404, "no such domain").unwrap_err();
//! assert_eq!(err.status(), Some(404));
//! ```

use thiserror::Error;

/// Main error type for Gatehouse operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatehouseError {
    /// The control plane, a peer or the origin could not be reached.
    #[error("transport error: {0}")]
    Transport(String),

    /// A non-2xx response was received.
    #[error("upstream returned status {status}: {body}")]
    Upstream {
        /// HTTP status code of the response
        status: u16,
        /// Response body, kept as diagnostic text
        body: String,
    },

    /// The payload could not be decoded into the expected document.
    #[error("decode error: {0}")]
    Decode(String),

    /// The payload decoded, but its certificate material is unusable.
    #[error("certificate build error: {0}")]
    CertificateBuild(String),

    /// Startup configuration is inconsistent.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A routing key failed validation before any I/O happened.
    #[error("invalid routing key: {0}")]
    InvalidKey(String),

    /// A peer asked for a cache group this instance does not serve.
    #[error("unknown cache group: {0}")]
    UnknownGroup(String),
}

impl GatehouseError {
    /// Creates a transport error from anything displayable.
    pub fn transport(cause: impl std::fmt::Display) -> Self {
        Self::Transport(cause.to_string())
    }

    /// Creates an upstream error.
    pub fn upstream(status: u16, body: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            body: body.into(),
        }
    }

    /// Creates a decode error.
    pub fn decode(cause: impl std::fmt::Display) -> Self {
        Self::Decode(cause.to_string())
    }

    /// Creates a certificate build error.
    pub fn certificate(cause: impl std::fmt::Display) -> Self {
        Self::CertificateBuild(cause.to_string())
    }

    /// Creates a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Returns the upstream status code, if this is an upstream error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if retrying later might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Upstream { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Short machine-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Upstream { .. } => "upstream",
            Self::Decode(_) => "decode",
            Self::CertificateBuild(_) => "certificate",
            Self::Configuration(_) => "configuration",
            Self::InvalidKey(_) => "invalid_key",
            Self::UnknownGroup(_) => "unknown_group",
        }
    }
}

impl From<serde_json::Error> for GatehouseError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode(err)
    }
}

/// Result alias used throughout Gatehouse.
pub type Result<T> = std::result::Result<T, GatehouseError>;
