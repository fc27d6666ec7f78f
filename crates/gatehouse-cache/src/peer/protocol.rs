//! Wire format between peers.
//!
//! `GET {peer}/_gatehouse/{group}/{escaped key}`
//!
//! - 200: body is the raw cached value, `x-gatehouse-expires-at` carries the
//!   owner's expiry in unix milliseconds.
//! - 404: the peer does not serve that group.
//! - 502: the owner's load failed; the body is a [`PeerErrorBody`].

use gatehouse_core::GatehouseError;
use serde::{Deserialize, Serialize};

/// Path prefix of the peer listener.
pub const PEER_PATH_PREFIX: &str = "/_gatehouse";

/// Header carrying the owner's expiry for the returned value.
pub const EXPIRES_AT_HEADER: &str = "x-gatehouse-expires-at";

/// Builds the URL used to ask `peer` for `key` in `group`.
pub fn peer_url(peer: &str, group: &str, key: &str) -> String {
    format!(
        "{}{}/{}/{}",
        peer.trim_end_matches('/'),
        PEER_PATH_PREFIX,
        urlencoding::encode(group),
        urlencoding::encode(key)
    )
}

/// A failed load, as sent back to the requesting peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerErrorBody {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub message: String,
}

impl From<&GatehouseError> for PeerErrorBody {
    fn from(err: &GatehouseError) -> Self {
        let message = match err {
            GatehouseError::Transport(m)
            | GatehouseError::Decode(m)
            | GatehouseError::CertificateBuild(m)
            | GatehouseError::Configuration(m)
            | GatehouseError::InvalidKey(m)
            | GatehouseError::UnknownGroup(m) => m.clone(),
            GatehouseError::Upstream { body, .. } => body.clone(),
        };

        Self {
            kind: err.kind().to_string(),
            status: err.status(),
            message,
        }
    }
}

impl From<PeerErrorBody> for GatehouseError {
    fn from(body: PeerErrorBody) -> Self {
        match body.kind.as_str() {
            "upstream" => GatehouseError::upstream(body.status.unwrap_or(502), body.message),
            "decode" => GatehouseError::Decode(body.message),
            "certificate" => GatehouseError::CertificateBuild(body.message),
            "configuration" => GatehouseError::Configuration(body.message),
            "invalid_key" => GatehouseError::InvalidKey(body.message),
            "unknown_group" => GatehouseError::UnknownGroup(body.message),
            _ => GatehouseError::Transport(body.message),
        }
    }
}
