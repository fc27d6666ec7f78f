use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::error::AppError;

/// Domain the request is addressed to, taken from `Host` without the port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain(pub String);

impl Domain {
    /// Strips an optional port and lowercases. Handles bracketed IPv6.
    pub fn from_host(host: &str) -> Option<Self> {
        let host = host.trim();
        let name = if let Some(rest) = host.strip_prefix('[') {
            rest.split(']').next()?
        } else {
            host.split(':').next()?
        };

        if name.is_empty() {
            return None;
        }
        Some(Self(name.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for Domain
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let host = parts
            .headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .or_else(|| parts.uri.host());

        host.and_then(Domain::from_host)
            .ok_or_else(|| AppError::BadRequest("missing Host header".to_string()))
    }
}
