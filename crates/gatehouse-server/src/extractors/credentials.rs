use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use crate::error::AppError;

/// SigV4 authorization scheme.
const SIGV4_SCHEME: &str = "AWS4-HMAC-SHA256";

/// API key id presented by the caller.
///
/// Accepted forms:
/// - `Authorization: Bearer <key id>`
/// - `Authorization: AWS4-HMAC-SHA256 Credential=<key id>/<scope>, ...`
///
/// Only the key id is extracted. The header reaches the origin unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKeyId(pub String);

impl ApiKeyId {
    pub fn from_authorization(value: &str) -> Option<Self> {
        let (scheme, rest) = value.trim().split_once(' ')?;

        let id = if scheme.eq_ignore_ascii_case("bearer") {
            rest.trim()
        } else if scheme == SIGV4_SCHEME {
            rest.split(',')
                .map(str::trim)
                .find_map(|field| field.strip_prefix("Credential="))
                .and_then(|credential| credential.split('/').next())?
        } else {
            return None;
        };

        (!id.is_empty()).then(|| Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for ApiKeyId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(ApiKeyId::from_authorization)
            .ok_or_else(|| AppError::Unauthorized("missing or unreadable credentials".to_string()))
    }
}
