//! Authorizing proxy handler.

use axum::{
    body::Body,
    extract::State,
    http::{Request, Response},
    response::IntoResponse,
};
use tracing::{debug, instrument};

use crate::error::AppError;
use crate::extractors::{ApiKeyId, Domain};
use crate::middleware::{AccessLog, Decision};
use crate::state::AppState;

/// Handles every request not matched by an operational route.
///
/// The decision is left on the response as an [`AccessLog`] for the access
/// log middleware.
pub async fn proxy_request(
    State(state): State<AppState>,
    domain: Domain,
    key_id: ApiKeyId,
    request: Request<Body>,
) -> Response<Body> {
    let result = authorize_and_forward(&state, &domain, &key_id, request).await;

    let decision = match &result {
        Ok(_) => Decision::Forwarded,
        Err(AppError::Forbidden(_)) => Decision::Denied,
        Err(_) => Decision::Failed,
    };
    let mut response = result.unwrap_or_else(IntoResponse::into_response);
    response.extensions_mut().insert(AccessLog {
        domain: domain.0,
        key_id: key_id.0,
        decision,
    });
    response
}

/// The key record and the domain policy are resolved concurrently. A
/// revoked or unknown key and a policy denial are 403; anything else that
/// fails during resolution is a 500.
#[instrument(skip_all, fields(domain = %domain.as_str(), key_id = %key_id.as_str()))]
async fn authorize_and_forward(
    state: &AppState,
    domain: &Domain,
    key_id: &ApiKeyId,
    request: Request<Body>,
) -> Result<Response<Body>, AppError> {
    let resolver = state.resolver();
    let (record, policy) = tokio::join!(
        resolver.resolve_key(key_id.as_str()),
        resolver.resolve_policy(domain.as_str())
    );

    let record = match record {
        Ok(record) => record,
        Err(err) if err.status() == Some(404) => {
            debug!("Unknown API key");
            return Err(AppError::Forbidden("unknown API key".to_string()));
        },
        Err(err) => return Err(err.into()),
    };
    let policy = policy?;

    if !record.is_active() {
        return Err(AppError::Forbidden("API key is revoked".to_string()));
    }

    let method = request.method().as_str();
    let path = request.uri().path();
    if !policy.allows(&record.user_id, method, path) {
        debug!(user_id = %record.user_id, method, path, "Denied by policy");
        return Err(AppError::Forbidden(
            "access denied by domain policy".to_string(),
        ));
    }

    Ok(state.forwarder().forward(request).await?)
}
