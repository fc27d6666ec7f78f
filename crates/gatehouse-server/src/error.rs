use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use gatehouse_core::GatehouseError;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum AppError {
    /// Credenciales ausentes o ilegibles
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// La key o la policy no permiten el request
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Parametros invalidos
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Error interno
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl From<GatehouseError> for AppError {
    /// The cause is logged here and never sent to the caller.
    fn from(err: GatehouseError) -> Self {
        warn!(error = %err, kind = err.kind(), "Request failed");

        match err {
            GatehouseError::InvalidKey(msg) => AppError::BadRequest(msg),
            _ => AppError::Internal("request could not be completed".to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "Unauthorized", msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "Forbidden", msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Bad Request", msg),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
                msg,
            ),
        };

        let body = Json(ErrorResponse {
            error: error.to_string(),
            message,
        });

        (status, body).into_response()
    }
}
