//! Middleware stack para el servidor HTTP.
//!
//! Este modulo contiene los middleware de Tower que se aplican a todas las requests:
//! - `RequestIdLayer`: Genera/propaga X-Request-Id
//! - `LoggingLayer`: access log por request (domain, key id, decision)

mod logging;
mod request_id;

pub use logging::{AccessLog, Decision, LoggingLayer, LoggingMiddleware, route_kind};
pub use request_id::{REQUEST_ID_HEADER, RequestId, RequestIdLayer, RequestIdMiddleware};
