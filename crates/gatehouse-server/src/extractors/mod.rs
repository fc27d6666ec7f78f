//! Extractors de request.

mod credentials;
mod host;

pub use credentials::ApiKeyId;
pub use host::Domain;
