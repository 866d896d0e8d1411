//! Error types for the Uptime API client.
//!
//! # Design
//! Authentication failures get a dedicated variant because callers handle a
//! rejected token differently from any other server-side failure. Every other
//! status >= 400 lands in `RequestFailed` with enough context (method, path,
//! status line, body) to diagnose the call from the error message alone.

use thiserror::Error;

use crate::http::HttpMethod;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors returned by `UptimeClient` and the resource handles.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Neither a token nor an email + password pair was configured.
    #[error("no credentials provided")]
    NoCredentials,

    /// The login form exchange did not produce an access token.
    #[error("credentials to token failed: {0}")]
    CredentialExchangeFailed(String),

    /// The server answered 401 or 403.
    #[error("token authentication failed")]
    AuthenticationFailed,

    /// The server answered with a status >= 400 other than 401/403.
    #[error("error sending {method} request to {path}: {status_line}.{}", body_suffix(.body))]
    RequestFailed {
        method: HttpMethod,
        path: String,
        status: u16,
        status_line: String,
        body: Option<String>,
    },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Encode(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Decode(String),

    /// A call that must return a body returned nothing.
    #[error("no response body")]
    EmptyResponse,

    /// The base URL or an endpoint derived from it is not a valid URL.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// The request never produced a response, even after retrying.
    #[error("error sending request: {0}")]
    Transport(String),
}

fn body_suffix(body: &Option<String>) -> String {
    match body {
        Some(body) => format!(" response body: {body}"),
        None => String::new(),
    }
}

impl ApiError {
    /// HTTP status carried by the error, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::RequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }
}
