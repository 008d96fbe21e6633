//! Error types for the HTTP client

use thiserror::Error;

/// Errors that can occur during an HTTP exchange
#[derive(Debug, Error)]
pub enum HttpError {
    /// Connection, DNS, TLS or timeout failure
    #[error("Network/HTTP error: {0}")]
    Network(String),

    /// The server rejected the bearer token (HTTP 401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Any other non-success status, with the raw response body
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response (or request) body was not the expected JSON
    #[error("JSON error: {0}")]
    Parse(String),

    /// The configured base URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
