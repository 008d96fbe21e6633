use http_client::HttpError;
use thiserror::Error;

use crate::validation::ValidationError;

/// High-level API errors for Vigil operations
///
/// Transport details are folded into four kinds callers actually branch
/// on: the server could not be reached, the token was rejected, the server
/// answered with an error, or the answer could not be understood.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network communication error
    ///
    /// The backend was unreachable or the request timed out.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Authentication error (HTTP 401)
    ///
    /// The bearer token is missing, invalid or expired, or the login
    /// credentials were rejected.
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// Error status returned by the API
    ///
    /// `message` is the FastAPI `detail` field when the body carries one,
    /// otherwise the raw body.
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    /// Response parsing error
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Invalid parameter value
    ///
    /// Rejected locally before any request was sent.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl ApiError {
    /// True for HTTP 401, the error that invalidates a session
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::AuthError(_))
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::AuthError(_) => Some(401),
            ApiError::ApiError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Type alias for results that can return an ApiError
pub type Result<T> = std::result::Result<T, ApiError>;

/// Convert from HttpError to ApiError
impl From<HttpError> for ApiError {
    fn from(error: HttpError) -> Self {
        match error {
            HttpError::Network(msg) => ApiError::NetworkError(msg),
            HttpError::Unauthorized(body) => ApiError::AuthError(detail_message(&body)),
            HttpError::Status { status, body } => ApiError::ApiError {
                status,
                message: detail_message(&body),
            },
            HttpError::Parse(msg) => ApiError::ParseError(msg),
            HttpError::InvalidUrl(msg) => ApiError::InvalidParameter(msg),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        ApiError::InvalidParameter(error.to_string())
    }
}

/// Pull a readable message out of a FastAPI error body
///
/// `detail` is a string for raised `HTTPException`s and a list of
/// `{loc, msg, type}` objects for request validation failures.
fn detail_message(body: &str) -> String {
    let parsed: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => {
            let trimmed = body.trim();
            return if trimmed.is_empty() {
                "empty response body".to_string()
            } else {
                trimmed.to_string()
            };
        }
    };

    match parsed.get("detail") {
        Some(serde_json::Value::String(detail)) => detail.clone(),
        Some(serde_json::Value::Array(items)) => {
            let messages: Vec<String> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()).map(str::to_string))
                .collect();
            if messages.is_empty() {
                parsed["detail"].to_string()
            } else {
                messages.join("; ")
            }
        }
        Some(other) => other.to_string(),
        None => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_conversion() {
        let api_error: ApiError = HttpError::Network("connection refused".to_string()).into();
        assert!(matches!(api_error, ApiError::NetworkError(_)));

        let api_error: ApiError = HttpError::Unauthorized(r#"{"detail":"Incorrect username/email or password"}"#.to_string()).into();
        match api_error {
            ApiError::AuthError(msg) => assert_eq!(msg, "Incorrect username/email or password"),
            other => panic!("Expected AuthError, got {:?}", other),
        }

        let api_error: ApiError = HttpError::Status {
            status: 400,
            body: r#"{"detail":"Username already taken"}"#.to_string(),
        }
        .into();
        assert_eq!(api_error.status(), Some(400));
        assert_eq!(api_error.to_string(), "API error 400: Username already taken");

        let api_error: ApiError = HttpError::Parse("expected value".to_string()).into();
        assert!(matches!(api_error, ApiError::ParseError(_)));
    }

    #[test]
    fn test_validation_detail_list() {
        let body = r#"{"detail":[{"loc":["body","email"],"msg":"value is not a valid email address","type":"value_error"}]}"#;
        assert_eq!(detail_message(body), "value is not a valid email address");
    }

    #[test]
    fn test_non_json_body_passes_through() {
        assert_eq!(detail_message("Internal Server Error\n"), "Internal Server Error");
        assert_eq!(detail_message(""), "empty response body");
    }

    #[test]
    fn test_is_auth() {
        assert!(ApiError::AuthError("expired".to_string()).is_auth());
        assert!(!ApiError::NetworkError("down".to_string()).is_auth());
        assert_eq!(ApiError::AuthError("x".to_string()).status(), Some(401));
    }
}
