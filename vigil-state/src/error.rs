//! Error types for vigil-state

use std::fmt;

use vigil_api::ApiError;

/// Result type for vigil-state operations
pub type Result<T> = std::result::Result<T, StateError>;

/// Coarse classification of a [`StateError`] for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Network,
    Auth,
    Api,
    Parse,
    InvalidParameter,
    Persistence,
    NotAuthenticated,
    Refresh,
}

/// Errors reported by `SessionManager` and `EventStore`
///
/// The `Display` text is the human-readable message that the components
/// also record as their latest error.
#[derive(Debug, Clone, PartialEq)]
pub enum StateError {
    /// Backend unreachable or timed out
    Network(String),

    /// Token rejected (HTTP 401)
    Auth(String),

    /// Backend answered with an error status
    Api { status: u16, message: String },

    /// Response could not be decoded
    Parse(String),

    /// Rejected locally before any request was sent
    InvalidParameter(String),

    /// Credential store read or write failed
    Persistence(String),

    /// An authenticated operation was attempted without a session
    NotAuthenticated,

    /// One or both halves of a refresh failed
    Refresh {
        load: Option<Box<StateError>>,
        statistics: Option<Box<StateError>>,
    },
}

impl StateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StateError::Network(_) => ErrorKind::Network,
            StateError::Auth(_) => ErrorKind::Auth,
            StateError::Api { .. } => ErrorKind::Api,
            StateError::Parse(_) => ErrorKind::Parse,
            StateError::InvalidParameter(_) => ErrorKind::InvalidParameter,
            StateError::Persistence(_) => ErrorKind::Persistence,
            StateError::NotAuthenticated => ErrorKind::NotAuthenticated,
            StateError::Refresh { .. } => ErrorKind::Refresh,
        }
    }

    /// True when the error means the current token is dead
    pub fn is_auth(&self) -> bool {
        match self {
            StateError::Auth(_) => true,
            StateError::Refresh { load, statistics } => {
                load.as_deref().is_some_and(StateError::is_auth)
                    || statistics.as_deref().is_some_and(StateError::is_auth)
            }
            _ => false,
        }
    }
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::Network(msg) => write!(f, "Network error: {}", msg),
            StateError::Auth(msg) => write!(f, "Authentication failed: {}", msg),
            StateError::Api { status, message } => write!(f, "API error {}: {}", status, message),
            StateError::Parse(msg) => write!(f, "Parse error: {}", msg),
            StateError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            StateError::Persistence(msg) => write!(f, "Credential storage error: {}", msg),
            StateError::NotAuthenticated => write!(f, "Not logged in"),
            StateError::Refresh { load, statistics } => {
                write!(f, "Refresh failed")?;
                let mut separator = ": ";
                if let Some(err) = load {
                    write!(f, "{}events: {}", separator, err)?;
                    separator = "; ";
                }
                if let Some(err) = statistics {
                    write!(f, "{}statistics: {}", separator, err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for StateError {}

impl From<ApiError> for StateError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NetworkError(msg) => StateError::Network(msg),
            ApiError::AuthError(msg) => StateError::Auth(msg),
            ApiError::ApiError { status, message } => StateError::Api { status, message },
            ApiError::ParseError(msg) => StateError::Parse(msg),
            ApiError::InvalidParameter(msg) => StateError::InvalidParameter(msg),
        }
    }
}

impl From<std::io::Error> for StateError {
    fn from(err: std::io::Error) -> Self {
        StateError::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for StateError {
    fn from(err: serde_json::Error) -> Self {
        StateError::Persistence(format!("corrupt credential file: {}", err))
    }
}
