use thiserror::Error;

#[derive(Error, Debug)]
pub enum SdkError {
    #[error("State management error: {0}")]
    StateError(#[from] vigil_state::StateError),

    #[error("API error: {0}")]
    ApiError(#[from] vigil_api::ApiError),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Not logged in")]
    NotAuthenticated,
}
