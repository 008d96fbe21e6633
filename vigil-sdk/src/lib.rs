//! # Vigil SDK
//!
//! Client-side session and event-feed layer for the Vigil security-alert
//! backend. One [`VigilSystem`] per application holds the login session and
//! hands out the [`EventStore`] of the signed-in user:
//!
//! ```rust,no_run
//! use vigil_sdk::{ClientConfig, VigilSystem};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), vigil_sdk::SdkError> {
//!     let system = VigilSystem::new(ClientConfig::from_env()?)?;
//!
//!     if !system.restore_session() {
//!         system.session().login("alice", "Secret123").await?;
//!     }
//!
//!     let store = system.event_store()?;
//!     let _badge = store.subscribe(|feed| println!("unread: {}", feed.unread_count()));
//!
//!     store.refresh_current().await?;
//!     if let Some(event) = store.feed().events().first() {
//!         store.mark_as_read(event.id()).await?;
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Key Features
//!
//! - **Persisted login**: the session survives restarts and is cleared on
//!   logout or when the backend rejects the token
//! - **Ordered loads**: overlapping feed loads never let an older response
//!   overwrite a newer one
//! - **Confirmed writes**: read-state changes are applied locally only after
//!   the backend accepted them
//! - **Observable state**: subscribe to session and feed snapshots, or
//!   iterate over change events from a blocking thread
//!
//! ## Architecture
//!
//! ```text
//! vigil-sdk (VigilSystem, ClientConfig)
//!     ↓
//! vigil-state (SessionManager, EventStore)
//!     ↓                      ↓
//! state-store (StateCell)   vigil-api (VigilClient)
//!                            ↓
//!                           http-client (reqwest)
//! ```

pub use config::{ClientConfig, DEFAULT_BASE_URL};
pub use error::SdkError;
pub use system::VigilSystem;

// Re-export commonly used types from the lower layers
pub use vigil_api::{Event, EventId, EventStatistics, EventType, ProfileUpdate, UserId, UserProfile};
pub use vigil_state::{
    init_logging, init_logging_from_env, ErrorKind, EventFeed, EventStore, LoadOutcome, LoggingMode,
    Session, SessionManager, StateError, Subscription,
};

pub mod config;
mod error;
mod system;
