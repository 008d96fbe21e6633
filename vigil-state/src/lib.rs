//! Vigil State Management
//!
//! Client-side session and event-feed state for the Vigil alerting app.
//!
//! # Features
//!
//! - **Session Lifecycle**: restore, login, logout and profile edits, with
//!   credentials persisted as one group
//! - **Feed Cache**: first-page loads, paging, read-state patches and
//!   statistics, reconciled against overlapping network calls
//! - **Reactive Updates**: both components publish snapshots through
//!   `state_store::StateCell` subscribers
//! - **Forced Logout**: any 401 from an authenticated call signs the
//!   session out
//!
//! # Architecture
//!
//! ```text
//! UI ──► SessionManager ──► SessionTransport ─┐
//!  │          ▲  │                            ├──► Vigil HTTP API
//!  │          │  └──► CredentialStore         │
//!  └──► EventStore ───► EventClient ──────────┘
//!        (token, 401s)
//! ```
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use vigil_api::VigilClient;
//! use vigil_state::{EventStore, FeedConfig, FileCredentialStore, SessionManager};
//!
//! let client = Arc::new(VigilClient::new("http://localhost:8000/api/v1")?);
//! let credentials = Arc::new(FileCredentialStore::at_default_location()?);
//! let session = Arc::new(SessionManager::new(client.clone(), credentials));
//!
//! if !session.check_persisted_session() {
//!     session.login("alice", "Secret123").await?;
//! }
//!
//! let store = EventStore::new(client, Arc::clone(&session), FeedConfig::default());
//! let _subscription = store.subscribe(|feed| println!("{} unread", feed.unread_count()));
//! store.refresh_current().await?;
//! ```

pub mod credentials;
pub mod error;
pub mod event_store;
pub mod feed;
pub mod logging;
pub mod session;

pub use credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use error::{ErrorKind, Result, StateError};
pub use event_store::{EventStore, FeedConfig, LoadOutcome};
pub use feed::{normalize_events, EventFeed, FeedError, FeedOperation};
pub use logging::{init_logging, init_logging_from_env, LoggingError, LoggingMode};
pub use session::{Identity, Session, SessionManager, SessionPhase};

// Re-export the observer handles so callers need not depend on state-store
pub use state_store::{ChangeEvent, ChangeIterator, Subscription};
