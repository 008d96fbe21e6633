//! VigilSystem - Main entry point for the SDK
//!
//! Owns the one shared backend client, the credential store and the
//! session, and hands out the event store for whoever is signed in.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};
use vigil_api::{EventClient, SessionTransport, UserId, VigilClient};
use vigil_state::{
    CredentialStore, EventStore, FileCredentialStore, SessionManager,
};

use crate::{ClientConfig, SdkError};

/// Application context
///
/// Build one at startup and share it. The session lives as long as the
/// system; event stores are per user.
///
/// # Example
///
/// ```rust,ignore
/// use vigil_sdk::{ClientConfig, VigilSystem};
///
/// let system = VigilSystem::new(ClientConfig::from_env()?)?;
///
/// if !system.restore_session() {
///     system.session().login("alice", "Secret123").await?;
/// }
///
/// let store = system.event_store()?;
/// store.refresh_current().await?;
/// for event in store.feed().events() {
///     println!("{} {}", event.timestamp(), event.event_type());
/// }
/// ```
pub struct VigilSystem {
    config: ClientConfig,
    events: Arc<dyn EventClient>,
    session: Arc<SessionManager>,

    /// Store for the user it was created for
    event_store: Mutex<Option<(UserId, Arc<EventStore>)>>,
}

impl VigilSystem {
    /// Create a system talking to `config.base_url` over HTTP
    ///
    /// Credentials are kept in `config.credentials_path`, or in the
    /// platform config directory when that is unset.
    pub fn new(config: ClientConfig) -> Result<Self, SdkError> {
        config.validate()?;

        let client = Arc::new(VigilClient::with_config(&config.base_url, config.http_config())?);
        let credentials: Arc<dyn CredentialStore> = match &config.credentials_path {
            Some(path) => Arc::new(FileCredentialStore::new(path)),
            None => Arc::new(FileCredentialStore::at_default_location()?),
        };

        info!(base_url = %config.base_url, "vigil system created");
        Ok(Self::with_parts(config, client.clone(), client, credentials))
    }

    /// [`new`](Self::new) with [`ClientConfig::from_env`]
    pub fn from_env() -> Result<Self, SdkError> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Assemble a system from existing components
    pub fn with_parts(
        config: ClientConfig,
        transport: Arc<dyn SessionTransport>,
        events: Arc<dyn EventClient>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            config,
            events,
            session: Arc::new(SessionManager::new(transport, credentials)),
            event_store: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Restore the session saved by a previous run
    pub fn restore_session(&self) -> bool {
        self.session.check_persisted_session()
    }

    /// Event store for the signed-in user
    ///
    /// Returns the same store until a different user signs in; the previous
    /// user's store is then dropped and a fresh one created.
    pub fn event_store(&self) -> Result<Arc<EventStore>, SdkError> {
        let user_id = self.session.user_id().ok_or(SdkError::NotAuthenticated)?;
        let mut current = self.event_store.lock();

        if let Some((owner, store)) = current.as_ref() {
            if *owner == user_id {
                return Ok(Arc::clone(store));
            }
            debug!(previous = *owner, user_id, "user changed, discarding event store");
        }

        let store = Arc::new(EventStore::new(
            Arc::clone(&self.events),
            Arc::clone(&self.session),
            self.config.feed_config(),
        ));
        *current = Some((user_id, Arc::clone(&store)));
        debug!(user_id, "created event store");
        Ok(store)
    }

    /// Sign out and drop the cached event store
    pub fn logout(&self) {
        self.session.logout();
        self.event_store.lock().take();
    }
}

impl std::fmt::Debug for VigilSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VigilSystem")
            .field("config", &self.config)
            .field("session", &self.session.session())
            .finish_non_exhaustive()
    }
}
