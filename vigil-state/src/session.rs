//! Authentication state and persisted-credential lifecycle
//!
//! `SessionManager` is the single owner of the bearer token. It restores a
//! persisted session, logs in and out, applies profile edits, and is the
//! target of the forced logout that any 401 triggers.

use std::sync::Arc;

use parking_lot::RwLock;
use state_store::{ChangeIterator, StateCell, Subscription};
use tracing::{debug, info, warn};
use vigil_api::{
    PasswordResetConfirm, PasswordResetTicket, ProfileUpdate, RegisterRequest, SessionTransport,
    UserId, UserProfile,
};

use crate::credentials::{keys, CredentialStore};
use crate::error::{Result, StateError};

/// The authenticated user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
    pub email: String,
}

impl From<UserProfile> for Identity {
    fn from(profile: UserProfile) -> Self {
        Self {
            user_id: profile.id,
            username: profile.username,
            email: profile.email,
        }
    }
}

/// Operation currently in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Checking,
    LoggingIn,
    UpdatingProfile,
}

/// Observable session state
///
/// Authenticated exactly when an [`Identity`] is present, so a session can
/// never claim to be logged in without a user id, username and email.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    identity: Option<Identity>,
    phase: SessionPhase,
    last_error: Option<String>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.identity.as_ref().map(|identity| identity.user_id)
    }

    pub fn username(&self) -> Option<&str> {
        self.identity.as_ref().map(|identity| identity.username.as_str())
    }

    pub fn email(&self) -> Option<&str> {
        self.identity.as_ref().map(|identity| identity.email.as_str())
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn signed_out(last_error: Option<String>) -> Self {
        Self {
            identity: None,
            phase: SessionPhase::Idle,
            last_error,
        }
    }
}

/// Owns authentication state
///
/// Construct one per process and share it behind an `Arc`; `EventStore`
/// borrows its token and reports 401s back to it.
///
/// ```rust,ignore
/// let session = Arc::new(SessionManager::new(client, credentials));
/// let _subscription = session.subscribe(|s| println!("logged in: {}", s.is_authenticated()));
///
/// if !session.check_persisted_session() {
///     session.login("alice", "Secret123").await?;
/// }
/// ```
pub struct SessionManager {
    transport: Arc<dyn SessionTransport>,
    credentials: Arc<dyn CredentialStore>,
    state: StateCell<Session>,
    token: RwLock<Option<String>>,
}

impl SessionManager {
    pub fn new(transport: Arc<dyn SessionTransport>, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            transport,
            credentials,
            state: StateCell::new("session", Session::default()),
            token: RwLock::new(None),
        }
    }

    /// Snapshot of the current session
    pub fn session(&self) -> Session {
        self.state.get()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read(Session::is_authenticated)
    }

    /// Bearer token of the current session
    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.state.read(Session::user_id)
    }

    /// Call `callback` after every session change
    pub fn subscribe(&self, callback: impl Fn(&Session) + Send + Sync + 'static) -> Subscription {
        self.state.subscribe(callback)
    }

    /// Blocking iterator over session changes
    pub fn watch(&self) -> ChangeIterator {
        self.state.watch()
    }

    pub fn clear_error(&self) {
        self.state.update(|session| session.last_error = None);
    }

    /// Restore the session saved by a previous login
    ///
    /// Never fails: a missing, partial or unreadable record means "not
    /// logged in". Returns whether a session was restored.
    pub fn check_persisted_session(&self) -> bool {
        self.state.update(|session| session.phase = SessionPhase::Checking);

        match self.read_persisted() {
            Ok(Some((token, identity))) => {
                info!(user_id = identity.user_id, "restored persisted session");
                *self.token.write() = Some(token);
                self.state.set(Session {
                    identity: Some(identity),
                    phase: SessionPhase::Idle,
                    last_error: None,
                });
                true
            }
            Ok(None) => {
                debug!("no persisted session");
                self.sign_out_in_memory(None);
                false
            }
            Err(err) => {
                warn!(error = %err, "could not read persisted session, continuing signed out");
                self.sign_out_in_memory(None);
                false
            }
        }
    }

    fn read_persisted(&self) -> Result<Option<(String, Identity)>> {
        let token = match self.credentials.read(keys::TOKEN)? {
            Some(token) if !token.is_empty() => token,
            _ => return Ok(None),
        };

        let user_id = self.credentials.read(keys::USER_ID)?;
        let username = self.credentials.read(keys::USERNAME)?;
        let email = self.credentials.read(keys::EMAIL)?;

        let (Some(user_id), Some(username), Some(email)) = (user_id, username, email) else {
            debug!("persisted session is incomplete");
            return Ok(None);
        };
        let Ok(user_id) = user_id.trim().parse::<UserId>() else {
            debug!("persisted user id is not a number");
            return Ok(None);
        };

        Ok(Some((
            token,
            Identity {
                user_id,
                username,
                email,
            },
        )))
    }

    /// Log in and persist the session
    ///
    /// The session becomes authenticated only after the token, profile and
    /// credential write have all succeeded. Any failure leaves the manager
    /// signed out with `last_error` set and nothing persisted. A failed login
    /// on top of an existing session also clears that session's saved
    /// credentials.
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let replacing = self.token.read().is_some();
        self.state.update(|session| session.phase = SessionPhase::LoggingIn);

        match self.establish(username, password).await {
            Ok((token, identity)) => {
                info!(user_id = identity.user_id, "logged in");
                *self.token.write() = Some(token);
                self.state.set(Session {
                    identity: Some(identity),
                    phase: SessionPhase::Idle,
                    last_error: None,
                });
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "login failed");
                if replacing {
                    self.sign_out(Some(err.to_string()));
                } else {
                    self.sign_out_in_memory(Some(err.to_string()));
                }
                Err(err)
            }
        }
    }

    async fn establish(&self, username: &str, password: &str) -> Result<(String, Identity)> {
        let token = self.transport.login(username, password).await?.access_token;
        let identity = Identity::from(self.transport.get_profile(&token).await?);

        self.credentials.write_all(&[
            (keys::TOKEN, token.clone()),
            (keys::USER_ID, identity.user_id.to_string()),
            (keys::USERNAME, identity.username.clone()),
            (keys::EMAIL, identity.email.clone()),
        ])?;

        Ok((token, identity))
    }

    /// Create an account; the session is not touched
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<UserProfile> {
        let profile = self
            .transport
            .register(&RegisterRequest::new(username, email, password))
            .await?;
        info!(user_id = profile.id, "registered account");
        Ok(profile)
    }

    /// Sign out locally and forget the persisted session
    ///
    /// The in-memory reset always happens; failing to clear the credential
    /// store is only logged.
    pub fn logout(&self) {
        info!("logging out");
        self.sign_out(None);
    }

    /// Sign out because the backend rejected the token
    pub fn force_logout(&self, reason: &str) {
        warn!(reason, "forcing logout");
        self.sign_out(Some(reason.to_string()));
    }

    fn sign_out(&self, last_error: Option<String>) {
        self.sign_out_in_memory(last_error);
        if let Err(err) = self.credentials.remove_all(&keys::ALL) {
            warn!(error = %err, "failed to clear persisted credentials");
        }
    }

    fn sign_out_in_memory(&self, last_error: Option<String>) {
        *self.token.write() = None;
        self.state.set(Session::signed_out(last_error));
    }

    /// Send a partial profile update
    ///
    /// Only the fields present in `update` are sent, and only those fields
    /// are taken from the server's answer. On failure the session keeps its
    /// previous values; a 401 signs out.
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<()> {
        let token = self.require_token()?;
        if update.is_empty() {
            return Ok(());
        }

        self.state.update(|session| session.phase = SessionPhase::UpdatingProfile);

        match self.transport.update_profile(&token, &update).await {
            Ok(profile) => {
                let applied = self.state.update(|session| {
                    session.phase = SessionPhase::Idle;
                    session.last_error = None;
                    match session.identity.as_mut() {
                        Some(identity) if identity.user_id == profile.id => {
                            if update.username.is_some() {
                                identity.username = profile.username.clone();
                            }
                            if update.email.is_some() {
                                identity.email = profile.email.clone();
                            }
                            true
                        }
                        _ => false,
                    }
                });

                if applied {
                    info!(user_id = profile.id, "profile updated");
                    self.persist_profile_fields(&update, &profile);
                } else {
                    debug!(user_id = profile.id, "session changed during profile update, ignoring answer");
                }
                Ok(())
            }
            Err(err) => {
                let err = StateError::from(err);
                if err.is_auth() {
                    self.force_logout(&err.to_string());
                } else {
                    warn!(error = %err, "profile update failed");
                    self.state.update(|session| {
                        session.phase = SessionPhase::Idle;
                        session.last_error = Some(err.to_string());
                    });
                }
                Err(err)
            }
        }
    }

    fn persist_profile_fields(&self, update: &ProfileUpdate, profile: &UserProfile) {
        let mut fields = Vec::new();
        if update.username.is_some() {
            fields.push((keys::USERNAME, profile.username.as_str()));
        }
        if update.email.is_some() {
            fields.push((keys::EMAIL, profile.email.as_str()));
        }
        for (key, value) in fields {
            if let Err(err) = self.credentials.write(key, value) {
                warn!(key, error = %err, "failed to persist profile field");
            }
        }
    }

    /// Ask the backend to issue a reset token for `email`
    pub async fn request_password_reset(&self, email: &str) -> Result<PasswordResetTicket> {
        Ok(self.transport.request_password_reset(email).await?)
    }

    /// Set a new password with a reset token
    pub async fn confirm_password_reset(&self, token: &str, new_password: &str) -> Result<()> {
        let confirm = PasswordResetConfirm {
            token: token.to_string(),
            new_password: new_password.to_string(),
        };
        Ok(self.transport.confirm_password_reset(&confirm).await?)
    }

    /// Delete the account and sign out
    pub async fn delete_account(&self) -> Result<()> {
        let token = self.require_token()?;

        match self.transport.delete_account(&token).await {
            Ok(()) => {
                info!("account deleted");
                self.sign_out(None);
                Ok(())
            }
            Err(err) => {
                let err = StateError::from(err);
                if err.is_auth() {
                    self.force_logout(&err.to_string());
                } else {
                    self.state.update(|session| session.last_error = Some(err.to_string()));
                }
                Err(err)
            }
        }
    }

    fn require_token(&self) -> Result<String> {
        self.token().ok_or_else(|| {
            let err = StateError::NotAuthenticated;
            self.state.update(|session| session.last_error = Some(err.to_string()));
            err
        })
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("session", &self.state.get())
            .finish_non_exhaustive()
    }
}
