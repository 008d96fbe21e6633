//! Mock transport and storage implementations for testing.
//!
//! The mocks never touch the network. Failure modes are switched on with
//! status codes stored in atomics: `0` succeeds, `1` simulates an
//! unreachable backend, `401` a rejected token, anything else an API error
//! with that status.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU16, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use tokio::sync::oneshot;
use vigil_api::{
    AccessToken, ApiError, DateRange, Event, EventClient, EventId, EventPage, EventQuery,
    EventStatistics, EventType, MarkAllReadAck, PasswordResetConfirm, PasswordResetTicket,
    ProfileUpdate, RegisterRequest, SessionTransport, UserId, UserProfile,
};
use vigil_state::{
    CredentialStore, EventStore, FeedConfig, MemoryCredentialStore, SessionManager, StateError,
};

pub const USER_ID: UserId = 7;
pub const TOKEN: &str = "token-alice";

type ApiResult<T> = std::result::Result<T, ApiError>;

/// Build the error a switch code stands for
pub fn scripted_error(code: u16) -> ApiError {
    match code {
        1 => ApiError::NetworkError("connection refused".to_string()),
        401 => ApiError::AuthError("Could not validate credentials".to_string()),
        status => ApiError::ApiError {
            status,
            message: "scripted failure".to_string(),
        },
    }
}

fn check(switch: &AtomicU16) -> ApiResult<()> {
    match switch.load(Ordering::SeqCst) {
        0 => Ok(()),
        code => Err(scripted_error(code)),
    }
}

/// Event at `minute` past noon on a fixed day
pub fn event(id: EventId, minute: i64, is_read: bool) -> Event {
    let noon = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    Event::new(id, USER_ID, EventType::Loitering, 0.8, noon + Duration::minutes(minute))
        .with_read(is_read)
        .with_camera_id("cam-1")
}

pub fn page(events: Vec<Event>, total: u64, unread: u64) -> EventPage {
    EventPage {
        events,
        total,
        unread,
        page: Some(1),
        page_size: Some(20),
    }
}

pub fn statistics(total_events: u64) -> EventStatistics {
    EventStatistics {
        total_events,
        by_type: BTreeMap::from([("loitering".to_string(), total_events)]),
        by_day: BTreeMap::from([("2024-05-01".to_string(), total_events)]),
        average_confidence: 0.8,
        date_range: DateRange {
            start: "2024-04-24T12:00:00".to_string(),
            end: "2024-05-01T12:00:00".to_string(),
        },
    }
}

pub fn profile() -> UserProfile {
    UserProfile {
        id: USER_ID,
        username: "alice".to_string(),
        email: "alice@example.com".to_string(),
        is_active: Some(true),
    }
}

// ============================================================================
// MockEventClient
// ============================================================================

/// Scripted `EventClient`
///
/// `fetch_events` answers are queued in call order. A queued answer can be
/// immediate or held behind a gate that the test releases later, which is
/// how out-of-order completion is forced.
#[derive(Default)]
pub struct MockEventClient {
    pages: Mutex<VecDeque<oneshot::Receiver<ApiResult<EventPage>>>>,
    queries: Mutex<Vec<EventQuery>>,
    events: Mutex<HashMap<EventId, Event>>,
    statistics: Mutex<Option<EventStatistics>>,
    unread_count: AtomicU64,
    pub fail_statistics: AtomicU16,
    pub fail_mark_read: AtomicU16,
    pub fail_mark_all_read: AtomicU16,
    pub fail_unread_count: AtomicU16,
    pub fail_fetch_event: AtomicU16,
    pub fail_delete: AtomicU16,
    pub statistics_calls: AtomicU32,
    pub mark_read_calls: AtomicU32,
}

impl MockEventClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue an immediate `fetch_events` answer
    pub fn push_page(&self, page: EventPage) {
        self.push_result(Ok(page));
    }

    /// Queue an immediate `fetch_events` failure
    pub fn push_error(&self, code: u16) {
        self.push_result(Err(scripted_error(code)));
    }

    fn push_result(&self, result: ApiResult<EventPage>) {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(result);
        self.pages.lock().unwrap().push_back(rx);
    }

    /// Queue a `fetch_events` answer released through the returned sender
    pub fn push_gate(&self) -> oneshot::Sender<ApiResult<EventPage>> {
        let (tx, rx) = oneshot::channel();
        self.pages.lock().unwrap().push_back(rx);
        tx
    }

    pub fn set_statistics(&self, statistics: EventStatistics) {
        *self.statistics.lock().unwrap() = Some(statistics);
    }

    pub fn set_unread_count(&self, count: u64) {
        self.unread_count.store(count, Ordering::SeqCst);
    }

    /// Event served by `fetch_event`
    pub fn put_event(&self, event: Event) {
        self.events.lock().unwrap().insert(event.id(), event);
    }

    pub fn queries(&self) -> Vec<EventQuery> {
        self.queries.lock().unwrap().clone()
    }

    fn authorize(&self, token: &str) -> ApiResult<()> {
        if token == TOKEN {
            Ok(())
        } else {
            Err(ApiError::AuthError("unknown token".to_string()))
        }
    }
}

#[async_trait]
impl EventClient for MockEventClient {
    async fn fetch_events(&self, token: &str, query: &EventQuery) -> ApiResult<EventPage> {
        self.queries.lock().unwrap().push(*query);
        let next = self.pages.lock().unwrap().pop_front();
        self.authorize(token)?;

        match next {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(ApiError::NetworkError("gate dropped".to_string()))),
            None => Err(ApiError::NetworkError("no scripted page".to_string())),
        }
    }

    async fn fetch_event(&self, token: &str, event_id: EventId) -> ApiResult<Event> {
        self.authorize(token)?;
        check(&self.fail_fetch_event)?;
        self.events
            .lock()
            .unwrap()
            .get(&event_id)
            .cloned()
            .ok_or_else(|| scripted_error(404))
    }

    async fn fetch_statistics(&self, token: &str, _user_id: UserId, _days: u32) -> ApiResult<EventStatistics> {
        self.statistics_calls.fetch_add(1, Ordering::SeqCst);
        self.authorize(token)?;
        check(&self.fail_statistics)?;
        Ok(self
            .statistics
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| statistics(0)))
    }

    async fn mark_read(&self, token: &str, event_id: EventId) -> ApiResult<Event> {
        self.mark_read_calls.fetch_add(1, Ordering::SeqCst);
        self.authorize(token)?;
        check(&self.fail_mark_read)?;

        let mut events = self.events.lock().unwrap();
        let Some(stored) = events.get_mut(&event_id) else {
            return Ok(event(event_id, 0, true));
        };
        if !stored.is_read() {
            *stored = stored.with_read(true);
            let _ = self
                .unread_count
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| count.checked_sub(1));
        }
        Ok(stored.clone())
    }

    async fn mark_all_read(&self, token: &str, _user_id: UserId) -> ApiResult<MarkAllReadAck> {
        self.authorize(token)?;
        check(&self.fail_mark_all_read)?;
        Ok(MarkAllReadAck {
            message: Some("Marked events as read".to_string()),
            count: self.unread_count.swap(0, Ordering::SeqCst),
        })
    }

    async fn fetch_unread_count(&self, token: &str, _user_id: UserId) -> ApiResult<u64> {
        self.authorize(token)?;
        check(&self.fail_unread_count)?;
        Ok(self.unread_count.load(Ordering::SeqCst))
    }

    async fn delete_event(&self, token: &str, event_id: EventId) -> ApiResult<()> {
        self.authorize(token)?;
        check(&self.fail_delete)?;
        self.events.lock().unwrap().remove(&event_id);
        Ok(())
    }
}

// ============================================================================
// MockSessionTransport
// ============================================================================

/// Scripted `SessionTransport` with a single account
pub struct MockSessionTransport {
    profile: Mutex<UserProfile>,
    last_update: Mutex<Option<ProfileUpdate>>,
    pub fail_login: AtomicU16,
    pub fail_profile: AtomicU16,
    pub fail_update: AtomicU16,
    pub fail_delete_account: AtomicU16,
    pub login_calls: AtomicU32,
    pub register_calls: AtomicU32,
}

impl MockSessionTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            profile: Mutex::new(profile()),
            last_update: Mutex::new(None),
            fail_login: AtomicU16::new(0),
            fail_profile: AtomicU16::new(0),
            fail_update: AtomicU16::new(0),
            fail_delete_account: AtomicU16::new(0),
            login_calls: AtomicU32::new(0),
            register_calls: AtomicU32::new(0),
        })
    }

    pub fn last_update(&self) -> Option<ProfileUpdate> {
        self.last_update.lock().unwrap().clone()
    }
}

#[async_trait]
impl SessionTransport for MockSessionTransport {
    async fn login(&self, username: &str, password: &str) -> ApiResult<AccessToken> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        check(&self.fail_login)?;
        if username != "alice" || password != "Secret123" {
            return Err(ApiError::AuthError("Incorrect username/email or password".to_string()));
        }
        Ok(AccessToken {
            access_token: TOKEN.to_string(),
            token_type: "bearer".to_string(),
        })
    }

    async fn register(&self, request: &RegisterRequest) -> ApiResult<UserProfile> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        Ok(UserProfile {
            id: 99,
            username: request.username.clone(),
            email: request.email.clone(),
            is_active: Some(true),
        })
    }

    async fn get_profile(&self, token: &str) -> ApiResult<UserProfile> {
        check(&self.fail_profile)?;
        if token != TOKEN {
            return Err(ApiError::AuthError("unknown token".to_string()));
        }
        Ok(self.profile.lock().unwrap().clone())
    }

    async fn update_profile(&self, token: &str, update: &ProfileUpdate) -> ApiResult<UserProfile> {
        *self.last_update.lock().unwrap() = Some(update.clone());
        check(&self.fail_update)?;
        if token != TOKEN {
            return Err(ApiError::AuthError("unknown token".to_string()));
        }

        let mut profile = self.profile.lock().unwrap();
        if let Some(username) = &update.username {
            profile.username = username.clone();
        }
        if let Some(email) = &update.email {
            // The backend stores emails lowercased
            profile.email = email.to_lowercase();
        }
        Ok(profile.clone())
    }

    async fn request_password_reset(&self, _email: &str) -> ApiResult<PasswordResetTicket> {
        Ok(PasswordResetTicket {
            message: Some("Password reset token generated".to_string()),
            token: Some("reset-token".to_string()),
        })
    }

    async fn confirm_password_reset(&self, confirm: &PasswordResetConfirm) -> ApiResult<()> {
        if confirm.token == "reset-token" {
            Ok(())
        } else {
            Err(ApiError::ApiError {
                status: 400,
                message: "Invalid or expired reset token".to_string(),
            })
        }
    }

    async fn delete_account(&self, token: &str) -> ApiResult<()> {
        check(&self.fail_delete_account)?;
        if token != TOKEN {
            return Err(ApiError::AuthError("unknown token".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// MockCredentialStore
// ============================================================================

/// In-memory credential store with switchable failures
///
/// Only `read`/`write`/`remove` are implemented, so group writes go through
/// the trait's rollback path.
#[derive(Default)]
pub struct MockCredentialStore {
    inner: MemoryCredentialStore,
    pub fail_read: std::sync::atomic::AtomicBool,
    pub fail_remove: std::sync::atomic::AtomicBool,
    /// 1-based index of the write that fails; 0 never fails
    pub fail_write_on: AtomicU32,
    pub writes: AtomicU32,
}

impl MockCredentialStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.read(key).ok().flatten()
    }

    pub fn seed(&self, entries: &[(&str, &str)]) {
        for (key, value) in entries {
            self.inner.write(key, value).unwrap();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl CredentialStore for MockCredentialStore {
    fn read(&self, key: &str) -> vigil_state::Result<Option<String>> {
        if self.fail_read.load(Ordering::SeqCst) {
            return Err(StateError::Persistence("keychain locked".to_string()));
        }
        self.inner.read(key)
    }

    fn write(&self, key: &str, value: &str) -> vigil_state::Result<()> {
        let count = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
        if count == self.fail_write_on.load(Ordering::SeqCst) {
            return Err(StateError::Persistence("disk full".to_string()));
        }
        self.inner.write(key, value)
    }

    fn remove(&self, key: &str) -> vigil_state::Result<()> {
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(StateError::Persistence("keychain locked".to_string()));
        }
        self.inner.remove(key)
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub struct Harness {
    pub transport: Arc<MockSessionTransport>,
    pub credentials: Arc<MockCredentialStore>,
    pub session: Arc<SessionManager>,
    pub client: Arc<MockEventClient>,
    pub store: EventStore,
}

/// Signed-out session manager over fresh mocks
pub fn session_manager() -> (Arc<SessionManager>, Arc<MockSessionTransport>, Arc<MockCredentialStore>) {
    let transport = MockSessionTransport::new();
    let credentials = MockCredentialStore::new();
    let session = Arc::new(SessionManager::new(transport.clone(), credentials.clone()));
    (session, transport, credentials)
}

/// Signed-in session plus an empty event store
pub async fn signed_in() -> Harness {
    let (session, transport, credentials) = session_manager();
    session.login("alice", "Secret123").await.unwrap();

    let client = MockEventClient::new();
    let store = EventStore::new(client.clone(), Arc::clone(&session), FeedConfig::default());

    Harness {
        transport,
        credentials,
        session,
        client,
        store,
    }
}
