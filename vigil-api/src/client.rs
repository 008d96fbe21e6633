use async_trait::async_trait;
use http_client::{HttpClient, HttpConfig, Request};
use tracing::debug;

use crate::model::{
    AccessToken, Event, EventId, EventPage, EventQuery, EventStatistics, LoginRequest,
    MarkAllReadAck, PasswordResetConfirm, PasswordResetRequest, PasswordResetTicket,
    ProfileUpdate, RegisterRequest, UnreadCount, UserId, UserProfile, MAX_STATISTICS_DAYS,
};
use crate::transport::{EventClient, SessionTransport};
use crate::validation::{validate_email, Validate};
use crate::{ApiError, Result};

/// Endpoint paths relative to the API base URL
mod endpoints {
    use crate::model::{EventId, UserId};

    pub const LOGIN: &str = "/auth/login";
    pub const REGISTER: &str = "/auth/register";
    pub const PASSWORD_RESET_REQUEST: &str = "/auth/password-reset/request";
    pub const PASSWORD_RESET_CONFIRM: &str = "/auth/password-reset/confirm";
    pub const ME: &str = "/users/me";

    pub fn user_events(user_id: UserId) -> String {
        format!("/events/user/{}", user_id)
    }

    pub fn event(event_id: EventId) -> String {
        format!("/events/{}", event_id)
    }

    pub fn mark_read(event_id: EventId) -> String {
        format!("/events/{}/read", event_id)
    }

    pub fn mark_all_read(user_id: UserId) -> String {
        format!("/events/user/{}/mark-all-read", user_id)
    }

    pub fn unread_count(user_id: UserId) -> String {
        format!("/events/user/{}/unread-count", user_id)
    }

    pub fn statistics(user_id: UserId) -> String {
        format!("/events/user/{}/statistics", user_id)
    }
}

/// A client for the Vigil backend
///
/// Implements both [`EventClient`] and [`SessionTransport`] over a shared
/// [`HttpClient`]. It holds no credentials: every authenticated call takes
/// the bearer token explicitly.
///
/// ```rust,ignore
/// use vigil_api::{EventClient, EventQuery, SessionTransport, VigilClient};
///
/// let client = VigilClient::new("http://localhost:8000/api/v1")?;
/// let token = client.login("alice", "Secret123").await?.access_token;
/// let page = client.fetch_events(&token, &EventQuery::new(7)).await?;
/// println!("{} unread of {}", page.unread, page.total);
/// ```
#[derive(Debug, Clone)]
pub struct VigilClient {
    http: HttpClient,
}

impl VigilClient {
    /// Create a client for `base_url` with default timeouts
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(base_url)?,
        })
    }

    /// Create a client with explicit transport timeouts
    pub fn with_config(base_url: &str, config: HttpConfig) -> Result<Self> {
        Ok(Self {
            http: HttpClient::with_config(base_url, config)?,
        })
    }

    /// Create a client around an existing HTTP client
    pub fn with_http_client(http: HttpClient) -> Self {
        Self { http }
    }

    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }
}

#[async_trait]
impl EventClient for VigilClient {
    async fn fetch_events(&self, token: &str, query: &EventQuery) -> Result<EventPage> {
        debug!(user_id = query.user_id, page = query.page, unread_only = query.unread_only, "fetching events");
        let request = Request::get(endpoints::user_events(query.user_id))
            .query("page", query.page)
            .query("page_size", query.page_size)
            .query("unread_only", query.unread_only)
            .bearer(token);
        Ok(self.http.send(request).await?)
    }

    async fn fetch_event(&self, token: &str, event_id: EventId) -> Result<Event> {
        let request = Request::get(endpoints::event(event_id)).bearer(token);
        Ok(self.http.send(request).await?)
    }

    async fn fetch_statistics(&self, token: &str, user_id: UserId, days: u32) -> Result<EventStatistics> {
        if !(1..=MAX_STATISTICS_DAYS).contains(&days) {
            return Err(ApiError::InvalidParameter(format!(
                "Parameter 'days' value {} is out of range [1, {}]",
                days, MAX_STATISTICS_DAYS
            )));
        }
        let request = Request::get(endpoints::statistics(user_id))
            .query("days", days)
            .bearer(token);
        Ok(self.http.send(request).await?)
    }

    async fn mark_read(&self, token: &str, event_id: EventId) -> Result<Event> {
        let request = Request::patch(endpoints::mark_read(event_id)).bearer(token);
        Ok(self.http.send(request).await?)
    }

    async fn mark_all_read(&self, token: &str, user_id: UserId) -> Result<MarkAllReadAck> {
        let request = Request::post(endpoints::mark_all_read(user_id)).bearer(token);
        Ok(self.http.send(request).await?)
    }

    async fn fetch_unread_count(&self, token: &str, user_id: UserId) -> Result<u64> {
        let request = Request::get(endpoints::unread_count(user_id)).bearer(token);
        let body: UnreadCount = self.http.send(request).await?;
        Ok(body.unread_count)
    }

    async fn delete_event(&self, token: &str, event_id: EventId) -> Result<()> {
        let request = Request::delete(endpoints::event(event_id)).bearer(token);
        Ok(self.http.send_ack(request).await?)
    }
}

#[async_trait]
impl SessionTransport for VigilClient {
    async fn login(&self, username: &str, password: &str) -> Result<AccessToken> {
        if username.is_empty() || password.is_empty() {
            return Err(ApiError::InvalidParameter(
                "Username and password are required".to_string(),
            ));
        }
        let request = Request::post(endpoints::LOGIN).json(&LoginRequest { username, password })?;
        Ok(self.http.send(request).await?)
    }

    async fn register(&self, request: &RegisterRequest) -> Result<UserProfile> {
        request.validate()?;
        let request = Request::post(endpoints::REGISTER).json(request)?;
        Ok(self.http.send(request).await?)
    }

    async fn get_profile(&self, token: &str) -> Result<UserProfile> {
        let request = Request::get(endpoints::ME).bearer(token);
        Ok(self.http.send(request).await?)
    }

    async fn update_profile(&self, token: &str, update: &ProfileUpdate) -> Result<UserProfile> {
        update.validate()?;
        let request = Request::put(endpoints::ME).json(update)?.bearer(token);
        Ok(self.http.send(request).await?)
    }

    async fn request_password_reset(&self, email: &str) -> Result<PasswordResetTicket> {
        validate_email(email)?;
        let request = Request::post(endpoints::PASSWORD_RESET_REQUEST).json(&PasswordResetRequest { email })?;
        Ok(self.http.send(request).await?)
    }

    async fn confirm_password_reset(&self, confirm: &PasswordResetConfirm) -> Result<()> {
        confirm.validate()?;
        let request = Request::post(endpoints::PASSWORD_RESET_CONFIRM).json(confirm)?;
        Ok(self.http.send_ack(request).await?)
    }

    async fn delete_account(&self, token: &str) -> Result<()> {
        let request = Request::delete(endpoints::ME).bearer(token);
        Ok(self.http.send_ack(request).await?)
    }
}
