//! Boundary traits between the stateful layer and the network
//!
//! Both traits are pure request/response: no caching, no retries and no
//! retained credentials. Authenticated operations take the bearer token as
//! an argument, so a missing token is the caller's problem to report.

use async_trait::async_trait;

use crate::model::{
    AccessToken, Event, EventId, EventPage, EventQuery, EventStatistics, MarkAllReadAck,
    PasswordResetConfirm, PasswordResetTicket, ProfileUpdate, RegisterRequest, UserId, UserProfile,
};
use crate::Result;

/// Event feed operations (`/events/*`)
#[async_trait]
pub trait EventClient: Send + Sync {
    /// List one page of a user's events, most recent first
    async fn fetch_events(&self, token: &str, query: &EventQuery) -> Result<EventPage>;

    /// Fetch a single event
    async fn fetch_event(&self, token: &str, event_id: EventId) -> Result<Event>;

    /// Aggregate statistics over the last `days` days
    async fn fetch_statistics(&self, token: &str, user_id: UserId, days: u32) -> Result<EventStatistics>;

    /// Mark one event as read, returning the server's updated copy
    async fn mark_read(&self, token: &str, event_id: EventId) -> Result<Event>;

    /// Mark every event of a user as read
    async fn mark_all_read(&self, token: &str, user_id: UserId) -> Result<MarkAllReadAck>;

    /// Server-authoritative unread count
    async fn fetch_unread_count(&self, token: &str, user_id: UserId) -> Result<u64>;

    /// Delete one event
    async fn delete_event(&self, token: &str, event_id: EventId) -> Result<()>;
}

/// Account and authentication operations (`/auth/*`, `/users/me`)
#[async_trait]
pub trait SessionTransport: Send + Sync {
    /// Exchange credentials for a bearer token
    async fn login(&self, username: &str, password: &str) -> Result<AccessToken>;

    /// Create an account; does not log in
    async fn register(&self, request: &RegisterRequest) -> Result<UserProfile>;

    /// Profile of the token's owner
    async fn get_profile(&self, token: &str) -> Result<UserProfile>;

    /// Apply a partial profile update and return the updated profile
    async fn update_profile(&self, token: &str, update: &ProfileUpdate) -> Result<UserProfile>;

    /// Ask the backend to issue a password reset token for `email`
    async fn request_password_reset(&self, email: &str) -> Result<PasswordResetTicket>;

    /// Set a new password using a reset token
    async fn confirm_password_reset(&self, confirm: &PasswordResetConfirm) -> Result<()>;

    /// Permanently delete the token owner's account
    async fn delete_account(&self, token: &str) -> Result<()>;
}
