//! Typed API for the Vigil security-alert backend
//!
//! This crate provides the wire model and a trait-based client for the
//! alerting backend's account and event-feed endpoints. It uses the private
//! `http-client` crate for low-level JSON communication.
//!
//! # Transport traits
//!
//! Stateful layers depend on [`EventClient`] and [`SessionTransport`], not
//! on the concrete [`VigilClient`], so they can be driven by test doubles:
//!
//! ```rust,ignore
//! use vigil_api::{EventClient, EventQuery, SessionTransport, VigilClient};
//!
//! let client = VigilClient::new("http://localhost:8000/api/v1")?;
//! let token = client.login("alice", "Secret123").await?;
//! let profile = client.get_profile(&token.access_token).await?;
//!
//! let page = client
//!     .fetch_events(&token.access_token, &EventQuery::new(profile.id).unread_only(true))
//!     .await?;
//! for event in &page.events {
//!     println!("{} {} ({:.0}%)", event.timestamp(), event.event_type(), event.confidence() * 100.0);
//! }
//! ```
//!
//! Requests the backend would reject for malformed input (short usernames,
//! weak passwords, out-of-range statistics windows) fail locally with
//! [`ApiError::InvalidParameter`] before anything is sent.

pub mod client;
pub mod error;
pub mod model;
pub mod transport;
pub mod validation;

pub use client::VigilClient;
pub use error::{ApiError, Result};
pub use model::{
    AccessToken, DateRange, Event, EventId, EventPage, EventQuery, EventStatistics, EventType,
    Location, MarkAllReadAck, PasswordResetConfirm, PasswordResetTicket, ProfileUpdate,
    RegisterRequest, UserId, UserProfile, DEFAULT_PAGE_SIZE, DEFAULT_STATISTICS_DAYS,
    MAX_PAGE_SIZE, MAX_STATISTICS_DAYS,
};
pub use transport::{EventClient, SessionTransport};
pub use validation::{Validate, ValidationError};
