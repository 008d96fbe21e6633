//! Wire model for the Vigil API

pub mod event;
pub mod statistics;
pub mod user;

pub use event::{
    parse_timestamp, Event, EventId, EventPage, EventQuery, EventType, Location, MarkAllReadAck,
    UnreadCount, UserId, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use statistics::{DateRange, EventStatistics, DEFAULT_STATISTICS_DAYS, MAX_STATISTICS_DAYS};
pub use user::{
    AccessToken, PasswordResetConfirm, PasswordResetTicket, ProfileUpdate, RegisterRequest,
    UserProfile,
};
pub(crate) use user::{LoginRequest, PasswordResetRequest};
