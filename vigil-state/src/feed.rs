//! Cached event feed
//!
//! `EventFeed` is the value an `EventStore` publishes. It is replaced
//! wholesale by a load and patched by id for read-state changes; events
//! themselves are never mutated in place.

use std::collections::HashSet;

use vigil_api::{Event, EventId, EventStatistics};

use crate::error::{ErrorKind, StateError};

/// Store operation that produced a recorded failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedOperation {
    Load,
    LoadMore,
    Statistics,
    Refresh,
    MarkRead,
    MarkAllRead,
    FetchEvent,
    DeleteEvent,
}

/// The latest failure recorded on a feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedError {
    pub operation: FeedOperation,
    pub kind: ErrorKind,
    pub message: String,
}

/// Snapshot of the cached feed for one user
///
/// `unread_count` and `total_count` are the server's counts. `events` may
/// hold only the first pages, so they need not agree with it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventFeed {
    pub(crate) events: Vec<Event>,
    pub(crate) total_count: u64,
    pub(crate) unread_count: u64,
    pub(crate) statistics: Option<EventStatistics>,
    pub(crate) loading: bool,
    pub(crate) loading_more: bool,
    pub(crate) last_error: Option<FeedError>,
    pub(crate) load_token: u64,
    pub(crate) pages_loaded: u32,
    pub(crate) unread_only: bool,
}

impl EventFeed {
    /// Cached events, most recent first
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn event(&self, event_id: EventId) -> Option<&Event> {
        self.events.iter().find(|event| event.id() == event_id)
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn unread_count(&self) -> u64 {
        self.unread_count
    }

    pub fn statistics(&self) -> Option<&EventStatistics> {
        self.statistics.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_loading_more(&self) -> bool {
        self.loading_more
    }

    /// Message of the latest failure
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_ref().map(|err| err.message.as_str())
    }

    pub fn last_failure(&self) -> Option<&FeedError> {
        self.last_error.as_ref()
    }

    /// Sequence number of the most recently started load
    pub fn load_token(&self) -> u64 {
        self.load_token
    }

    pub fn pages_loaded(&self) -> u32 {
        self.pages_loaded
    }

    /// Whether the cached feed came from an unread-only load
    pub fn is_unread_only(&self) -> bool {
        self.unread_only
    }

    /// Whether the server holds more events than are cached
    pub fn has_more(&self) -> bool {
        (self.events.len() as u64) < self.total_count
    }

    pub(crate) fn record_error(&mut self, operation: FeedOperation, error: &StateError) {
        self.last_error = Some(FeedError {
            operation,
            kind: error.kind(),
            message: error.to_string(),
        });
    }

    /// Clear the latest failure if `operation` produced it
    pub(crate) fn clear_error_from(&mut self, operation: FeedOperation) {
        if self.last_error.as_ref().map(|err| err.operation) == Some(operation) {
            self.last_error = None;
        }
    }

    /// Replace a cached event by id, keeping its position
    pub(crate) fn replace(&mut self, event: Event) -> Option<Event> {
        let slot = self.events.iter_mut().find(|cached| cached.id() == event.id())?;
        Some(std::mem::replace(slot, event))
    }
}

/// Drop repeated ids (first occurrence wins) and order by timestamp, newest first
///
/// The sort is stable, so events sharing a timestamp keep server order.
pub fn normalize_events(events: Vec<Event>) -> Vec<Event> {
    let mut seen = HashSet::with_capacity(events.len());
    let mut events: Vec<Event> = events
        .into_iter()
        .filter(|event| seen.insert(event.id()))
        .collect();
    events.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
    events
}
