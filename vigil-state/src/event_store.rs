//! Cached event feed for the signed-in user
//!
//! Every remote call is made first; local state changes only once the call
//! has resolved, and then in a single atomic update of the feed cell.
//!
//! # Load ordering
//!
//! Each `load` takes the next load token before it suspends. When its
//! response arrives, it is applied only if no newer `load` has started in
//! the meantime. Stale successes and stale failures are both discarded, so
//! the last-started load always wins. `load_more` pages are tied to the
//! token current when they were requested.

use std::sync::Arc;

use state_store::{ChangeIterator, StateCell, Subscription};
use tracing::{debug, info, warn};
use vigil_api::{
    Event, EventClient, EventId, EventQuery, UserId, DEFAULT_PAGE_SIZE, DEFAULT_STATISTICS_DAYS,
};

use crate::error::{Result, StateError};
use crate::feed::{normalize_events, EventFeed, FeedOperation};
use crate::session::SessionManager;

/// Feed tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedConfig {
    /// Events requested per page
    /// Default: 20
    pub page_size: u32,

    /// Window used by `refresh` for statistics
    /// Default: 7 days
    pub statistics_days: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            statistics_days: DEFAULT_STATISTICS_DAYS,
        }
    }
}

/// What happened to a load's response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The response was committed to the feed
    Applied,
    /// A newer load started first; the response was discarded
    Superseded,
    /// Nothing left to page in
    Exhausted,
}

/// Owns the cached feed, unread counter and statistics for one user
///
/// Create one per signed-in user and drop it when the user changes.
pub struct EventStore {
    client: Arc<dyn EventClient>,
    session: Arc<SessionManager>,
    config: FeedConfig,
    feed: StateCell<EventFeed>,
}

impl EventStore {
    pub fn new(client: Arc<dyn EventClient>, session: Arc<SessionManager>, config: FeedConfig) -> Self {
        Self {
            client,
            session,
            config,
            feed: StateCell::new("event_feed", EventFeed::default()),
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Snapshot of the cached feed
    pub fn feed(&self) -> EventFeed {
        self.feed.get()
    }

    /// Call `callback` after every committed feed change
    pub fn subscribe(&self, callback: impl Fn(&EventFeed) + Send + Sync + 'static) -> Subscription {
        self.feed.subscribe(callback)
    }

    /// Blocking iterator over feed changes
    pub fn watch(&self) -> ChangeIterator {
        self.feed.watch()
    }

    pub fn clear_error(&self) {
        self.feed.update(|feed| feed.last_error = None);
    }

    /// Load the first page, replacing the cached feed
    ///
    /// A failure keeps the previously cached events and counters and only
    /// records the error. Returns [`LoadOutcome::Superseded`] when a newer
    /// load started before this one finished.
    pub async fn load(&self, user_id: UserId, unread_only: bool) -> Result<LoadOutcome> {
        let token = self.token(FeedOperation::Load)?;
        let load_token = self.feed.update(|feed| {
            feed.load_token += 1;
            feed.loading = true;
            feed.loading_more = false;
            feed.load_token
        });

        debug!(user_id, load_token, unread_only, "loading events");
        let query = EventQuery::new(user_id)
            .page_size(self.config.page_size)
            .unread_only(unread_only);
        let result = self.client.fetch_events(&token, &query).await;

        match result {
            Ok(page) => {
                let (total, unread) = (page.total, page.unread);
                let applied = self.feed.update(|feed| {
                    if feed.load_token != load_token {
                        return false;
                    }
                    feed.events = normalize_events(page.events);
                    feed.total_count = total;
                    feed.unread_count = unread;
                    feed.pages_loaded = 1;
                    feed.unread_only = unread_only;
                    feed.loading = false;
                    feed.last_error = None;
                    true
                });

                if applied {
                    info!(user_id, load_token, total, unread, "events loaded");
                    Ok(LoadOutcome::Applied)
                } else {
                    debug!(user_id, load_token, "discarding superseded load");
                    Ok(LoadOutcome::Superseded)
                }
            }
            Err(err) => {
                let err = StateError::from(err);
                self.report_auth(&err);

                let applied = self.feed.update(|feed| {
                    if feed.load_token != load_token {
                        return false;
                    }
                    feed.loading = false;
                    feed.record_error(FeedOperation::Load, &err);
                    true
                });

                if applied {
                    warn!(user_id, load_token, error = %err, "loading events failed");
                    Err(err)
                } else {
                    debug!(user_id, load_token, error = %err, "discarding superseded load failure");
                    Ok(LoadOutcome::Superseded)
                }
            }
        }
    }

    /// Append the next page to the cached feed
    ///
    /// Pages with the same filter as the last `load`. Events already cached
    /// are skipped. If no page has been loaded yet this performs a `load`.
    pub async fn load_more(&self, user_id: UserId) -> Result<LoadOutcome> {
        let token = self.token(FeedOperation::LoadMore)?;
        let (load_token, pages_loaded, unread_only, has_more) = self.feed.read(|feed| {
            (feed.load_token, feed.pages_loaded, feed.unread_only, feed.has_more())
        });

        if pages_loaded == 0 {
            return self.load(user_id, unread_only).await;
        }
        if !has_more {
            return Ok(LoadOutcome::Exhausted);
        }

        let next_page = pages_loaded + 1;
        self.feed.update(|feed| {
            if feed.load_token == load_token {
                feed.loading_more = true;
            }
        });

        debug!(user_id, load_token, page = next_page, "loading more events");
        let query = EventQuery::new(user_id)
            .page(next_page)
            .page_size(self.config.page_size)
            .unread_only(unread_only);
        let result = self.client.fetch_events(&token, &query).await;

        match result {
            Ok(page) => {
                let applied = self.feed.update(|feed| {
                    if feed.load_token != load_token {
                        return false;
                    }
                    let mut events = std::mem::take(&mut feed.events);
                    events.extend(page.events);
                    feed.events = normalize_events(events);
                    feed.total_count = page.total;
                    feed.unread_count = page.unread;
                    feed.pages_loaded = feed.pages_loaded.max(next_page);
                    feed.loading_more = false;
                    feed.clear_error_from(FeedOperation::LoadMore);
                    true
                });

                if applied {
                    Ok(LoadOutcome::Applied)
                } else {
                    debug!(user_id, load_token, page = next_page, "discarding page from superseded load");
                    Ok(LoadOutcome::Superseded)
                }
            }
            Err(err) => {
                let err = StateError::from(err);
                self.report_auth(&err);

                let applied = self.feed.update(|feed| {
                    if feed.load_token != load_token {
                        return false;
                    }
                    feed.loading_more = false;
                    feed.record_error(FeedOperation::LoadMore, &err);
                    true
                });

                if applied {
                    warn!(user_id, page = next_page, error = %err, "loading more events failed");
                    Err(err)
                } else {
                    Ok(LoadOutcome::Superseded)
                }
            }
        }
    }

    /// Replace the statistics snapshot; events and counters are untouched
    pub async fn load_statistics(&self, user_id: UserId, days: u32) -> Result<()> {
        let token = self.token(FeedOperation::Statistics)?;

        match self.client.fetch_statistics(&token, user_id, days).await {
            Ok(statistics) => {
                debug!(user_id, days, total_events = statistics.total_events, "statistics loaded");
                self.feed.update(|feed| {
                    feed.statistics = Some(statistics);
                    feed.clear_error_from(FeedOperation::Statistics);
                });
                Ok(())
            }
            Err(err) => Err(self.fail(FeedOperation::Statistics, err.into())),
        }
    }

    /// Mark one event read on the server, then in the cache
    ///
    /// A cached copy is replaced by the server's answer and the unread
    /// counter drops by one only if that copy was unread. When the event is
    /// not cached the counter is re-read from the server instead.
    pub async fn mark_as_read(&self, event_id: EventId) -> Result<()> {
        let token = self.token(FeedOperation::MarkRead)?;

        let updated = match self.client.mark_read(&token, event_id).await {
            Ok(event) => event,
            Err(err) => return Err(self.fail(FeedOperation::MarkRead, err.into())),
        };

        let cached_was_unread = self.feed.update(|feed| {
            feed.clear_error_from(FeedOperation::MarkRead);
            let cached = feed.event(event_id)?;
            let was_unread = !cached.is_read();
            let read = if updated.id() == event_id {
                updated.with_read(true)
            } else {
                cached.with_read(true)
            };
            feed.replace(read);
            if was_unread {
                feed.unread_count = feed.unread_count.saturating_sub(1);
            }
            Some(was_unread)
        });

        match cached_was_unread {
            Some(decremented) => debug!(event_id, decremented, "event marked read"),
            None => {
                debug!(event_id, "marked uncached event read, resyncing unread count");
                self.fetch_unread_count_only(updated.user_id()).await;
            }
        }
        Ok(())
    }

    /// Mark every event read on the server, then in the cache
    ///
    /// Returns the number of events the server updated.
    pub async fn mark_all_read(&self, user_id: UserId) -> Result<u64> {
        let token = self.token(FeedOperation::MarkAllRead)?;

        let ack = match self.client.mark_all_read(&token, user_id).await {
            Ok(ack) => ack,
            Err(err) => return Err(self.fail(FeedOperation::MarkAllRead, err.into())),
        };

        self.feed.update(|feed| {
            feed.events = feed
                .events
                .iter()
                .map(|event| if event.is_read() { event.clone() } else { event.with_read(true) })
                .collect();
            feed.unread_count = 0;
            feed.clear_error_from(FeedOperation::MarkAllRead);
        });

        info!(user_id, count = ack.count, "all events marked read");
        Ok(ack.count)
    }

    /// Reload the first page, then the statistics
    ///
    /// Whatever succeeds is committed. When the load fails the statistics
    /// are not requested, so the whole cached feed stays as it was.
    pub async fn refresh(&self, user_id: UserId) -> Result<()> {
        let unread_only = self.feed.read(EventFeed::is_unread_only);

        if let Err(err) = self.load(user_id, unread_only).await {
            return Err(self.record_refresh(Some(err), None));
        }

        if let Err(err) = self.load_statistics(user_id, self.config.statistics_days).await {
            return Err(self.record_refresh(None, Some(err)));
        }

        self.feed.update(|feed| feed.clear_error_from(FeedOperation::Refresh));
        Ok(())
    }

    fn record_refresh(&self, load: Option<StateError>, statistics: Option<StateError>) -> StateError {
        let err = StateError::Refresh {
            load: load.map(Box::new),
            statistics: statistics.map(Box::new),
        };
        warn!(error = %err, "refresh incomplete");
        self.feed.update(|feed| feed.record_error(FeedOperation::Refresh, &err));
        err
    }

    /// Poll the server's unread count for a badge
    ///
    /// Failures are logged and swallowed, except that a 401 still signs the
    /// session out.
    pub async fn fetch_unread_count_only(&self, user_id: UserId) -> Option<u64> {
        let Some(token) = self.session.token() else {
            debug!(user_id, "skipping unread count poll without a session");
            return None;
        };

        match self.client.fetch_unread_count(&token, user_id).await {
            Ok(count) => {
                self.feed.update(|feed| feed.unread_count = count);
                Some(count)
            }
            Err(err) => {
                let err = StateError::from(err);
                self.report_auth(&err);
                debug!(user_id, error = %err, "unread count poll failed");
                None
            }
        }
    }

    /// Fetch one event and refresh its cached copy, if any
    pub async fn fetch_event(&self, event_id: EventId) -> Result<Event> {
        let token = self.token(FeedOperation::FetchEvent)?;

        match self.client.fetch_event(&token, event_id).await {
            Ok(event) => {
                self.feed.update(|feed| {
                    feed.replace(event.clone());
                    feed.clear_error_from(FeedOperation::FetchEvent);
                });
                Ok(event)
            }
            Err(err) => Err(self.fail(FeedOperation::FetchEvent, err.into())),
        }
    }

    /// Delete an event on the server, then drop it from the cache
    pub async fn delete_event(&self, event_id: EventId) -> Result<()> {
        let token = self.token(FeedOperation::DeleteEvent)?;

        if let Err(err) = self.client.delete_event(&token, event_id).await {
            return Err(self.fail(FeedOperation::DeleteEvent, err.into()));
        }

        self.feed.update(|feed| {
            if let Some(pos) = feed.events.iter().position(|event| event.id() == event_id) {
                let removed = feed.events.remove(pos);
                if !removed.is_read() {
                    feed.unread_count = feed.unread_count.saturating_sub(1);
                }
            }
            feed.total_count = feed.total_count.saturating_sub(1);
            feed.clear_error_from(FeedOperation::DeleteEvent);
        });

        info!(event_id, "event deleted");
        Ok(())
    }

    /// `load` for the signed-in user
    pub async fn load_current(&self, unread_only: bool) -> Result<LoadOutcome> {
        let user_id = self.current_user(FeedOperation::Load)?;
        self.load(user_id, unread_only).await
    }

    /// `refresh` for the signed-in user
    pub async fn refresh_current(&self) -> Result<()> {
        let user_id = self.current_user(FeedOperation::Refresh)?;
        self.refresh(user_id).await
    }

    fn current_user(&self, operation: FeedOperation) -> Result<UserId> {
        self.session
            .user_id()
            .ok_or_else(|| self.fail(operation, StateError::NotAuthenticated))
    }

    fn token(&self, operation: FeedOperation) -> Result<String> {
        self.session
            .token()
            .ok_or_else(|| self.fail(operation, StateError::NotAuthenticated))
    }

    fn fail(&self, operation: FeedOperation, err: StateError) -> StateError {
        self.report_auth(&err);
        warn!(?operation, error = %err, "feed operation failed");
        self.feed.update(|feed| feed.record_error(operation, &err));
        err
    }

    fn report_auth(&self, err: &StateError) {
        if err.is_auth() {
            self.session.force_logout(&err.to_string());
        }
    }
}

impl std::fmt::Debug for EventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let feed = self.feed.get();
        f.debug_struct("EventStore")
            .field("config", &self.config)
            .field("cached_events", &feed.events().len())
            .field("unread_count", &feed.unread_count())
            .field("load_token", &feed.load_token())
            .finish_non_exhaustive()
    }
}
