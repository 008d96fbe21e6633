//! Observable state cell
//!
//! `StateCell<S>` holds one value, applies updates atomically, detects real
//! changes with `PartialEq`, and fans every committed change out to
//! subscribers (synchronous callbacks) and watchers (blocking iterators).

use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError, RwLock};

use crate::event::ChangeEvent;
use crate::iter::ChangeIterator;
use crate::subscription::Subscription;

type Callback<S> = Arc<dyn Fn(&S) + Send + Sync>;

thread_local! {
    /// Cells currently delivering notifications on this thread
    static NOTIFYING: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Marks a cell as notifying for the lifetime of the guard, unwinding included
struct NotifyGuard {
    cell_id: usize,
}

impl NotifyGuard {
    fn enter(cell_id: usize) -> Self {
        NOTIFYING.with(|ids| ids.borrow_mut().push(cell_id));
        Self { cell_id }
    }

    fn is_active(cell_id: usize) -> bool {
        NOTIFYING.with(|ids| ids.borrow().contains(&cell_id))
    }
}

impl Drop for NotifyGuard {
    fn drop(&mut self) {
        NOTIFYING.with(|ids| {
            let mut ids = ids.borrow_mut();
            if let Some(pos) = ids.iter().rposition(|id| *id == self.cell_id) {
                ids.remove(pos);
            }
        });
    }
}

struct Versioned<S> {
    value: S,
    revision: u64,
}

struct Shared<S> {
    key: &'static str,
    state: RwLock<Versioned<S>>,
    subscribers: Mutex<Vec<(u64, Callback<S>)>>,
    watchers: Mutex<Vec<mpsc::Sender<ChangeEvent>>>,
    next_subscriber: AtomicU64,
    /// Serialises commit + fan-out so subscribers see revisions in order
    commit: Mutex<()>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A shared, observable value with change detection
///
/// Cloning a `StateCell` is cheap and every clone observes the same value.
///
/// # Rules
///
/// - `update` runs its closure on a copy of the value. The copy is committed
///   only if it differs from the current value, which bumps the revision.
/// - After a commit, every subscriber is called synchronously with the new
///   value, after the value lock has been released and in registration
///   order. Watchers then receive a [`ChangeEvent`].
/// - Subscribers must not update the cell that is notifying them. Doing so
///   panics in debug builds; release builds apply the update without
///   notifying anyone.
///
/// # Example
///
/// ```rust
/// use state_store::StateCell;
///
/// let counter = StateCell::new("counter", 0u32);
/// let _subscription = counter.subscribe(|value| println!("counter = {}", value));
///
/// assert!(counter.set(1));      // prints "counter = 1"
/// assert!(!counter.set(1));     // unchanged, nothing printed
/// counter.update(|v| *v += 1);  // prints "counter = 2"
/// assert_eq!(counter.revision(), 2);
/// ```
pub struct StateCell<S> {
    shared: Arc<Shared<S>>,
}

impl<S> StateCell<S>
where
    S: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a cell holding `initial` at revision 0
    pub fn new(key: &'static str, initial: S) -> Self {
        Self {
            shared: Arc::new(Shared {
                key,
                state: RwLock::new(Versioned {
                    value: initial,
                    revision: 0,
                }),
                subscribers: Mutex::new(Vec::new()),
                watchers: Mutex::new(Vec::new()),
                next_subscriber: AtomicU64::new(0),
                commit: Mutex::new(()),
            }),
        }
    }

    /// Key used in change events
    pub fn key(&self) -> &'static str {
        self.shared.key
    }

    /// Snapshot of the current value
    pub fn get(&self) -> S {
        self.read(S::clone)
    }

    /// Borrow the current value without cloning it
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        let state = self.shared.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state.value)
    }

    /// Number of committed changes so far
    pub fn revision(&self) -> u64 {
        self.shared
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .revision
    }

    /// Replace the value, returning whether it changed
    pub fn set(&self, value: S) -> bool {
        self.commit(|current| *current = value).1
    }

    /// Apply `f` to a copy of the value and commit it if it changed
    pub fn update<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        self.commit(f).0
    }

    /// Register a callback invoked after every committed change
    pub fn subscribe(&self, callback: impl Fn(&S) + Send + Sync + 'static) -> Subscription {
        let id = self.shared.next_subscriber.fetch_add(1, Ordering::Relaxed);
        lock(&self.shared.subscribers).push((id, Arc::new(callback)));

        let shared = Arc::downgrade(&self.shared);
        Subscription::new(move || {
            if let Some(shared) = shared.upgrade() {
                lock(&shared.subscribers).retain(|(subscriber, _)| *subscriber != id);
            }
        })
    }

    /// Number of registered callbacks
    pub fn subscriber_count(&self) -> usize {
        lock(&self.shared.subscribers).len()
    }

    /// Create a blocking iterator over future change events
    pub fn watch(&self) -> ChangeIterator {
        let (tx, rx) = mpsc::channel();
        lock(&self.shared.watchers).push(tx);
        ChangeIterator::new(rx)
    }

    fn cell_id(&self) -> usize {
        Arc::as_ptr(&self.shared) as *const () as usize
    }

    fn commit<R>(&self, f: impl FnOnce(&mut S) -> R) -> (R, bool) {
        let cell_id = self.cell_id();
        let reentrant = NotifyGuard::is_active(cell_id);
        debug_assert!(
            !reentrant,
            "state cell '{}' updated from inside one of its own subscribers",
            self.shared.key
        );
        if reentrant {
            let (out, committed) = self.apply(f);
            return (out, committed.is_some());
        }

        let _commit = lock(&self.shared.commit);
        let (out, committed) = self.apply(f);
        let changed = match committed {
            Some((snapshot, revision)) => {
                self.publish(cell_id, &snapshot, revision);
                true
            }
            None => false,
        };
        (out, changed)
    }

    fn apply<R>(&self, f: impl FnOnce(&mut S) -> R) -> (R, Option<(S, u64)>) {
        let mut state = self.shared.state.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = state.value.clone();
        let out = f(&mut next);

        if next == state.value {
            return (out, None);
        }
        state.value = next;
        state.revision += 1;
        (out, Some((state.value.clone(), state.revision)))
    }

    fn publish(&self, cell_id: usize, snapshot: &S, revision: u64) {
        let callbacks: Vec<Callback<S>> = lock(&self.shared.subscribers)
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        {
            let _notifying = NotifyGuard::enter(cell_id);
            for callback in callbacks {
                callback(snapshot);
            }
        }

        let event = ChangeEvent::new(self.shared.key, revision);
        lock(&self.shared.watchers).retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl<S> Clone for StateCell<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S> fmt::Debug for StateCell<S>
where
    S: Clone + PartialEq + Send + Sync + fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("StateCell")
            .field("key", &self.shared.key)
            .field("revision", &state.revision)
            .field("value", &state.value)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[derive(Clone, PartialEq, Debug, Default)]
    struct Feed {
        ids: Vec<i64>,
        unread: u64,
    }

    #[test]
    fn test_set_detects_changes() {
        let cell = StateCell::new("feed", Feed::default());

        assert!(cell.set(Feed { ids: vec![1], unread: 1 }));
        assert!(!cell.set(Feed { ids: vec![1], unread: 1 }));
        assert_eq!(cell.revision(), 1);
        assert_eq!(cell.get().ids, vec![1]);
    }

    #[test]
    fn test_update_returns_closure_result() {
        let cell = StateCell::new("feed", Feed::default());

        let previous = cell.update(|feed| std::mem::replace(&mut feed.unread, 4));
        assert_eq!(previous, 0);
        assert_eq!(cell.read(|feed| feed.unread), 4);
    }

    #[test]
    fn test_noop_update_does_not_notify() {
        let cell = StateCell::new("feed", Feed::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let _subscription = cell.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        cell.update(|feed| feed.unread = 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        cell.update(|feed| feed.unread = 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscribers_see_committed_value() {
        let cell = StateCell::new("feed", Feed::default());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let reader = cell.clone();
        let _subscription = cell.subscribe(move |feed: &Feed| {
            // The value lock is released before fan-out
            assert_eq!(reader.get(), *feed);
            sink.lock().unwrap().push(feed.unread);
        });

        cell.update(|feed| feed.unread = 1);
        cell.update(|feed| feed.unread = 2);

        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let cell = StateCell::new("feed", Feed::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let subscription = cell.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(cell.subscriber_count(), 1);

        drop(subscription);
        assert_eq!(cell.subscriber_count(), 0);

        cell.update(|feed| feed.unread = 9);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_explicit_unsubscribe() {
        let cell = StateCell::new("feed", Feed::default());
        let subscription = cell.subscribe(|_| {});
        subscription.unsubscribe();
        assert_eq!(cell.subscriber_count(), 0);
    }

    #[test]
    fn test_subscription_outliving_cell() {
        let cell = StateCell::new("feed", Feed::default());
        let subscription = cell.subscribe(|_| {});
        drop(cell);
        drop(subscription);
    }

    #[test]
    fn test_watch_receives_revisions() {
        let cell = StateCell::new("feed", Feed::default());
        let changes = cell.watch();

        cell.update(|feed| feed.ids.push(1));
        cell.update(|feed| feed.ids.push(2));

        let revisions: Vec<u64> = changes.try_iter().map(|event| event.revision).collect();
        assert_eq!(revisions, vec![1, 2]);
        assert!(changes.recv_timeout(Duration::from_millis(20)).is_none());
    }

    #[test]
    fn test_dropped_watchers_are_pruned() {
        let cell = StateCell::new("feed", Feed::default());
        drop(cell.watch());
        let live = cell.watch();

        cell.update(|feed| feed.unread = 1);

        assert_eq!(live.try_recv().map(|event| event.key), Some("feed"));
        assert_eq!(lock(&cell.shared.watchers).len(), 1);
    }

    #[test]
    fn test_subscriber_may_update_other_cell() {
        let source = StateCell::new("source", 0u32);
        let mirror = StateCell::new("mirror", 0u32);
        let target = mirror.clone();
        let _subscription = source.subscribe(move |value| {
            target.set(*value * 10);
        });

        source.set(3);
        assert_eq!(mirror.get(), 30);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "updated from inside one of its own subscribers")]
    fn test_reentrant_update_panics_in_debug() {
        let cell = StateCell::new("feed", Feed::default());
        let inner = cell.clone();
        let _subscription = cell.subscribe(move |_| {
            inner.update(|feed| feed.unread += 1);
        });

        cell.update(|feed| feed.unread = 1);
    }

    #[test]
    fn test_concurrent_updates_are_atomic() {
        let cell = StateCell::new("counter", 0u64);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cell = cell.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        cell.update(|value| *value += 1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cell.get(), 800);
        assert_eq!(cell.revision(), 800);
    }
}
