//! Observable state cells
//!
//! Holds the state a user interface renders from. A [`StateCell`] commits
//! whole-value updates, skips no-op writes, and tells two kinds of
//! observers about each commit:
//!
//! - subscribers, called synchronously on the committing thread with the
//!   new value; dropping the returned [`Subscription`] unsubscribes
//! - watchers, each a [`ChangeIterator`] receiving a [`ChangeEvent`] per
//!   commit, for consumers on their own thread
//!
//! ```rust
//! use state_store::StateCell;
//!
//! #[derive(Clone, PartialEq, Debug, Default)]
//! struct Badge {
//!     unread: u64,
//! }
//!
//! let badge = StateCell::new("badge", Badge::default());
//! let changes = badge.watch();
//! let _subscription = badge.subscribe(|badge| println!("{} unread", badge.unread));
//!
//! badge.update(|badge| badge.unread = 3);
//! badge.update(|badge| badge.unread = 3);
//!
//! assert_eq!(badge.get(), Badge { unread: 3 });
//! assert_eq!(changes.try_iter().count(), 1);
//! ```

pub mod cell;
pub mod event;
pub mod iter;
pub mod subscription;

pub use cell::StateCell;
pub use event::ChangeEvent;
pub use iter::ChangeIterator;
pub use subscription::Subscription;
