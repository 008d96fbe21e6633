//! Change events delivered over a channel, for threads outside the runtime

use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::time::Duration;

use crate::event::ChangeEvent;

/// Receiving end of `StateCell::watch()`
///
/// Every watcher has its own channel and sees every committed change of
/// its cell in revision order. Iteration ends once the cell is dropped.
///
/// ```rust,ignore
/// let changes = session_cell.watch();
/// std::thread::spawn(move || {
///     for change in changes {
///         redraw(change.revision);
///     }
/// });
/// ```
pub struct ChangeIterator {
    rx: mpsc::Receiver<ChangeEvent>,
}

impl ChangeIterator {
    pub(crate) fn new(rx: mpsc::Receiver<ChangeEvent>) -> Self {
        Self { rx }
    }

    /// Wait for the next change; `None` once the cell is gone
    pub fn recv(&self) -> Option<ChangeEvent> {
        self.rx.recv().ok()
    }

    /// Wait at most `timeout` for the next change
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ChangeEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Next queued change, if any
    pub fn try_recv(&self) -> Option<ChangeEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Drain the queued changes without waiting
    pub fn try_iter(&self) -> impl Iterator<Item = ChangeEvent> + '_ {
        std::iter::from_fn(move || self.try_recv())
    }

    /// Yield changes until none arrives for `timeout`
    pub fn timeout_iter(&self, timeout: Duration) -> impl Iterator<Item = ChangeEvent> + '_ {
        std::iter::from_fn(move || self.recv_timeout(timeout))
    }

    /// Drain the queue and keep only the newest change
    ///
    /// Useful for a redraw loop that only cares that something changed.
    pub fn latest(&self) -> Option<ChangeEvent> {
        self.try_iter().last()
    }
}

impl Iterator for ChangeIterator {
    type Item = ChangeEvent;

    fn next(&mut self) -> Option<ChangeEvent> {
        self.recv()
    }
}
