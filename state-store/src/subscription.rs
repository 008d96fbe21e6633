//! Unsubscribe handles

use std::fmt;

/// Handle returned by `StateCell::subscribe`
///
/// The callback stays registered for as long as the handle lives. Dropping
/// the handle, or calling [`Subscription::unsubscribe`], removes it.
///
/// ```rust,ignore
/// let _subscription = cell.subscribe(|feed| render(feed));
/// // callback runs on every committed change until `_subscription` drops
/// ```
#[must_use = "dropping a Subscription immediately unsubscribes the callback"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub(crate) fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Remove the callback now
    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
