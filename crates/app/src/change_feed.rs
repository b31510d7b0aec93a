//! In-process change feed backed by a tokio broadcast channel.

use tokio::sync::broadcast;

use crate::ports::{Change, ChangePublisher};

/// Bounded fan-out queue between registry commits and viewers.
///
/// Publishing never blocks and succeeds even when there are no subscribers
/// (the change is simply dropped). Each subscriber has its own cursor into
/// a ring of `capacity` entries; a subscriber that falls more than
/// `capacity` changes behind observes a lag on its next receive.
pub struct ChangeFeed {
    sender: broadcast::Sender<Change>,
}

impl ChangeFeed {
    /// Create a new feed with the given ring capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to changes on this feed.
    ///
    /// Returns a receiver that will get all changes published *after* the
    /// subscription is created.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Change> {
        self.sender.subscribe()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl ChangePublisher for ChangeFeed {
    fn publish(&self, change: Change) {
        // send fails only when there are zero receivers.
        if self.sender.send(change).is_err() {
            tracing::trace!("change published with no subscribers");
        }
    }
}
