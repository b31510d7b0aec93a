//! Synchronization hub. Keeps every connected viewer in step with the
//! registry.
//!
//! Commits flow registry → [`ChangeFeed`] → one [`Subscription`] per
//! viewer. The registry never waits on viewers: the feed is a bounded ring
//! and a viewer that falls too far behind gets a lag error on its next
//! receive, after which its transport is expected to disconnect it.
//!
//! A viewer joining mid-stream subscribes *before* it takes its snapshot,
//! then skips any queued change whose revision the snapshot already
//! reflects. It therefore sees each commit exactly once: either folded
//! into the snapshot or as an `update`, never both and never neither.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex, broadcast, oneshot};

use vshome_domain::device::{Device, StatePatch};
use vshome_domain::error::{CatalogError, InvalidRequestError, TransportError, VsHomeError};
use vshome_domain::id::{DeviceId, ViewerId};
use vshome_domain::message::{ServerMessage, SetRequest};

use crate::change_feed::ChangeFeed;
use crate::ports::Change;
use crate::registry::DeviceRegistry;

/// The registry as wired by the hub.
pub type Registry = DeviceRegistry<Arc<ChangeFeed>>;

/// Fan-out point between the registry and all viewers.
pub struct Hub {
    registry: Registry,
    feed: Arc<ChangeFeed>,
    viewers: Mutex<HashMap<ViewerId, oneshot::Sender<()>>>,
}

impl Hub {
    /// Build the registry from `devices` and wire it to a change feed of
    /// `feed_capacity` entries.
    ///
    /// # Errors
    ///
    /// Returns [`VsHomeError::Configuration`] when `devices` is empty or does
    /// not form a valid registry (see [`DeviceRegistry::new`]).
    ///
    /// # Panics
    ///
    /// Panics if `feed_capacity` is zero.
    pub fn new(devices: Vec<Device>, feed_capacity: usize) -> Result<Self, VsHomeError> {
        let feed = Arc::new(ChangeFeed::new(feed_capacity));
        let registry = DeviceRegistry::new(devices, Arc::clone(&feed))?;
        if registry.is_empty() {
            return Err(CatalogError::NoDevices.into());
        }
        tracing::debug!(devices = registry.len(), feed_capacity, "hub ready");
        Ok(Self {
            registry,
            feed,
            viewers: Mutex::new(HashMap::new()),
        })
    }

    /// The registry backing this hub. Writes made through it are broadcast
    /// like any other.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Register a new viewer.
    ///
    /// The returned [`Viewer`] carries the full snapshot to send first and
    /// the subscription yielding every change committed after it.
    pub async fn connect(&self) -> Viewer {
        let receiver = self.feed.subscribe();
        let snapshot = self.registry.snapshot().await;

        let id = ViewerId::new();
        let (close_tx, close_rx) = oneshot::channel();
        let count = {
            let mut viewers = self.viewers.lock().await;
            viewers.insert(id, close_tx);
            viewers.len()
        };
        tracing::info!(
            viewer_id = %id,
            viewers = count,
            subscribers = self.feed.subscriber_count(),
            "viewer connected"
        );

        let seen = snapshot
            .iter()
            .map(|change| (change.device.id.clone(), change.revision))
            .collect();
        Viewer {
            id,
            snapshot: snapshot.into_iter().map(|change| change.device).collect(),
            updates: Subscription { receiver, seen },
            closed: close_rx,
        }
    }

    /// Remove a viewer and signal its connection to close.
    ///
    /// Idempotent; returns whether the viewer was still registered.
    pub async fn disconnect(&self, id: ViewerId) -> bool {
        let (removed, count) = {
            let mut viewers = self.viewers.lock().await;
            (viewers.remove(&id), viewers.len())
        };
        match removed {
            Some(close_tx) => {
                // The connection may already be gone.
                let _ = close_tx.send(());
                tracing::info!(viewer_id = %id, viewers = count, "viewer disconnected");
                true
            }
            None => false,
        }
    }

    /// Signal every registered viewer to close. Used on shutdown.
    pub async fn disconnect_all(&self) -> usize {
        let drained: Vec<_> = self.viewers.lock().await.drain().collect();
        let count = drained.len();
        for (_, close_tx) in drained {
            let _ = close_tx.send(());
        }
        tracing::info!(viewers = count, "all viewers disconnected");
        count
    }

    /// Number of registered viewers.
    pub async fn viewer_count(&self) -> usize {
        self.viewers.lock().await.len()
    }

    /// Apply a partial state to a device and broadcast the result.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRequestError::EmptyState`] for an empty patch and
    /// [`VsHomeError::NotFound`] for an unknown device. Nothing is
    /// broadcast on error.
    #[tracing::instrument(skip(self, patch))]
    pub async fn submit(&self, id: &DeviceId, patch: StatePatch) -> Result<Device, VsHomeError> {
        if patch.is_empty() {
            return Err(InvalidRequestError::EmptyState.into());
        }
        self.registry.update(id, patch).await
    }

    /// Push a device's current state to every viewer that has not seen it.
    ///
    /// Commits are broadcast on their own; this re-sends the committed state
    /// with the revision the registry holds for it, so it can never hide or
    /// reorder a real commit.
    ///
    /// # Errors
    ///
    /// Returns [`VsHomeError::NotFound`] for an unknown device.
    pub async fn broadcast(&self, id: &DeviceId) -> Result<Device, VsHomeError> {
        self.registry.republish(id).await
    }

    /// Handle one inbound text frame from a viewer.
    ///
    /// Returns the error reply meant for that viewer alone, or `None` when
    /// the request was applied (the viewer then receives the resulting
    /// `update` like everyone else).
    pub async fn handle_message(&self, text: &str) -> Option<ServerMessage> {
        let result = match SetRequest::parse(text) {
            Ok(request) => self.submit(&request.id, request.state).await.map(drop),
            Err(err) => Err(err.into()),
        };
        result.err().map(|err| {
            tracing::debug!(error = %err, "viewer request rejected");
            ServerMessage::error(&err)
        })
    }
}

/// A registered viewer, handed to its transport by [`Hub::connect`].
pub struct Viewer {
    pub id: ViewerId,
    /// Every device as of registration, in catalog order.
    pub snapshot: Vec<Device>,
    pub updates: Subscription,
    /// Resolves once the hub drops this viewer.
    pub closed: oneshot::Receiver<()>,
}

impl Viewer {
    /// The `state` message that must open the conversation.
    #[must_use]
    pub fn take_snapshot(&mut self) -> ServerMessage {
        ServerMessage::State {
            devices: std::mem::take(&mut self.snapshot),
        }
    }
}

/// A viewer's cursor into the change feed.
pub struct Subscription {
    receiver: broadcast::Receiver<Change>,
    seen: HashMap<DeviceId, u64>,
}

impl Subscription {
    /// Wait for the next change this viewer has not seen yet.
    ///
    /// Cancel safe.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Lagged`] when the viewer fell behind the
    /// feed and missed changes, and [`TransportError::Closed`] when the
    /// feed shut down.
    pub async fn recv(&mut self) -> Result<Device, TransportError> {
        loop {
            let change = match self.receiver.recv().await {
                Ok(change) => change,
                Err(RecvError::Lagged(skipped)) => return Err(TransportError::Lagged { skipped }),
                Err(RecvError::Closed) => return Err(TransportError::Closed),
            };
            let seen = self.seen.entry(change.device.id.clone()).or_default();
            if change.revision <= *seen {
                continue;
            }
            *seen = change.revision;
            return Ok(change.device);
        }
    }
}
