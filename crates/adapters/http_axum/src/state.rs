//! Shared application state for axum handlers.

use std::sync::Arc;
use std::time::Duration;

use vshome_app::hub::Hub;

/// Application state shared across all axum handlers.
///
/// Cloning is cheap: the hub sits behind an `Arc` and the limits are plain
/// values.
#[derive(Clone)]
pub struct AppState {
    /// The synchronization hub, which also owns the registry.
    pub hub: Arc<Hub>,
    /// Per-connection limits applied to every viewer socket.
    pub limits: ViewerLimits,
}

impl AppState {
    /// Create a new application state with default viewer limits.
    pub fn new(hub: Hub) -> Self {
        Self::from_arc(Arc::new(hub))
    }

    /// Create a new application state from a hub that is already shared.
    pub fn from_arc(hub: Arc<Hub>) -> Self {
        Self {
            hub,
            limits: ViewerLimits::default(),
        }
    }

    /// Replace the viewer limits.
    #[must_use]
    pub fn with_limits(mut self, limits: ViewerLimits) -> Self {
        self.limits = limits;
        self
    }
}

/// Timeouts and size caps for a single viewer connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerLimits {
    /// Drop the viewer when nothing (not even a pong) arrives for this long.
    pub idle_timeout: Duration,
    /// Interval between keep-alive pings.
    pub ping_interval: Duration,
    /// Upper bound on a single outbound write.
    pub write_timeout: Duration,
    /// Largest inbound frame accepted, in bytes.
    pub max_message_bytes: usize,
}

impl Default for ViewerLimits {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(300),
            ping_interval: Duration::from_secs(30),
            write_timeout: Duration::from_secs(10),
            max_message_bytes: 4096,
        }
    }
}
