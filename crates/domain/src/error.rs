//! Common error types used across the workspace.
//!
//! Each failure kind has its own typed error; [`VsHomeError`] aggregates
//! them through `#[from]` conversions so every layer can use `?`.

use crate::id::DeviceId;

/// Top-level error shared by the registry, the hub and the adapters.
#[derive(Debug, thiserror::Error)]
pub enum VsHomeError {
    /// The caller sent something the system cannot act on.
    #[error(transparent)]
    InvalidRequest(#[from] InvalidRequestError),

    /// The referenced device does not exist.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// The device catalog could not be loaded. Fatal at startup.
    #[error(transparent)]
    Configuration(#[from] CatalogError),

    /// A viewer connection broke. Local to that viewer.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// A malformed or unsupported mutation request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidRequestError {
    #[error("missing state")]
    EmptyState,

    #[error("missing device id")]
    MissingDeviceId,

    #[error("unsupported message type")]
    UnsupportedMessageType,

    #[error("invalid message")]
    MalformedMessage,

    #[error("invalid json")]
    MalformedBody,
}

/// Lookup of an unknown identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} not found: {id}")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

impl NotFoundError {
    /// Build the error for an unknown device.
    #[must_use]
    pub fn device(id: &DeviceId) -> Self {
        Self {
            entity: "device",
            id: id.to_string(),
        }
    }
}

/// Problems found while loading the device catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("no devices defined")]
    NoDevices,

    #[error("device #{index} is missing its {field}")]
    MissingField { index: usize, field: &'static str },

    #[error("duplicate device id: {0}")]
    DuplicateId(DeviceId),

    #[error("failed to read catalog {path}")]
    Unreadable {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to parse catalog {path}")]
    Malformed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Failures on a single viewer connection.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The viewer fell behind the change feed and missed notifications.
    #[error("viewer lagged behind by {skipped} notifications")]
    Lagged { skipped: u64 },

    /// The change feed shut down.
    #[error("change feed closed")]
    Closed,

    #[error("viewer idle for too long")]
    IdleTimeout,

    #[error("timed out writing to viewer")]
    WriteTimeout,

    #[error("failed to encode message")]
    Encode(#[from] serde_json::Error),

    #[error("socket error")]
    Socket(#[source] Box<dyn std::error::Error + Send + Sync>),
}
