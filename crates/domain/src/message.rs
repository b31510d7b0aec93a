//! Wire messages exchanged with real-time viewers.
//!
//! Outbound: `state` (full snapshot, once per connection), `update` (one
//! committed change) and `error` (reply to a failed request, sent only to
//! the requester). Inbound: `set`.

use serde::{Deserialize, Serialize};

use crate::device::{Device, StatePatch};
use crate::error::InvalidRequestError;
use crate::id::DeviceId;

/// A message sent to a viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    State { devices: Vec<Device> },
    Update { device: Device },
    Error { error: String },
}

impl ServerMessage {
    /// Build an error reply from any displayable error.
    #[must_use]
    pub fn error(err: &impl std::fmt::Display) -> Self {
        Self::Error {
            error: err.to_string(),
        }
    }
}

/// A validated mutation request from a viewer.
#[derive(Debug, Clone, PartialEq)]
pub struct SetRequest {
    pub id: DeviceId,
    pub state: StatePatch,
}

/// Loose shape of any inbound frame; checked by [`SetRequest::parse`].
#[derive(Deserialize)]
struct Inbound {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    id: String,
    #[serde(default)]
    state: StatePatch,
}

impl SetRequest {
    /// Parse one inbound text frame.
    ///
    /// # Errors
    ///
    /// - [`InvalidRequestError::MalformedMessage`] when the frame is not a
    ///   JSON object of the expected shape.
    /// - [`InvalidRequestError::UnsupportedMessageType`] when `type` is
    ///   anything but `"set"`.
    /// - [`InvalidRequestError::MissingDeviceId`] when `id` is absent or
    ///   blank.
    pub fn parse(text: &str) -> Result<Self, InvalidRequestError> {
        let inbound: Inbound =
            serde_json::from_str(text).map_err(|_| InvalidRequestError::MalformedMessage)?;
        if inbound.kind != "set" {
            return Err(InvalidRequestError::UnsupportedMessageType);
        }
        let id = DeviceId::from(inbound.id);
        if id.is_empty() {
            return Err(InvalidRequestError::MissingDeviceId);
        }
        Ok(Self {
            id,
            state: inbound.state,
        })
    }
}
