//! Device — one simulated appliance and its current state.

mod kind;
pub mod normalize;
mod value;

pub use kind::DeviceKind;
pub use value::{DeviceState, StatePatch, StateValue};

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, VsHomeError};
use crate::id::DeviceId;

/// A simulated appliance.
///
/// `id` and `kind` are fixed once the device is built. Only `state` changes
/// at runtime, and only through [`Device::apply`], which normalizes every
/// incoming value for the device's kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub kind: DeviceKind,
    pub room: String,
    pub state: DeviceState,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::MissingField`] when `id` or `name` is blank.
    pub fn validate(&self) -> Result<(), VsHomeError> {
        self.check_fields(0).map_err(VsHomeError::from)
    }

    fn check_fields(&self, index: usize) -> Result<(), CatalogError> {
        if self.id.is_empty() {
            return Err(CatalogError::MissingField { index, field: "id" });
        }
        if self.name.trim().is_empty() {
            return Err(CatalogError::MissingField {
                index,
                field: "name",
            });
        }
        Ok(())
    }

    /// Merge a partial state into this device, normalizing each value.
    ///
    /// Keys absent from `patch` keep their current value.
    pub fn apply(&mut self, patch: StatePatch) {
        for (key, value) in patch {
            let value = normalize::normalize(self.kind, &key, value);
            self.state.insert(key, value);
        }
    }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    index: usize,
    id: Option<DeviceId>,
    name: Option<String>,
    kind: Option<DeviceKind>,
    room: Option<String>,
    state: StatePatch,
}

impl DeviceBuilder {
    /// Position of the device in its catalog, used in error reports.
    #[must_use]
    pub fn index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    #[must_use]
    pub fn id(mut self, id: impl Into<DeviceId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: DeviceKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn room(mut self, room: impl Into<String>) -> Self {
        self.room = Some(room.into());
        self
    }

    /// Set one initial state attribute.
    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<StateValue>) -> Self {
        self.state.insert(key.into(), value.into());
        self
    }

    /// Set the whole initial state.
    #[must_use]
    pub fn state(mut self, state: StatePatch) -> Self {
        self.state = state;
        self
    }

    /// Consume the builder, validate, and return a [`Device`].
    ///
    /// The initial state goes through the same normalization as runtime
    /// updates.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::MissingField`] if `id`, `name` or `kind` is
    /// missing or blank.
    pub fn build(self) -> Result<Device, CatalogError> {
        let index = self.index;
        let kind = self
            .kind
            .ok_or(CatalogError::MissingField { index, field: "kind" })?;
        let mut device = Device {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            kind,
            room: self.room.unwrap_or_default(),
            state: DeviceState::new(),
        };
        device.check_fields(index)?;
        device.apply(self.state);
        Ok(device)
    }
}
