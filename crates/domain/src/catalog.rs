//! The static device list loaded at startup.
//!
//! The catalog format itself is owned by the loader (see `vshomed`); this
//! module only describes its shape and turns it into validated [`Device`]s.

use std::collections::HashSet;

use serde::Deserialize;

use crate::device::{Device, DeviceKind, StatePatch};
use crate::error::CatalogError;

/// Raw catalog as deserialized from disk.
#[derive(Debug, Default, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub devices: Vec<CatalogEntry>,
}

/// One device declaration. Every field is optional at the parsing stage so
/// that a missing field is reported as a [`CatalogError`] rather than an
/// opaque parse failure.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogEntry {
    pub id: Option<String>,
    pub name: Option<String>,
    pub kind: Option<DeviceKind>,
    pub room: Option<String>,
    #[serde(default)]
    pub state: StatePatch,
}

impl Catalog {
    /// Validate every entry and build the devices, in catalog order.
    ///
    /// Either every device loads or none does.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NoDevices`] for an empty catalog,
    /// [`CatalogError::MissingField`] when an entry lacks its id, name or
    /// kind, and [`CatalogError::DuplicateId`] when two entries share an id.
    pub fn into_devices(self) -> Result<Vec<Device>, CatalogError> {
        if self.devices.is_empty() {
            return Err(CatalogError::NoDevices);
        }

        let mut seen = HashSet::with_capacity(self.devices.len());
        let mut devices = Vec::with_capacity(self.devices.len());
        for (index, entry) in self.devices.into_iter().enumerate() {
            let device = entry.into_device(index)?;
            if !seen.insert(device.id.clone()) {
                return Err(CatalogError::DuplicateId(device.id));
            }
            devices.push(device);
        }
        Ok(devices)
    }
}

impl CatalogEntry {
    fn into_device(self, index: usize) -> Result<Device, CatalogError> {
        let mut builder = Device::builder().index(index).state(self.state);
        if let Some(id) = self.id {
            builder = builder.id(id);
        }
        if let Some(name) = self.name {
            builder = builder.name(name);
        }
        if let Some(kind) = self.kind {
            builder = builder.kind(kind);
        }
        if let Some(room) = self.room {
            builder = builder.room(room);
        }
        builder.build()
    }
}
