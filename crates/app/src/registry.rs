//! Device registry: the authoritative, concurrently shared device store.
//!
//! The set of devices is fixed at construction; only their state changes.
//! Each device sits behind its own async read/write lock, so writes to one
//! device serialize while writes to different devices never contend.
//! Every read hands out an independent copy.

use std::collections::HashMap;

use tokio::sync::RwLock;

use vshome_domain::device::{Device, StatePatch};
use vshome_domain::error::{CatalogError, NotFoundError, VsHomeError};
use vshome_domain::id::DeviceId;

use crate::ports::{Change, ChangePublisher};

struct Slot {
    device: Device,
    revision: u64,
}

/// Owner of all device state.
pub struct DeviceRegistry<P> {
    order: Vec<DeviceId>,
    slots: HashMap<DeviceId, RwLock<Slot>>,
    publisher: P,
}

impl<P: ChangePublisher> DeviceRegistry<P> {
    /// Build the registry from the catalog devices, preserving their order.
    ///
    /// # Errors
    ///
    /// Returns [`VsHomeError::Configuration`] when a device is missing its
    /// id or name, or when two devices share an id. Nothing is loaded in
    /// that case.
    pub fn new(devices: Vec<Device>, publisher: P) -> Result<Self, VsHomeError> {
        let mut order = Vec::with_capacity(devices.len());
        let mut slots = HashMap::with_capacity(devices.len());
        for device in devices {
            device.validate()?;
            if slots.contains_key(&device.id) {
                return Err(CatalogError::DuplicateId(device.id).into());
            }
            order.push(device.id.clone());
            slots.insert(
                device.id.clone(),
                RwLock::new(Slot {
                    device,
                    revision: 0,
                }),
            );
        }
        Ok(Self {
            order,
            slots,
            publisher,
        })
    }

    /// Number of devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the registry holds no device at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Copies of every device, in catalog order.
    pub async fn list(&self) -> Vec<Device> {
        self.snapshot()
            .await
            .into_iter()
            .map(|change| change.device)
            .collect()
    }

    /// Copies of every device with the revision each copy reflects, in
    /// catalog order.
    pub async fn snapshot(&self) -> Vec<Change> {
        let mut changes = Vec::with_capacity(self.order.len());
        for id in &self.order {
            if let Some(slot) = self.slots.get(id) {
                let slot = slot.read().await;
                changes.push(Change {
                    device: slot.device.clone(),
                    revision: slot.revision,
                });
            }
        }
        changes
    }

    /// Copy of one device.
    ///
    /// # Errors
    ///
    /// Returns [`VsHomeError::NotFound`] when no device has this `id`.
    pub async fn get(&self, id: &DeviceId) -> Result<Device, VsHomeError> {
        let slot = self.slot(id)?.read().await;
        Ok(slot.device.clone())
    }

    /// Merge `patch` into the device's state, normalizing each value for
    /// the device's kind, and return a copy of the result.
    ///
    /// The commit is handed to the publisher before the device's lock is
    /// released, so concurrent writers to the same device publish in the
    /// order they committed.
    ///
    /// # Errors
    ///
    /// Returns [`VsHomeError::NotFound`] when no device has this `id`;
    /// nothing is published in that case.
    #[tracing::instrument(skip(self, patch), fields(keys = patch.len()))]
    pub async fn update(&self, id: &DeviceId, patch: StatePatch) -> Result<Device, VsHomeError> {
        let mut slot = self.slot(id)?.write().await;
        slot.device.apply(patch);
        slot.revision += 1;

        let device = slot.device.clone();
        let revision = slot.revision;
        self.publisher.publish(Change {
            device: device.clone(),
            revision,
        });
        drop(slot);

        tracing::debug!(revision, "device state committed");
        Ok(device)
    }

    /// Publish the device's current state again, stamped with the revision
    /// it was committed at.
    ///
    /// Viewers that already saw this revision ignore it. The read lock
    /// keeps it from interleaving with a concurrent commit.
    ///
    /// # Errors
    ///
    /// Returns [`VsHomeError::NotFound`] when no device has this `id`.
    pub async fn republish(&self, id: &DeviceId) -> Result<Device, VsHomeError> {
        let slot = self.slot(id)?.read().await;
        let device = slot.device.clone();
        self.publisher.publish(Change {
            device: device.clone(),
            revision: slot.revision,
        });
        Ok(device)
    }

    fn slot(&self, id: &DeviceId) -> Result<&RwLock<Slot>, VsHomeError> {
        self.slots
            .get(id)
            .ok_or_else(|| NotFoundError::device(id).into())
    }
}
