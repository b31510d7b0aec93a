//! Change publisher port — hands committed device changes to fan-out.

use vshome_domain::device::Device;

/// A committed device state, stamped with its per-device revision.
///
/// Revisions start at 0 for the catalog state and grow by one on every
/// commit, so for a given device a higher revision is always newer.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub device: Device,
    pub revision: u64,
}

/// Receives every commit made by the registry.
///
/// `publish` is called while the device's write lock is held, which is
/// what keeps publication order equal to commit order for each device.
/// Implementations must therefore return immediately and never wait on
/// consumers.
pub trait ChangePublisher {
    /// Publish a committed change to all current subscribers.
    fn publish(&self, change: Change);
}

impl<T: ChangePublisher> ChangePublisher for std::sync::Arc<T> {
    fn publish(&self, change: Change) {
        (**self).publish(change);
    }
}
