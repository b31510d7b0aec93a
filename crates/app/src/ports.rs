//! Port definitions — traits that infrastructure implements.
//!
//! The registry depends on these traits rather than on a concrete feed so
//! that it can be exercised on its own.

pub mod change_publisher;

pub use change_publisher::{Change, ChangePublisher};
