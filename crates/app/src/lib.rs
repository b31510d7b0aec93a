//! # vshome-app
//!
//! Application layer — the device registry, the change feed and the viewer
//! hub, plus the **port** the registry publishes commits through.
//!
//! ## Responsibilities
//! - `DeviceRegistry` — the single point of mutation for device state;
//!   serves independent snapshots and serializes writes per device
//! - `ChangeFeed` — in-process bounded broadcast of committed changes
//! - `Hub` — viewer membership, initial snapshots, inbound requests and
//!   per-viewer delivery of committed changes
//!
//! ## Dependency rule
//! Depends on `vshome-domain` only (plus `tokio::sync` for locks and
//! channels). Never imports adapter crates.

pub mod change_feed;
pub mod hub;
pub mod ports;
pub mod registry;
