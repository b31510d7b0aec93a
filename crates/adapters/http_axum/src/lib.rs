//! # vshome-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a **JSON REST API** over the device registry
//!   (`/api/devices`, `/api/devices/{id}`)
//! - Serve the **real-time viewer channel** at `/ws`: one WebSocket per
//!   viewer, opened with a full `state` snapshot and followed by `update`
//!   messages for every committed change
//! - Serve the static front-end assets from a configurable directory
//! - Map application results into HTTP responses and wire messages
//!
//! ## Dependency rule
//! Depends on `vshome-app` (for the hub and registry) and `vshome-domain`
//! (for the types used in request/response mapping). Never leaks axum types
//! into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
pub mod ws;
