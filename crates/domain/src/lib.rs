//! # vshome-domain
//!
//! Pure domain model for the vshome virtual smart home.
//!
//! ## Responsibilities
//! - Foundational types: identifiers and the workspace error conventions
//! - Define **Devices** (simulated appliances with a kind and a state map)
//! - Define the **normalization policy** that keeps every state value inside
//!   the domain of its kind
//! - Validate the startup **catalog**
//! - Define the **wire messages** exchanged with real-time viewers
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.

pub mod error;
pub mod id;

pub mod catalog;
pub mod device;
pub mod message;
