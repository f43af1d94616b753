//! Shared domain types for Protoforge.
//!
//! This crate contains the core domain types used across the Protoforge
//! workspace: prototypes and their editable fields, callers and spawned
//! objects, wizard session state, configuration, and error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod error;
pub mod menu;
pub mod object;
pub mod prototype;
