//! Repository trait definitions (ports) for persistence.
//!
//! These traits are implemented by `protoforge-infra` (e.g., SQLite).
//! The core crate never depends on any specific storage implementation.

pub mod prototype;
