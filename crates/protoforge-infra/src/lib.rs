//! Infrastructure layer for Protoforge.
//!
//! Implements the ports defined in `protoforge-core`: SQLite storage for
//! prototypes, spawned objects and wizard drafts, the spawner, the
//! inline-function parser, the lock-string evaluator, and the config-backed
//! typeclass registry. Also loads `config.toml`.

pub mod config;
pub mod lock;
pub mod olc;
pub mod protfunc;
pub mod spawner;
pub mod sqlite;
pub mod typeclass;
