//! Collaborator traits the wizard calls into: inline-function parsing,
//! access checks, typeclass lookup, and spawning.

pub mod lock;
pub mod protfunc;
pub mod spawner;
pub mod typeclass;
