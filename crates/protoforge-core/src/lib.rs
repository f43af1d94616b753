//! Wizard logic and collaborator trait definitions for Protoforge.
//!
//! This crate defines the "ports" (repository and service traits) that the
//! infrastructure layer implements, plus the prototype OLC wizard built on
//! top of them. It depends only on `protoforge-types` -- never on
//! `protoforge-infra` or any database/IO crate.

pub mod olc;
pub mod repository;
pub mod service;
