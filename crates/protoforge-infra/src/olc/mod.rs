//! Wizard infrastructure: draft persistence.

pub mod sqlite_draft_store;
