//! Prototype OLC wizard.
//!
//! Defines the session-state lifecycle (`MenuStateExt`), the menu model and
//! option formatting, the per-screen node builders, the input handlers, and
//! the `OlcWizard` driver that ties them to the collaborator traits. Also
//! holds the draft persistence trait and the in-process session registry.

pub mod draft_store;
pub mod format;
mod handlers;
pub mod menu;
mod nodes;
pub mod session;
pub mod state;
pub mod wizard;

#[cfg(test)]
mod testing;
