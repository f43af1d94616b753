//! MenuState lifecycle logic.
//!
//! The `MenuState` struct lives in `protoforge-types`; this module provides
//! an extension trait (`MenuStateExt`) with lifecycle methods: moving between
//! screens, paging list screens, and replacing or editing the prototype.

use chrono::Utc;
use uuid::Uuid;

use protoforge_types::menu::{MenuState, NodeId};
use protoforge_types::object::Caller;
use protoforge_types::prototype::{FieldValue, Prototype, PrototypeField};

/// Create a `MenuState` for a fresh wizard session.
///
/// Starts on the index screen. A session started from an existing prototype
/// is not new.
pub fn new_menu_state(session_id: Uuid, caller: &Caller, prototype: Option<Prototype>) -> MenuState {
    let now = Utc::now();
    MenuState {
        session_id,
        caller_id: caller.id,
        is_new: prototype.is_none(),
        prototype: prototype.unwrap_or_default(),
        node: NodeId::Index,
        back: None,
        page: 0,
        created_at: now,
        updated_at: now,
    }
}

/// Extension trait for `MenuState` lifecycle management.
pub trait MenuStateExt {
    /// Move to another screen, resetting list paging.
    fn goto(&mut self, node: NodeId);

    /// Open the view/validate screen, returning to `back` afterwards.
    fn view(&mut self, back: NodeId);

    /// Replace the edited prototype with a saved one.
    fn load_prototype(&mut self, prototype: Prototype);

    /// Write one prototype field. Returns `false` for an empty value.
    fn set_field(&mut self, field: PrototypeField, value: FieldValue) -> bool;

    fn next_page(&mut self);

    fn previous_page(&mut self);

    /// One-line description for draft listings.
    fn summary(&self) -> String;

    fn touch(&mut self);
}

impl MenuStateExt for MenuState {
    fn goto(&mut self, node: NodeId) {
        self.node = node;
        self.page = 0;
        self.touch();
    }

    fn view(&mut self, back: NodeId) {
        self.back = Some(back);
        self.goto(NodeId::ViewPrototype);
    }

    fn load_prototype(&mut self, prototype: Prototype) {
        self.prototype = prototype;
        self.is_new = false;
        self.touch();
    }

    fn set_field(&mut self, field: PrototypeField, value: FieldValue) -> bool {
        let changed = self.prototype.set_field(field, value);
        if changed {
            self.touch();
        }
        changed
    }

    fn next_page(&mut self) {
        self.page += 1;
    }

    fn previous_page(&mut self) {
        self.page = self.page.saturating_sub(1);
    }

    fn summary(&self) -> String {
        format!(
            "{} -- {} screen",
            self.prototype.key_or_unset(),
            self.node.label()
        )
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
