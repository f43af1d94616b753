//! In-process registry of active wizard sessions.
//!
//! Backed by `DashMap` so concurrent front ends can look up and update
//! sessions without a global lock.

use dashmap::DashMap;
use uuid::Uuid;

use protoforge_types::menu::MenuState;

use super::state::MenuStateExt;

/// Active wizard sessions keyed by session ID.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<Uuid, MenuState>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a session.
    pub fn insert(&self, state: MenuState) {
        self.sessions.insert(state.session_id, state);
    }

    /// A snapshot of the session's state.
    pub fn get(&self, session_id: &Uuid) -> Option<MenuState> {
        self.sessions.get(session_id).map(|entry| entry.value().clone())
    }

    /// Mutate a session in place. Returns `None` if it does not exist.
    pub fn update<T>(&self, session_id: &Uuid, f: impl FnOnce(&mut MenuState) -> T) -> Option<T> {
        self.sessions.get_mut(session_id).map(|mut entry| {
            let out = f(entry.value_mut());
            entry.value_mut().touch();
            out
        })
    }

    /// End a session, returning its final state.
    pub fn remove(&self, session_id: &Uuid) -> Option<MenuState> {
        self.sessions.remove(session_id).map(|(_, state)| state)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protoforge_types::menu::NodeId;
    use protoforge_types::object::Caller;

    use crate::olc::state::new_menu_state;

    fn state(caller_id: i64) -> MenuState {
        new_menu_state(Uuid::now_v7(), &Caller::new(caller_id, "someone"), None)
    }

    #[test]
    fn test_insert_get_remove() {
        let registry = SessionRegistry::new();
        let s = state(1);
        let id = s.session_id;
        registry.insert(s);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&id).unwrap().caller_id, 1);

        let removed = registry.remove(&id).unwrap();
        assert_eq!(removed.session_id, id);
        assert!(registry.is_empty());
        assert!(registry.get(&id).is_none());
    }

    #[test]
    fn test_update_mutates_in_place() {
        let registry = SessionRegistry::new();
        let s = state(1);
        let id = s.session_id;
        registry.insert(s);

        let node = registry.update(&id, |state| {
            state.goto(NodeId::Tags);
            state.node
        });
        assert_eq!(node, Some(NodeId::Tags));
        assert_eq!(registry.get(&id).unwrap().node, NodeId::Tags);
        assert!(registry.update(&Uuid::now_v7(), |_| ()).is_none());
    }
}
