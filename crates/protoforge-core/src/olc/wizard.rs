//! The OLC wizard driver.
//!
//! `OlcWizard` builds the screen for a session's current node, matches user
//! input against that screen's options, falls back to the node's default
//! input handler, and reports what happened as a `Step`. Session state is
//! passed in and out explicitly so front ends decide where it lives (the
//! `SessionRegistry`, a draft store, or both).

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use protoforge_types::config::OlcConfig;
use protoforge_types::error::OlcError;
use protoforge_types::menu::MenuState;
use protoforge_types::object::Caller;
use protoforge_types::prototype::Prototype;

use crate::repository::prototype::PrototypeRepository;
use crate::service::lock::LockChecker;
use crate::service::protfunc::ProtfuncParser;
use crate::service::spawner::Spawner;
use crate::service::typeclass::TypeclassRegistry;

use super::menu::Screen;
use super::session::SessionRegistry;
use super::state::new_menu_state;

/// Shown when input matches no option and the node takes no free text.
pub const NO_MATCH_MESSAGE: &str = "Choose an option or cancel this menu.";

/// Outcome of one round of input.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Messages produced while handling the input, in order.
    pub messages: Vec<String>,
    /// The screen to show next. `None` once the wizard has finished.
    pub screen: Option<Screen>,
    pub finished: bool,
}

/// Menu-driven prototype editor.
///
/// Generic over the persistence and spawning ports; the parser, lock
/// checker and typeclass registry are shared trait objects.
pub struct OlcWizard<R: PrototypeRepository, S: Spawner> {
    pub(super) repo: R,
    pub(super) spawner: S,
    pub(super) parser: Arc<dyn ProtfuncParser>,
    pub(super) locks: Arc<dyn LockChecker>,
    pub(super) typeclasses: Arc<dyn TypeclassRegistry>,
    pub(super) config: OlcConfig,
}

impl<R: PrototypeRepository, S: Spawner> OlcWizard<R, S> {
    pub fn new(
        repo: R,
        spawner: S,
        parser: Arc<dyn ProtfuncParser>,
        locks: Arc<dyn LockChecker>,
        typeclasses: Arc<dyn TypeclassRegistry>,
        config: OlcConfig,
    ) -> Self {
        Self {
            repo,
            spawner,
            parser,
            locks,
            typeclasses,
            config,
        }
    }

    /// Start a session, optionally editing an existing prototype.
    pub fn start(&self, caller: &Caller, prototype: Option<Prototype>) -> MenuState {
        let state = new_menu_state(Uuid::now_v7(), caller, prototype);
        info!(
            session_id = %state.session_id,
            caller = %caller,
            prototype = %state.prototype.key_or_unset(),
            "olc session started"
        );
        state
    }

    /// Start a session on the saved prototype `key`.
    ///
    /// An unknown key starts a new prototype with that key preset. A known
    /// key requires the caller to pass its `edit` lock.
    pub async fn open(&self, caller: &Caller, key: &str) -> Result<MenuState, OlcError> {
        let key = key.trim().to_lowercase();
        match self.repo.find_prototype(&key).await? {
            Some(existing) => {
                let lockstring = existing.prototype_locks.as_deref().unwrap_or("");
                if !self.locks.check(caller, lockstring, "edit") {
                    return Err(OlcError::PermissionDenied(format!(
                        "Prototype '{key}' already exists and you don't have permission to edit it."
                    )));
                }
                Ok(self.start(caller, Some(existing)))
            }
            None => {
                let mut state = self.start(caller, None);
                state.prototype.prototype_key = Some(key);
                Ok(state)
            }
        }
    }

    /// Render the session's current screen.
    pub async fn render(&self, state: &MenuState, caller: &Caller) -> Result<Screen, OlcError> {
        let view = self.build_view(state, caller).await?;
        Ok(Screen::from_view(&view))
    }

    /// Handle one line of user input.
    pub async fn handle_input(
        &self,
        state: &mut MenuState,
        caller: &Caller,
        input: &str,
    ) -> Result<Step, OlcError> {
        let trimmed = input.trim();
        if matches!(trimmed.to_lowercase().as_str(), "q" | "quit") {
            info!(session_id = %state.session_id, "olc session closed");
            return Ok(Step {
                messages: Vec::new(),
                screen: None,
                finished: true,
            });
        }

        let from = state.node;
        let view = self.build_view(state, caller).await?;
        let messages = if let Some(option) = view.find_option(trimmed) {
            self.apply_action(state, caller, option.action.clone()).await?
        } else if let Some(handler) = view.default.clone() {
            self.apply_handler(state, caller, handler, input).await?
        } else {
            vec![NO_MATCH_MESSAGE.to_string()]
        };

        if state.node != from {
            debug!(
                session_id = %state.session_id,
                from = %from,
                to = %state.node,
                "olc node transition"
            );
        }

        let screen = self.render(state, caller).await?;
        Ok(Step {
            messages,
            screen: Some(screen),
            finished: false,
        })
    }

    /// Handle input for a session held in `sessions`.
    ///
    /// The session is removed once the wizard finishes.
    pub async fn handle_session_input(
        &self,
        sessions: &SessionRegistry,
        session_id: Uuid,
        caller: &Caller,
        input: &str,
    ) -> Result<Step, OlcError> {
        let mut state = sessions
            .get(&session_id)
            .ok_or(OlcError::UnknownSession(session_id))?;
        let step = self.handle_input(&mut state, caller, input).await?;
        if step.finished {
            sessions.remove(&session_id);
        } else {
            sessions.insert(state);
        }
        Ok(step)
    }
}
