//! What happens when an option is chosen or free text is entered.
//!
//! Handlers mutate the session state and return the messages to show the
//! caller. Failures the user can fix (bad input, failed spawn) become
//! messages; storage failures propagate as `OlcError`.

use tracing::{info, warn};

use protoforge_types::error::OlcError;
use protoforge_types::menu::{MenuState, NodeId};
use protoforge_types::object::Caller;
use protoforge_types::prototype::{AttrSpec, FieldValue, PrototypeField, TagSpec};

use crate::repository::prototype::PrototypeRepository;
use crate::service::lock::default_prototype_locks;
use crate::service::protfunc::json_type_name;
use crate::service::spawner::Spawner;
use crate::service::typeclass::first_paragraph;

use super::format::{display_attribute, display_tag, escape_markup, prototype_to_str};
use super::menu::{Action, InputHandler, ListKind, Processor};
use super::state::MenuStateExt;
use super::wizard::OlcWizard;

const ATTR_FORMAT_ERROR: &str =
    "Attribute must be given as 'attrname[;category;locks] = <value>'.";
const TAG_FORMAT_ERROR: &str = "Tag must be given as 'tag[;category;data]'.";

fn split_list(raw: &str, lowercase: bool) -> FieldValue {
    FieldValue::List(
        raw.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                if lowercase {
                    part.to_lowercase()
                } else {
                    part.to_string()
                }
            })
            .collect(),
    )
}

/// Render a parsed JSON value the way the wizard echoes it.
fn json_display(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl<R: PrototypeRepository, S: Spawner> OlcWizard<R, S> {
    pub(super) async fn apply_action(
        &self,
        state: &mut MenuState,
        caller: &Caller,
        action: Action,
    ) -> Result<Vec<String>, OlcError> {
        match action {
            Action::Goto(node) => {
                state.goto(node);
                Ok(Vec::new())
            }
            Action::View { back } => {
                state.view(back);
                Ok(Vec::new())
            }
            Action::PreviousPage => {
                state.previous_page();
                Ok(Vec::new())
            }
            Action::NextPage => {
                state.next_page();
                Ok(Vec::new())
            }
            Action::Select { list, value } => self.select(state, list, &value).await,
            Action::SaveConfirmed => self.save(state, caller).await,
            Action::Spawn { location } => Ok(self.spawn(state, caller, location.as_deref()).await),
            Action::UpdateSpawned => Ok(self.update_spawned(state).await),
        }
    }

    pub(super) async fn apply_handler(
        &self,
        state: &mut MenuState,
        caller: &Caller,
        handler: InputHandler,
        raw: &str,
    ) -> Result<Vec<String>, OlcError> {
        match handler {
            InputHandler::CheckPrototypeKey => self.check_prototype_key(state, caller, raw).await,
            InputHandler::SetProperty {
                field,
                processor,
                next,
            } => Ok(self.set_property(state, raw, field, processor, next)),
            InputHandler::ExaminePrototype => self.examine_prototype(raw.trim()).await,
            InputHandler::ExamineTypeclass => Ok(vec![self.examine_typeclass(raw.trim())]),
            InputHandler::AddAttr => Ok(vec![self.add_attr(state, raw)]),
            InputHandler::AddTag => Ok(vec![add_tag(state, raw)]),
            InputHandler::SaveConfirmed => self.save(state, caller).await,
        }
    }

    /// Process `raw`, write it to `field` and move to `next`.
    ///
    /// Empty processed input moves on without touching the prototype; a
    /// processor error keeps the session on the current node.
    pub(super) fn set_property(
        &self,
        state: &mut MenuState,
        raw: &str,
        field: PrototypeField,
        processor: Processor,
        next: NodeId,
    ) -> Vec<String> {
        let value = match self.process(processor, raw) {
            Ok(value) => value,
            Err(err) => {
                return vec![format!(
                    "Could not set {} to {} ({})",
                    field.display_name(),
                    escape_markup(raw),
                    escape_markup(&err)
                )];
            }
        };

        if !state.set_field(field, value.clone()) {
            state.goto(next);
            return Vec::new();
        }

        let shown = value.to_json();
        let mut out = vec![format!(
            " Set {} to {} ({}).",
            field,
            escape_markup(&shown.to_string()),
            value.type_name()
        )];

        if self.config.test_parse {
            out.push(" Simulating prototype-func parsing ...".to_string());
            let parsed = self
                .parser
                .parse_field(&value, Some(&state.prototype), true);
            if let Some(warning) = parsed.warning {
                out.push(format!(
                    " |yLiteral parse warning: {}|n",
                    escape_markup(&warning)
                ));
            }
            if parsed.value != shown {
                out.push(format!(
                    " |g(Example-)value when parsed ({}):|n {}",
                    json_type_name(&parsed.value),
                    escape_markup(&json_display(&parsed.value))
                ));
            } else {
                out.push(" |gNo change when parsed.|n".to_string());
            }
        }

        state.goto(next);
        vec![out.join("\n")]
    }

    fn process(&self, processor: Processor, raw: &str) -> Result<FieldValue, String> {
        match processor {
            Processor::Verbatim => Ok(FieldValue::Text(raw.to_string())),
            Processor::Strip => Ok(FieldValue::Text(raw.trim().to_string())),
            Processor::CommaList => Ok(split_list(raw, false)),
            Processor::LowercaseCommaList => Ok(split_list(raw, true)),
            Processor::LockString | Processor::LowercaseLockString => {
                let mut lockstring = raw.trim().to_string();
                if processor == Processor::LowercaseLockString {
                    lockstring = lockstring.to_lowercase();
                }
                if !lockstring.is_empty() {
                    self.locks.validate(&lockstring)?;
                }
                Ok(FieldValue::Text(lockstring))
            }
        }
    }

    async fn check_prototype_key(
        &self,
        state: &mut MenuState,
        caller: &Caller,
        raw: &str,
    ) -> Result<Vec<String>, OlcError> {
        let key = raw.trim().to_lowercase();
        if !key.is_empty()
            && let Some(existing) = self.repo.find_prototype(&key).await?
        {
            let lockstring = existing.prototype_locks.as_deref().unwrap_or("");
            if !self.locks.check(caller, lockstring, "edit") {
                state.goto(NodeId::PrototypeKey);
                return Ok(vec![format!(
                    "Prototype '{}' already exists and you don't have permission to edit it.",
                    escape_markup(&key)
                )]);
            }
            if state.is_new {
                state.load_prototype(existing);
                state.goto(NodeId::Index);
                return Ok(vec!["Prototype already exists. Reloading.".to_string()]);
            }
        }
        Ok(self.set_property(
            state,
            &key,
            PrototypeField::PrototypeKey,
            Processor::Verbatim,
            NodeId::PrototypeParent,
        ))
    }

    async fn select(
        &self,
        state: &mut MenuState,
        list: ListKind,
        value: &str,
    ) -> Result<Vec<String>, OlcError> {
        match list {
            ListKind::PrototypeParent => {
                let mut out = self.set_property(
                    state,
                    value,
                    PrototypeField::PrototypeParent,
                    Processor::Verbatim,
                    NodeId::Key,
                );
                out.push(format!(
                    "Selected prototype |y{}|n. Removed any set typeclass parent.",
                    escape_markup(value)
                ));
                Ok(out)
            }
            ListKind::Typeclass => {
                let mut out = self.set_property(
                    state,
                    value,
                    PrototypeField::Typeclass,
                    Processor::Verbatim,
                    NodeId::Key,
                );
                out.push(format!(
                    "Selected typeclass |y{}|n. Removed any set prototype parent.",
                    escape_markup(value)
                ));
                Ok(out)
            }
            ListKind::Load => match self.repo.find_prototype(value).await? {
                Some(prototype) => {
                    state.load_prototype(prototype);
                    state.goto(NodeId::Index);
                    Ok(vec![format!(
                        "|gLoaded prototype '{}'.|n",
                        escape_markup(value)
                    )])
                }
                None => Ok(vec![format!(
                    "|rFailed to load prototype '{}'.|n",
                    escape_markup(value)
                )]),
            },
            ListKind::Attr => Ok(state
                .prototype
                .attrs
                .iter()
                .find(|a| a.key == value)
                .map(|attr| escape_markup(&display_attribute(attr, self.parser.as_ref())))
                .into_iter()
                .collect()),
            ListKind::Tag => Ok(state
                .prototype
                .tags
                .iter()
                .find(|t| t.tag == value)
                .map(|tag| escape_markup(&display_tag(tag)))
                .into_iter()
                .collect()),
        }
    }

    async fn examine_prototype(&self, key: &str) -> Result<Vec<String>, OlcError> {
        Ok(vec![match self.repo.find_prototype(key).await? {
            Some(prototype) => prototype_to_str(&prototype),
            None => "Prototype not registered.".to_string(),
        }])
    }

    fn examine_typeclass(&self, path: &str) -> String {
        match self.typeclasses.docstring(path) {
            Some(doc) => format!(
                "Typeclass |y{}|n; First paragraph of docstring:\n\n{}",
                escape_markup(path),
                escape_markup(&first_paragraph(&doc))
            ),
            None => format!("Typeclass |y{}|n is not registered.", escape_markup(path)),
        }
    }

    /// Add or replace an attribute from `name[;category[;locks]] = value`,
    /// or remove one with `del name`.
    fn add_attr(&self, state: &mut MenuState, raw: &str) -> String {
        let Some((name, value)) = raw.split_once('=') else {
            if let Some(name) = raw.trim().strip_prefix("del ") {
                let name = name.trim().to_lowercase();
                return if state.prototype.remove_attr(&name) {
                    state.touch();
                    format!("Removed attribute '{}'.", escape_markup(&name))
                } else {
                    format!("No attribute '{}' to remove.", escape_markup(&name))
                };
            }
            return ATTR_FORMAT_ERROR.to_string();
        };

        let name = name.trim().to_lowercase();
        let mut parts = name.splitn(3, ';');
        let key = parts.next().unwrap_or_default().trim().to_string();
        if key.is_empty() {
            return ATTR_FORMAT_ERROR.to_string();
        }
        let category = parts
            .next()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        let locks = parts.next().unwrap_or_default().trim().to_string();

        let attr = AttrSpec {
            key,
            value: value.trim().to_string(),
            category,
            locks,
        };
        let shown = display_attribute(&attr, self.parser.as_ref());
        let replaced = state.prototype.upsert_attr(attr);
        state.touch();
        let verb = if replaced { "Edited" } else { "Added" };
        escape_markup(&format!("{verb} {shown}"))
    }

    async fn save(&self, state: &mut MenuState, caller: &Caller) -> Result<Vec<String>, OlcError> {
        if state.prototype.prototype_locks.is_none() {
            state.prototype.prototype_locks = Some(default_prototype_locks(caller));
        }
        let saved = self.repo.save_prototype(&state.prototype).await?;
        info!(
            prototype = %saved.key_or_unset(),
            caller = %caller,
            "prototype saved"
        );
        state.load_prototype(saved);
        state.goto(NodeId::PrototypeSpawn);
        Ok(vec!["|gPrototype saved.|n".to_string()])
    }

    async fn spawn(&self, state: &MenuState, caller: &Caller, location: Option<&str>) -> Vec<String> {
        match self.spawner.spawn(&state.prototype, location).await {
            Ok(obj) => {
                info!(
                    prototype = %state.prototype.key_or_unset(),
                    object = %obj.dbref(),
                    caller = %caller,
                    "object spawned"
                );
                vec![format!(
                    "|gNew instance|n {} ({}) |gspawned.|n",
                    escape_markup(&obj.key),
                    obj.dbref()
                )]
            }
            Err(err) => {
                warn!(prototype = %state.prototype.key_or_unset(), error = %err, "spawn failed");
                vec![format!("|rError: {}|n", escape_markup(&err.to_string()))]
            }
        }
    }

    async fn update_spawned(&self, state: &MenuState) -> Vec<String> {
        match self
            .spawner
            .update_objects_with_prototype(&state.prototype)
            .await
        {
            Ok(count) => {
                info!(prototype = %state.prototype.key_or_unset(), count, "spawned objects updated");
                vec![format!("|g{count} objects were updated successfully.|n")]
            }
            Err(err) => {
                warn!(prototype = %state.prototype.key_or_unset(), error = %err, "update failed");
                vec![format!("|rError: {}|n", escape_markup(&err.to_string()))]
            }
        }
    }
}

/// Add or replace a tag from `tag[;category[;data]]`, or remove one with
/// `del tag`.
fn add_tag(state: &mut MenuState, raw: &str) -> String {
    let input = raw.trim().to_lowercase();
    if let Some(tag) = input.strip_prefix("del ") {
        let tag = tag.trim();
        return if state.prototype.remove_tag(tag) {
            state.touch();
            format!("Removed tag '{}'.", escape_markup(tag))
        } else {
            format!("No tag '{}' to remove.", escape_markup(tag))
        };
    }

    let mut parts = input.splitn(3, ';');
    let tag = parts.next().unwrap_or_default().trim().to_string();
    if tag.is_empty() {
        return TAG_FORMAT_ERROR.to_string();
    }
    let category = parts
        .next()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);
    let data = parts.next().unwrap_or_default().trim().to_string();

    let spec = TagSpec {
        tag,
        category,
        data,
    };
    let shown = display_tag(&spec);
    let replaced = state.prototype.upsert_tag(spec);
    state.touch();
    let verb = if replaced { "Edited" } else { "Added" };
    escape_markup(&format!("{verb} {shown}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list_trims_and_lowercases() {
        assert_eq!(
            split_list(" A, b ,C", true),
            FieldValue::List(vec!["a".to_string(), "b".to_string(), "c".to_string()])
        );
        assert!(split_list("", false).is_empty());
    }

    #[test]
    fn test_split_list_drops_empty_entries() {
        assert_eq!(
            split_list("a, ,b,", false),
            FieldValue::List(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(split_list(" , ", false), FieldValue::List(Vec::new()));
    }

    #[test]
    fn test_json_display_unquotes_strings() {
        assert_eq!(json_display(&serde_json::json!("lamp")), "lamp");
        assert_eq!(json_display(&serde_json::json!([1, 2])), "[1,2]");
    }
}
