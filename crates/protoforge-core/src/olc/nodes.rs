//! Screen builders, one per wizard node.

use protoforge_types::error::{OlcError, SpawnError};
use protoforge_types::menu::{MenuState, NodeId};
use protoforge_types::object::Caller;
use protoforge_types::prototype::{Prototype, PrototypeField};

use crate::repository::prototype::PrototypeRepository;
use crate::service::lock::default_prototype_locks;
use crate::service::spawner::Spawner;

use super::format::{crop, escape_markup, format_option_value, path_cropper, prototype_to_str};
use super::menu::{
    Action, InputHandler, ListKind, MenuOption, NodeView, Processor, list_page, wizard_options,
};
use super::wizard::OlcWizard;

/// Wizard help text paragraphs are separated by a blank line.
fn paragraphs(parts: Vec<String>) -> String {
    parts.join("\n\n")
}

fn field_text(prototype: &Prototype, field: PrototypeField) -> String {
    prototype
        .get_field(field)
        .map(|v| v.to_string())
        .unwrap_or_default()
}

impl<R: PrototypeRepository, S: Spawner> OlcWizard<R, S> {
    /// Build the screen for the session's current node.
    pub(super) async fn build_view(
        &self,
        state: &MenuState,
        caller: &Caller,
    ) -> Result<NodeView, OlcError> {
        let view = match state.node {
            NodeId::Index => self.node_index(state),
            NodeId::ViewPrototype => self.node_view_prototype(state).await?,
            NodeId::PrototypeKey => self.node_prototype_key(state),
            NodeId::PrototypeParent => self.node_prototype_parent(state).await?,
            NodeId::Typeclass => self.node_typeclass(state),
            NodeId::Key => self.node_key(state),
            NodeId::Aliases => self.node_aliases(state),
            NodeId::Attrs => self.node_attrs(state),
            NodeId::Tags => self.node_tags(state),
            NodeId::Locks => self.node_locks(state),
            NodeId::Permissions => self.node_permissions(state),
            NodeId::Location => self.node_location(state, caller),
            NodeId::Home => self.node_home(state),
            NodeId::Destination => self.node_destination(state),
            NodeId::PrototypeDesc => self.node_prototype_desc(state),
            NodeId::PrototypeTags => self.node_prototype_tags(state),
            NodeId::PrototypeLocks => self.node_prototype_locks(state, caller),
            NodeId::PrototypeSave => self.node_prototype_save(state).await?,
            NodeId::PrototypeSpawn => self.node_prototype_spawn(state, caller).await?,
            NodeId::PrototypeLoad => self.node_prototype_load(state).await?,
        };
        Ok(view.finalize())
    }

    /// The prototype rendering plus the validation outcome.
    ///
    /// Returns `true` when validation found an error or warning.
    pub(super) async fn validation_report(
        &self,
        prototype: &Prototype,
    ) -> Result<(bool, String), OlcError> {
        let text = prototype_to_str(prototype);
        let (failed, outcome) = match self.spawner.validate(prototype).await {
            Ok(()) => (
                false,
                "|g No validation errors found.|n (but errors could still happen at spawn-time)"
                    .to_string(),
            ),
            Err(SpawnError::Warning(msg)) => (true, format!("|y{}|n", escape_markup(&msg))),
            Err(SpawnError::Repository(err)) => return Err(err.into()),
            Err(err) => (true, format!("|r{}|n", escape_markup(&err.to_string()))),
        };
        Ok((failed, format!("{text}\n\n{outcome}")))
    }

    fn node_index(&self, state: &MenuState) -> NodeView {
        let proto = &state.prototype;
        let width = self.config.crop_width;
        let mut view = NodeView::new(
            NodeId::Index,
            "|c --- Prototype wizard --- |n\n\n\
             Define the |yproperties|n of the prototype. All prototype values can be \
             over-ridden at the time of spawning an instance of the prototype, but some are \
             required.\n\n'|wprototype-'-properties|n are not used in the prototype itself but \
             are used to organize and list prototypes. The 'prototype-key' uniquely identifies \
             the prototype and allows you to edit an existing prototype or save a new one for \
             use by you or others later.\n\n(make choice; q to abort. If unsure, start from 1.)",
        );

        view.push(MenuOption::numbered(
            format!(
                "|WPrototype-Key|n{}",
                format_option_value(&field_text(proto, PrototypeField::PrototypeKey), true, width, None)
            ),
            Action::Goto(NodeId::PrototypeKey),
        ));

        let base_required = proto.typeclass.is_none() && proto.prototype_parent.is_none();
        let attrs = proto
            .attrs
            .iter()
            .map(|a| a.key.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let tags = proto
            .tags
            .iter()
            .map(|t| t.tag.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let entries: [(&str, String, bool, NodeId); 11] = [
            ("Typeclass", field_text(proto, PrototypeField::Typeclass), base_required, NodeId::Typeclass),
            (
                "Prototype-parent",
                field_text(proto, PrototypeField::PrototypeParent),
                base_required,
                NodeId::PrototypeParent,
            ),
            ("Key", field_text(proto, PrototypeField::Key), false, NodeId::Key),
            ("Aliases", field_text(proto, PrototypeField::Aliases), false, NodeId::Aliases),
            ("Attrs", attrs, false, NodeId::Attrs),
            ("Tags", tags, false, NodeId::Tags),
            ("Locks", field_text(proto, PrototypeField::Locks), false, NodeId::Locks),
            ("Permissions", field_text(proto, PrototypeField::Permissions), false, NodeId::Permissions),
            ("Location", field_text(proto, PrototypeField::Location), false, NodeId::Location),
            ("Home", field_text(proto, PrototypeField::Home), false, NodeId::Home),
            ("Destination", field_text(proto, PrototypeField::Destination), false, NodeId::Destination),
        ];
        for (label, value, required, node) in entries {
            let cropper: Option<fn(&str) -> String> = if node == NodeId::Typeclass {
                Some(path_cropper)
            } else {
                None
            };
            view.push(MenuOption::numbered(
                format!("|w{label}|n{}", format_option_value(&value, required, width, cropper)),
                Action::Goto(node),
            ));
        }

        for (label, field, node) in [
            ("Desc", PrototypeField::PrototypeDesc, NodeId::PrototypeDesc),
            ("Tags", PrototypeField::PrototypeTags, NodeId::PrototypeTags),
            ("Locks", PrototypeField::PrototypeLocks, NodeId::PrototypeLocks),
        ] {
            view.push(MenuOption::numbered(
                format!(
                    "|WPrototype-{label}|n{}",
                    format_option_value(&field_text(proto, field), false, width, None)
                ),
                Action::Goto(node),
            ));
        }

        view.push(MenuOption::new(
            &["save", "s"],
            "|WSave the prototype|n",
            Action::Goto(NodeId::PrototypeSave),
        ));
        view.push(MenuOption::new(
            &["spawn", "sp"],
            "|WSpawn an instance|n",
            Action::Goto(NodeId::PrototypeSpawn),
        ));
        view.push(MenuOption::new(
            &["load", "l"],
            "|WLoad a saved prototype|n",
            Action::Goto(NodeId::PrototypeLoad),
        ));
        view
    }

    async fn node_view_prototype(&self, state: &MenuState) -> Result<NodeView, OlcError> {
        let (_, text) = self.validation_report(&state.prototype).await?;
        let back = state.back.unwrap_or(NodeId::Index);
        let mut view = NodeView::new(NodeId::ViewPrototype, text);
        view.extend(wizard_options(None, Some(back), None));
        Ok(view)
    }

    fn node_prototype_key(&self, state: &MenuState) -> NodeView {
        let mut text = vec![
            "The prototype name, or |wMeta-Key|n, uniquely identifies the prototype. It is \
             used to find and use the prototype to spawn new entities. It is not case sensitive."
                .to_string(),
        ];
        match &state.prototype.prototype_key {
            Some(key) => text.push(format!("Current key is '|w{}|n'", escape_markup(key))),
            None => text.push("The key is currently unset.".to_string()),
        }
        text.push("Enter text or make a choice (q for quit)".to_string());

        let mut view = NodeView::new(NodeId::PrototypeKey, paragraphs(text))
            .with_default(InputHandler::CheckPrototypeKey);
        view.extend(wizard_options(
            Some(NodeId::PrototypeKey),
            Some(NodeId::Index),
            Some(NodeId::PrototypeParent),
        ));
        view
    }

    async fn node_prototype_parent(&self, state: &MenuState) -> Result<NodeView, OlcError> {
        let mut text = vec![
            "Set the prototype's |yParent Prototype|n. If this is unset, Typeclass will be used."
                .to_string(),
        ];
        match &state.prototype.prototype_parent {
            Some(parent_key) => match self.repo.find_prototype(parent_key).await? {
                Some(parent) => text.push(format!(
                    "Current parent prototype is {}:\n{}",
                    escape_markup(parent_key),
                    prototype_to_str(&parent)
                )),
                None => text.push(format!(
                    "Current parent prototype |r{}|n does not appear to exist.",
                    escape_markup(parent_key)
                )),
            },
            None => text.push("Parent prototype is not set".to_string()),
        }

        let own_key = state.prototype.prototype_key.as_deref();
        let entries = self
            .repo
            .list_prototypes()
            .await?
            .into_iter()
            .filter_map(|p| p.prototype_key)
            .filter(|key| Some(key.as_str()) != own_key)
            .map(|key| {
                (
                    escape_markup(&key),
                    Action::Select {
                        list: ListKind::PrototypeParent,
                        value: key,
                    },
                )
            })
            .collect();

        let mut view = NodeView::new(NodeId::PrototypeParent, paragraphs(text))
            .with_default(InputHandler::ExaminePrototype);
        self.push_list(&mut view, entries, state.page);
        view.extend(wizard_options(
            Some(NodeId::PrototypeParent),
            Some(NodeId::PrototypeKey),
            Some(NodeId::Typeclass),
        ));
        Ok(view)
    }

    fn node_typeclass(&self, state: &MenuState) -> NodeView {
        let mut text = vec!["Set the typeclass's parent |yTypeclass|n.".to_string()];
        match &state.prototype.typeclass {
            Some(typeclass) => text.push(format!(
                "Current typeclass is |y{}|n.",
                escape_markup(typeclass)
            )),
            None => text.push(format!(
                "Using default typeclass {}.",
                self.config.base_object_typeclass
            )),
        }

        let entries = self
            .typeclasses
            .all_typeclasses()
            .into_iter()
            .map(|path| {
                (
                    path.clone(),
                    Action::Select {
                        list: ListKind::Typeclass,
                        value: path,
                    },
                )
            })
            .collect();

        let mut view = NodeView::new(NodeId::Typeclass, paragraphs(text))
            .with_default(InputHandler::ExamineTypeclass);
        self.push_list(&mut view, entries, state.page);
        view.extend(wizard_options(
            Some(NodeId::Typeclass),
            Some(NodeId::PrototypeParent),
            Some(NodeId::Key),
        ));
        view
    }

    fn node_key(&self, state: &MenuState) -> NodeView {
        let mut text =
            vec!["Set the prototype's name (|yKey|n.) This will retain case sensitivity.".to_string()];
        match &state.prototype.key {
            Some(key) => text.push(format!("Current key value is '|y{}|n'.", escape_markup(key))),
            None => text.push("Key is currently unset.".to_string()),
        }
        self.property_node(
            NodeId::Key,
            text,
            PrototypeField::Key,
            Processor::Strip,
            NodeId::Typeclass,
            NodeId::Aliases,
        )
    }

    fn node_aliases(&self, state: &MenuState) -> NodeView {
        let mut text = vec![
            "Set the prototype's |yAliases|n. Separate multiple aliases with commas. They'll \
             retain case sensitivity."
                .to_string(),
        ];
        if state.prototype.aliases.is_empty() {
            text.push("No aliases are set.".to_string());
        } else {
            text.push(format!(
                "Current aliases are '|y{}|n'.",
                escape_markup(&state.prototype.aliases.join(", "))
            ));
        }
        self.property_node(
            NodeId::Aliases,
            text,
            PrototypeField::Aliases,
            Processor::CommaList,
            NodeId::Key,
            NodeId::Attrs,
        )
    }

    fn node_attrs(&self, state: &MenuState) -> NodeView {
        let mut text = vec![
            "Set the prototype's |yAttributes|n. Enter attributes on one of these forms:\n \
             attrname=value\n attrname;category=value\n attrname;category;lockstring=value\n\
             To give an attribute without a category but with a lockstring, leave that spot \
             empty (attrname;;lockstring=value). Entering an existing name replaces it; enter \
             'del attrname' to remove one."
                .to_string(),
        ];
        if state.prototype.attrs.is_empty() {
            text.push("No attrs are set.".to_string());
        } else {
            text.push("Select an attribute to examine it.".to_string());
        }

        let width = self.config.crop_width;
        let entries = state
            .prototype
            .attrs
            .iter()
            .map(|attr| {
                (
                    format!(
                        "{} = {}",
                        escape_markup(&attr.key),
                        escape_markup(&crop(&attr.value, width))
                    ),
                    Action::Select {
                        list: ListKind::Attr,
                        value: attr.key.clone(),
                    },
                )
            })
            .collect();

        let mut view =
            NodeView::new(NodeId::Attrs, paragraphs(text)).with_default(InputHandler::AddAttr);
        self.push_list(&mut view, entries, state.page);
        view.extend(wizard_options(
            Some(NodeId::Attrs),
            Some(NodeId::Aliases),
            Some(NodeId::Tags),
        ));
        view
    }

    fn node_tags(&self, state: &MenuState) -> NodeView {
        let text = "Set the prototype's |yTags|n. Enter tags on one of the following forms:\n \
                    tag\n tag;category\n tag;category;data\n\
                    Note that 'data' is not commonly used. Enter 'del tag' to remove a tag.";

        let entries = state
            .prototype
            .tags
            .iter()
            .map(|tag| {
                let desc = match &tag.category {
                    Some(category) => format!("{};{}", tag.tag, category),
                    None => tag.tag.clone(),
                };
                (
                    escape_markup(&desc),
                    Action::Select {
                        list: ListKind::Tag,
                        value: tag.tag.clone(),
                    },
                )
            })
            .collect();

        let mut view = NodeView::new(NodeId::Tags, text).with_default(InputHandler::AddTag);
        self.push_list(&mut view, entries, state.page);
        view.extend(wizard_options(
            Some(NodeId::Tags),
            Some(NodeId::Attrs),
            Some(NodeId::Locks),
        ));
        view
    }

    fn node_locks(&self, state: &MenuState) -> NodeView {
        let mut text = vec![
            "Set the prototype's |yLock string|n. Separate multiple locks with semi-colons. \
             Will retain case sensitivity."
                .to_string(),
        ];
        match &state.prototype.locks {
            Some(locks) => text.push(format!("Current locks are '|y{}|n'.", escape_markup(locks))),
            None => text.push("No locks are set.".to_string()),
        }
        self.property_node(
            NodeId::Locks,
            text,
            PrototypeField::Locks,
            Processor::LockString,
            NodeId::Tags,
            NodeId::Permissions,
        )
    }

    fn node_permissions(&self, state: &MenuState) -> NodeView {
        let mut text = vec![
            "Set the prototype's |yPermissions|n. Separate multiple permissions with commas. \
             Will retain case sensitivity."
                .to_string(),
        ];
        if state.prototype.permissions.is_empty() {
            text.push("No permissions are set.".to_string());
        } else {
            text.push(format!(
                "Current permissions are '|y{}|n'.",
                escape_markup(&state.prototype.permissions.join(", "))
            ));
        }
        self.property_node(
            NodeId::Permissions,
            text,
            PrototypeField::Permissions,
            Processor::CommaList,
            NodeId::Locks,
            NodeId::Location,
        )
    }

    fn node_location(&self, state: &MenuState, caller: &Caller) -> NodeView {
        let mut text = vec!["Set the prototype's |yLocation|n".to_string()];
        match &state.prototype.location {
            Some(location) => text.push(format!(
                "Current location is |y{}|n.",
                escape_markup(location)
            )),
            None => text.push(format!("Default location is {caller}'s inventory.")),
        }
        self.property_node(
            NodeId::Location,
            text,
            PrototypeField::Location,
            Processor::Strip,
            NodeId::Permissions,
            NodeId::Home,
        )
    }

    fn node_home(&self, state: &MenuState) -> NodeView {
        let mut text = vec!["Set the prototype's |yHome location|n".to_string()];
        match &state.prototype.home {
            Some(home) => text.push(format!(
                "Current home location is |y{}|n.",
                escape_markup(home)
            )),
            None => text.push(format!(
                "Default home location (|y{}|n) used.",
                self.config.default_home
            )),
        }
        self.property_node(
            NodeId::Home,
            text,
            PrototypeField::Home,
            Processor::Strip,
            NodeId::Location,
            NodeId::Destination,
        )
    }

    fn node_destination(&self, state: &MenuState) -> NodeView {
        let mut text = vec![
            "Set the prototype's |yDestination|n. This is usually only used for Exits."
                .to_string(),
        ];
        match &state.prototype.destination {
            Some(dest) => text.push(format!(
                "Current destination is |y{}|n.",
                escape_markup(dest)
            )),
            None => text.push("No destination is set (default).".to_string()),
        }
        self.property_node(
            NodeId::Destination,
            text,
            PrototypeField::Destination,
            Processor::Strip,
            NodeId::Home,
            NodeId::PrototypeDesc,
        )
    }

    fn node_prototype_desc(&self, state: &MenuState) -> NodeView {
        let mut text = vec![
            "The |wPrototype-Description|n briefly describes the prototype for viewing in \
             listings."
                .to_string(),
        ];
        match &state.prototype.prototype_desc {
            Some(desc) => text.push(format!(
                "The current meta desc is:\n\"|w{}|n\"",
                escape_markup(desc)
            )),
            None => text.push("Description is currently unset.".to_string()),
        }
        self.property_node(
            NodeId::PrototypeDesc,
            text,
            PrototypeField::PrototypeDesc,
            Processor::Strip,
            NodeId::Destination,
            NodeId::PrototypeTags,
        )
    }

    fn node_prototype_tags(&self, state: &MenuState) -> NodeView {
        let mut text = vec![
            "|wPrototype-Tags|n can be used to classify and find prototypes. Tags are \
             case-insensitive. Separate multiple tags by commas."
                .to_string(),
        ];
        if state.prototype.prototype_tags.is_empty() {
            text.push("No tags are currently set.".to_string());
        } else {
            text.push(format!(
                "The current tags are:\n|w{}|n",
                escape_markup(&state.prototype.prototype_tags.join(", "))
            ));
        }
        self.property_node(
            NodeId::PrototypeTags,
            text,
            PrototypeField::PrototypeTags,
            Processor::LowercaseCommaList,
            NodeId::PrototypeDesc,
            NodeId::PrototypeLocks,
        )
    }

    fn node_prototype_locks(&self, state: &MenuState, caller: &Caller) -> NodeView {
        let mut text = vec![
            "Set |wPrototype-Locks|n on the prototype. There are two valid lock types: 'edit' \
             (who can edit the prototype) and 'spawn' (who can spawn new objects with this \
             prototype)\n(If you are unsure, leave as default.)"
                .to_string(),
        ];
        match &state.prototype.prototype_locks {
            Some(locks) => text.push(format!("Current lock is |w'{}'|n", escape_markup(locks))),
            None => text.push(format!(
                "Lock unset - if not changed the default lockstring will be set as\n   |w'{}'|n",
                default_prototype_locks(caller)
            )),
        }
        self.property_node(
            NodeId::PrototypeLocks,
            text,
            PrototypeField::PrototypeLocks,
            Processor::LowercaseLockString,
            NodeId::PrototypeTags,
            NodeId::Index,
        )
    }

    async fn node_prototype_save(&self, state: &MenuState) -> Result<NodeView, OlcError> {
        let (failed, report) = self.validation_report(&state.prototype).await?;
        let mut text = vec![report];

        if failed {
            text.push(
                "Validation errors were found. They need to be corrected before this prototype \
                 can be saved (or used to spawn)."
                    .to_string(),
            );
            let mut view = NodeView::new(NodeId::PrototypeSave, text.join("\n"));
            view.extend(wizard_options(
                Some(NodeId::PrototypeSave),
                Some(NodeId::PrototypeLocks),
                Some(NodeId::Index),
            ));
            return Ok(view);
        }

        let key = state.prototype.key_or_unset();
        if self.repo.find_prototype(key).await?.is_some() {
            text.push(format!(
                "Do you want to save/overwrite the existing prototype '{}'?",
                escape_markup(key)
            ));
        } else {
            text.push(format!(
                "Do you want to save the prototype as '{}'?",
                escape_markup(key)
            ));
        }

        let mut view = NodeView::new(NodeId::PrototypeSave, text.join("\n"))
            .with_default(InputHandler::SaveConfirmed);
        view.push(MenuOption::new(&["yes", "y"], "Save the prototype", Action::SaveConfirmed));
        view.push(MenuOption::new(
            &["no", "n"],
            "Continue without saving",
            Action::Goto(NodeId::PrototypeSpawn),
        ));
        Ok(view)
    }

    async fn node_prototype_spawn(
        &self,
        state: &MenuState,
        caller: &Caller,
    ) -> Result<NodeView, OlcError> {
        let (failed, report) = self.validation_report(&state.prototype).await?;

        if failed {
            let text = format!(
                "{report}\n|rPrototype validation failed. Correct the errors before spawning.|n"
            );
            let mut view = NodeView::new(NodeId::PrototypeSpawn, text);
            view.extend(wizard_options(
                Some(NodeId::PrototypeSpawn),
                Some(NodeId::PrototypeSave),
                Some(NodeId::Index),
            ));
            return Ok(view);
        }

        let mut view = NodeView::new(NodeId::PrototypeSpawn, report);
        let location = state.prototype.location.as_deref();
        if let Some(location) = location {
            view.push(MenuOption::numbered(
                format!(
                    "Spawn in prototype's defined location ({})",
                    escape_markup(location)
                ),
                Action::Spawn { location: None },
            ));
        }
        if let Some(caller_location) = caller.location.as_deref()
            && Some(caller_location) != location
        {
            view.push(MenuOption::numbered(
                format!("Spawn in {caller}'s location ({caller_location})"),
                Action::Spawn {
                    location: Some(caller_location.to_string()),
                },
            ));
        }
        let inventory = caller.dbref();
        let at_caller = location.is_some() && location == caller.location.as_deref();
        if !at_caller && location != Some(inventory.as_str()) {
            view.push(MenuOption::numbered(
                format!("Spawn in {caller}'s inventory"),
                Action::Spawn {
                    location: Some(inventory),
                },
            ));
        }

        let spawned = self
            .spawner
            .objects_with_prototype(state.prototype.key_or_unset())
            .await?;
        if !spawned.is_empty() {
            view.push(MenuOption::numbered(
                format!(
                    "Update {} existing objects with this prototype",
                    spawned.len()
                ),
                Action::UpdateSpawned,
            ));
        }

        view.extend(wizard_options(
            Some(NodeId::PrototypeSpawn),
            Some(NodeId::PrototypeSave),
            Some(NodeId::Index),
        ));
        Ok(view)
    }

    async fn node_prototype_load(&self, state: &MenuState) -> Result<NodeView, OlcError> {
        let text = "Select a prototype to load. This will replace any currently edited prototype.";
        let entries = self
            .repo
            .list_prototypes()
            .await?
            .into_iter()
            .filter_map(|p| p.prototype_key)
            .map(|key| {
                (
                    escape_markup(&key),
                    Action::Select {
                        list: ListKind::Load,
                        value: key,
                    },
                )
            })
            .collect();

        let mut view =
            NodeView::new(NodeId::PrototypeLoad, text).with_default(InputHandler::ExaminePrototype);
        self.push_list(&mut view, entries, state.page);
        view.extend(wizard_options(
            Some(NodeId::PrototypeLoad),
            Some(NodeId::PrototypeSave),
            Some(NodeId::Index),
        ));
        Ok(view)
    }

    /// A node that sets one field from free text, then moves forward.
    fn property_node(
        &self,
        node: NodeId,
        text: Vec<String>,
        field: PrototypeField,
        processor: Processor,
        back: NodeId,
        forward: NodeId,
    ) -> NodeView {
        let mut view = NodeView::new(node, paragraphs(text)).with_default(InputHandler::SetProperty {
            field,
            processor,
            next: forward,
        });
        view.extend(wizard_options(Some(node), Some(back), Some(forward)));
        view
    }

    fn push_list(&self, view: &mut NodeView, entries: Vec<(String, Action)>, page: usize) {
        let (options, _) = list_page(entries, page, self.config.list_page_size);
        view.extend(options);
    }
}

