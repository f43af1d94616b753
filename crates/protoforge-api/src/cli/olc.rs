//! Interactive prototype wizard (`pforge olc`).
//!
//! Shows each wizard screen, reads a line of input with dialoguer and feeds
//! it to the wizard. The session is auto-saved as a draft after every step so
//! it can be resumed with `pforge olc --resume`.

use anyhow::{Context, Result, bail};
use console::style;
use dialoguer::{Input, Select};

use protoforge_core::olc::draft_store::{DRAFT_SCHEMA_VERSION, OlcDraftStore};
use protoforge_core::olc::menu::Screen;
use protoforge_core::olc::state::MenuStateExt;
use protoforge_core::repository::prototype::PrototypeRepository;
use protoforge_infra::olc::sqlite_draft_store::draft_from_state;
use protoforge_types::error::OlcError;
use protoforge_types::menu::MenuState;
use protoforge_types::object::Caller;
use protoforge_types::prototype::Prototype;

use super::markup;
use crate::state::AppState;

/// Entry point for `pforge olc`.
pub async fn run_olc(
    state: &AppState,
    caller: &Caller,
    key: Option<String>,
    resume: bool,
) -> Result<()> {
    let menu_state = if resume {
        match pick_draft(state, caller).await? {
            Some(menu_state) => menu_state,
            None => return Ok(()),
        }
    } else if let Some(key) = key {
        match state.wizard.open(caller, &key).await {
            Ok(menu_state) => menu_state,
            Err(OlcError::PermissionDenied(message)) => {
                println!();
                println!("  {} {}", style("✗").red().bold(), message);
                println!();
                return Ok(());
            }
            Err(err) => return Err(err).context("Failed to open prototype"),
        }
    } else {
        state.wizard.start(caller, None)
    };

    run_menu_loop(state, caller, menu_state).await
}

/// Let the caller choose one of their drafts. `None` if there are none.
async fn pick_draft(state: &AppState, caller: &Caller) -> Result<Option<MenuState>> {
    let drafts = state
        .drafts
        .list_drafts(caller.id)
        .await
        .context("Failed to list wizard drafts")?;

    if drafts.is_empty() {
        println!();
        println!(
            "  No saved drafts found. Start a new session with: {}",
            style("pforge olc").yellow()
        );
        println!();
        return Ok(None);
    }

    let items: Vec<String> = drafts
        .iter()
        .map(|d| {
            let key = if d.prototype_key.is_empty() {
                "<unset>"
            } else {
                d.prototype_key.as_str()
            };
            format!(
                "{key} -- {} screen, updated {}",
                d.node,
                d.updated_at.format("%Y-%m-%d %H:%M")
            )
        })
        .collect();

    println!();
    println!("  {} Saved wizard sessions:", style("*").cyan().bold());
    println!();

    let selection = Select::new().items(&items).default(0).interact()?;

    let draft = state
        .drafts
        .load_draft(&drafts[selection].session_id)
        .await
        .context("Failed to load draft")?
        .context("Draft not found")?;

    if draft.schema_version > DRAFT_SCHEMA_VERSION {
        bail!(
            "Draft was written by a newer version (schema {}), this build reads up to {}",
            draft.schema_version,
            DRAFT_SCHEMA_VERSION
        );
    }

    let menu_state: MenuState =
        serde_json::from_str(&draft.state_json).context("Failed to deserialize wizard state")?;

    println!();
    println!(
        "  {} Resuming: {}",
        style("*").cyan().bold(),
        style(menu_state.summary()).yellow()
    );

    Ok(Some(menu_state))
}

fn print_screen(screen: &Screen) {
    println!();
    println!("{}", markup::render(&screen.to_string()));
    println!();
}

async fn autosave(state: &AppState, menu_state: &MenuState) {
    let result = match draft_from_state(menu_state) {
        Ok(draft) => state.drafts.save_draft(draft).await,
        Err(err) => Err(err),
    };
    if let Err(err) = result {
        tracing::warn!(session_id = %menu_state.session_id, "failed to auto-save draft: {err}");
    }
}

/// Drive one session until the caller quits.
async fn run_menu_loop(state: &AppState, caller: &Caller, menu_state: MenuState) -> Result<()> {
    let session_id = menu_state.session_id;
    let screen = state
        .wizard
        .render(&menu_state, caller)
        .await
        .context("Failed to render wizard screen")?;

    let mut last = menu_state.clone();
    state.sessions.insert(menu_state);
    print_screen(&screen);

    loop {
        let input: String = Input::new()
            .with_prompt(">")
            .allow_empty(true)
            .interact_text()?;

        let step = state
            .wizard
            .handle_session_input(&state.sessions, session_id, caller, &input)
            .await
            .context("Wizard failed to process input")?;

        for message in &step.messages {
            println!("{}", markup::render(message));
        }
        if step.finished {
            break;
        }
        if let Some(screen) = &step.screen {
            print_screen(screen);
        }

        if let Some(current) = state.sessions.get(&session_id) {
            autosave(state, &current).await;
            last = current;
        }
    }

    finish(state, &last).await
}

/// Drop the draft when nothing is left unsaved, otherwise keep it and say
/// how to resume.
async fn finish(state: &AppState, last: &MenuState) -> Result<()> {
    let unsaved = if last.prototype == Prototype::default() {
        false
    } else {
        match last.prototype.prototype_key.as_deref() {
            Some(key) => {
                let stored = state
                    .prototypes
                    .find_prototype(key)
                    .await
                    .context("Failed to look up prototype")?;
                stored.as_ref() != Some(&last.prototype)
            }
            None => true,
        }
    };

    if unsaved {
        autosave(state, last).await;
        println!();
        println!(
            "  {} Unsaved changes kept as a draft. Resume with: {}",
            style("i").blue().bold(),
            style("pforge olc --resume").yellow()
        );
        println!();
    } else {
        state
            .drafts
            .delete_draft(&last.session_id)
            .await
            .context("Failed to delete draft")?;
        println!("Exited the prototype wizard.");
    }
    Ok(())
}
