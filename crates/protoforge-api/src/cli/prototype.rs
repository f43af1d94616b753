//! Non-interactive prototype commands: list, show, delete, spawn.

use anyhow::{Context, Result, bail};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;

use protoforge_core::olc::format::{crop, path_cropper, prototype_to_str};
use protoforge_core::repository::prototype::PrototypeRepository;
use protoforge_core::service::spawner::Spawner;
use protoforge_types::object::Caller;
use protoforge_types::prototype::Prototype;

use super::markup;
use crate::state::AppState;

async fn find(state: &AppState, key: &str) -> Result<Prototype> {
    state
        .prototypes
        .find_prototype(key)
        .await
        .context("Failed to look up prototype")?
        .with_context(|| format!("Prototype '{key}' not found"))
}

fn based_on(prototype: &Prototype) -> String {
    match (&prototype.prototype_parent, &prototype.typeclass) {
        (Some(parent), _) => format!("<- {parent}"),
        (None, Some(typeclass)) => path_cropper(typeclass),
        (None, None) => "-".to_string(),
    }
}

/// List saved prototypes in a table.
pub async fn list_prototypes(state: &AppState, json: bool) -> Result<()> {
    let prototypes = state
        .prototypes
        .list_prototypes()
        .await
        .context("Failed to list prototypes")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&prototypes)?);
        return Ok(());
    }

    if prototypes.is_empty() {
        println!();
        println!(
            "  {} No prototypes saved in {}. Create one with: {}",
            style("i").blue().bold(),
            style(state.data_dir.display()).dim(),
            style("pforge olc").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Key").fg(Color::White),
        Cell::new("Based on").fg(Color::White),
        Cell::new("Description").fg(Color::White),
        Cell::new("Tags").fg(Color::White),
        Cell::new("Spawned").fg(Color::White),
    ]);

    for prototype in &prototypes {
        let key = prototype.key_or_unset();
        let spawned = state
            .spawner
            .objects_with_prototype(key)
            .await
            .with_context(|| format!("Failed to count objects spawned from '{key}'"))?
            .len();
        let desc = prototype.prototype_desc.as_deref().unwrap_or("");

        table.add_row(vec![
            Cell::new(key).fg(Color::Cyan),
            Cell::new(based_on(prototype)),
            Cell::new(crop(desc, 40)),
            Cell::new(prototype.prototype_tags.join(", ")).fg(Color::DarkGrey),
            Cell::new(spawned),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!("  {} prototype(s)", prototypes.len());
    println!();

    Ok(())
}

/// Show one prototype.
pub async fn show_prototype(state: &AppState, key: &str, json: bool) -> Result<()> {
    let prototype = find(state, key).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&prototype)?);
        return Ok(());
    }

    let spawned = state
        .spawner
        .objects_with_prototype(prototype.key_or_unset())
        .await
        .context("Failed to look up spawned objects")?;

    println!();
    println!("{}", markup::render(&prototype_to_str(&prototype)));
    println!();
    println!("  {} object(s) spawned from this prototype", spawned.len());
    println!();

    Ok(())
}

/// Delete a prototype. The caller must pass its `edit` lock.
pub async fn delete_prototype(
    state: &AppState,
    caller: &Caller,
    key: &str,
    force: bool,
    json: bool,
) -> Result<()> {
    let prototype = find(state, key).await?;
    let key = prototype.key_or_unset();

    let lockstring = prototype.prototype_locks.as_deref().unwrap_or("");
    if !state.locks.check(caller, lockstring, "edit") {
        bail!("You don't have permission to delete prototype '{key}'.");
    }

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete prototype '{key}'? This cannot be undone"))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let deleted = state
        .prototypes
        .delete_prototype(key)
        .await
        .context("Failed to delete prototype")?;
    tracing::info!(prototype_key = key, caller = %caller, "prototype deleted");

    if json {
        println!("{}", serde_json::json!({ "prototype_key": key, "deleted": deleted }));
    } else {
        println!();
        println!("  {} Deleted prototype '{}'", style("✓").green().bold(), key);
        println!();
    }
    Ok(())
}

/// Spawn an object. The caller must pass the prototype's `spawn` lock.
pub async fn spawn_prototype(
    state: &AppState,
    caller: &Caller,
    key: &str,
    location: Option<String>,
    json: bool,
) -> Result<()> {
    let prototype = find(state, key).await?;

    let lockstring = prototype.prototype_locks.as_deref().unwrap_or("");
    if !state.locks.check(caller, lockstring, "spawn") {
        bail!("You don't have access to use prototype '{}'.", prototype.key_or_unset());
    }

    let location = location.or_else(|| caller.location.clone());
    let object = state
        .spawner
        .spawn(&prototype, location.as_deref())
        .await
        .with_context(|| format!("Failed to spawn '{}'", prototype.key_or_unset()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&object)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Spawned {} ({})",
        style("✓").green().bold(),
        style(&object.key).cyan(),
        object.dbref()
    );
    println!(
        "  {}  {}",
        style("Location:").bold(),
        object.location.as_deref().unwrap_or("nowhere")
    );
    println!(
        "  {}  {}",
        style("Typeclass:").bold(),
        style(&object.typeclass).dim()
    );
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_based_on_prefers_parent() {
        let mut proto = Prototype {
            typeclass: Some("typeclasses.rooms.Room".to_string()),
            ..Default::default()
        };
        assert_eq!(based_on(&proto), "Room");

        proto.prototype_parent = Some("cave".to_string());
        assert_eq!(based_on(&proto), "<- cave");

        assert_eq!(based_on(&Prototype::default()), "-");
    }
}
