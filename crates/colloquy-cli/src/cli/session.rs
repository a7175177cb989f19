//! Session management CLI commands: new, list, delete.

use anyhow::{Context, Result};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;
use uuid::Uuid;

use colloquy_core::store::ConversationStore;

use crate::state::AppState;

/// Create a new session and print its id.
///
/// # Examples
///
/// ```bash
/// colloquy session new
/// colloquy session new --title "Build planning"
/// ```
pub async fn new_session(
    state: &AppState,
    owner: &str,
    title: Option<String>,
    json: bool,
) -> Result<()> {
    let session = state.convo.create_session(owner, title).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&session)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Session created: {}",
        style("+").green().bold(),
        style(session.id).cyan()
    );
    if let Some(title) = &session.title {
        println!("    {}", style(title).dim());
    }
    println!();

    Ok(())
}

/// List the owner's sessions with title and creation time, newest first.
pub async fn list_sessions(state: &AppState, owner: &str, json: bool) -> Result<()> {
    let sessions = state.convo.store().list_sessions(owner).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!();
        println!(
            "  {} No sessions yet. Start one with: {}",
            style("i").blue().bold(),
            style("colloquy chat").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Title").fg(Color::White),
        Cell::new("Created").fg(Color::White),
        Cell::new("ID").fg(Color::White),
    ]);

    for session in &sessions {
        let title = session.title.as_deref().unwrap_or("(untitled)").to_string();
        let title_display = if title.chars().count() > 40 {
            let truncated: String = title.chars().take(37).collect();
            format!("{truncated}...")
        } else {
            title
        };
        let created = session.created_at.format("%Y-%m-%d %H:%M").to_string();

        table.add_row(vec![
            Cell::new(title_display).fg(Color::Cyan),
            Cell::new(created).fg(Color::White),
            Cell::new(session.id.to_string()).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} session{}",
        style(sessions.len()).bold(),
        if sessions.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Delete a session with confirmation. Removes its messages and stored
/// attachment files.
///
/// # Examples
///
/// ```bash
/// colloquy session delete <session-id>
/// colloquy session delete <session-id> --force
/// ```
pub async fn delete_session(
    state: &AppState,
    session_id: &Uuid,
    force: bool,
    json: bool,
) -> Result<()> {
    let session = state
        .convo
        .store()
        .get_session(session_id)
        .await?
        .with_context(|| format!("Session '{session_id}' not found"))?;

    let title = session.title.as_deref().unwrap_or("(untitled)").to_string();

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete session '{}'?", style(&title).red().bold()))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    state.convo.delete_session(session_id).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({"deleted": true, "session_id": session_id.to_string()})
        );
    } else {
        println!("  {} Session '{}' deleted.", style("x").red().bold(), title);
    }

    Ok(())
}
