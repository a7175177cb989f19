//! Print the messages of a session.

use anyhow::{Context, Result};
use console::style;
use uuid::Uuid;

use colloquy_core::store::ConversationStore;

use crate::state::AppState;

use super::chat::renderer::ChatRenderer;

/// Print a session's messages in order: user lines plain, assistant
/// replies rendered as markdown.
pub async fn show_history(state: &AppState, session_id: &Uuid, json: bool) -> Result<()> {
    let session = state
        .convo
        .store()
        .get_session(session_id)
        .await?
        .with_context(|| format!("Session '{session_id}' not found"))?;

    let messages = state.convo.store().list_messages(session_id).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "session": session,
                "messages": messages,
            }))?
        );
        return Ok(());
    }

    let title = session.title.as_deref().unwrap_or("(untitled)");
    println!();
    println!("  {}", style(title).cyan().bold());
    println!(
        "  {}",
        style(session.created_at.format("%Y-%m-%d %H:%M UTC")).dim()
    );
    println!();

    let renderer = ChatRenderer::new();
    for msg in &messages {
        let timestamp = msg.created_at.format("%H:%M");
        if msg.is_from_user {
            println!("  {} {}", style(format!("You ({timestamp})")).green().bold(), msg.content);
            for reference in &msg.attachment_refs {
                println!("    {}", style(format!("[{}]", reference.path)).dim());
            }
        } else {
            println!("  {}", style(format!("Assistant ({timestamp})")).cyan().bold());
            let rendered = renderer.render_final(&msg.content);
            for line in rendered.lines() {
                println!("  {line}");
            }
        }
        println!();
    }

    if messages.is_empty() {
        println!("  {}", style("No messages yet.").dim());
        println!();
    }

    Ok(())
}
