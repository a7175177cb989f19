//! One-shot turn: send a message (optionally with attachments) and print
//! the reply.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use uuid::Uuid;

use colloquy_core::render::Typewriter;
use colloquy_core::store::ConversationStore;
use colloquy_types::message::AttachmentRef;

use crate::state::AppState;

use super::chat::renderer::ChatRenderer;

/// Send one message and print the reply.
///
/// A failing attachment is skipped with a warning; the turn proceeds with
/// the rest.
///
/// # Examples
///
/// ```bash
/// colloquy send "what is this?" --image photo.png
/// colloquy send "continuing" --session <session-id>
/// ```
pub async fn send_turn(
    state: &AppState,
    owner: &str,
    text: &str,
    images: Vec<PathBuf>,
    attachments: Vec<PathBuf>,
    session: Option<Uuid>,
    json: bool,
) -> Result<()> {
    let is_new_session = session.is_none();
    let session = match session {
        Some(id) => state
            .convo
            .store()
            .get_session(&id)
            .await?
            .with_context(|| format!("Session '{id}' not found"))?,
        None => state.convo.create_session(owner, None).await?,
    };

    let mut refs = Vec::new();
    for path in images.iter().chain(attachments.iter()) {
        match store_file(state, path).await {
            Ok(reference) => refs.push(reference),
            Err(err) => {
                eprintln!(
                    "  {} Skipping attachment {}: {err}",
                    style("!").yellow().bold(),
                    path.display()
                );
            }
        }
    }

    let spinner = if json {
        None
    } else {
        let spinner = indicatif::ProgressBar::new_spinner();
        spinner.set_style(
            indicatif::ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner()),
        );
        spinner.set_message("thinking...");
        spinner.enable_steady_tick(Duration::from_millis(80));
        Some(spinner)
    };

    let outcome = state.convo.submit_turn(&session.id, text, refs).await;
    if let Some(spinner) = &spinner {
        spinner.finish_and_clear();
    }
    let outcome = outcome?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "session_id": session.id.to_string(),
                "user": outcome.user,
                "assistant": outcome.assistant,
            }))?
        );
        return Ok(());
    }

    if let Some(assistant) = outcome.assistant {
        let renderer = ChatRenderer::new();
        let typewriter = Typewriter::new(Duration::from_millis(state.config.render.tick_ms));
        println!();
        print!("  ");
        renderer.reveal(&typewriter, &assistant.content).await;
        println!();
    }

    if is_new_session {
        println!(
            "  {} continue with: {}",
            style("i").blue().bold(),
            style(format!("colloquy chat --session {}", session.id)).yellow()
        );
        println!();
    }

    Ok(())
}

async fn store_file(state: &AppState, path: &Path) -> Result<AttachmentRef> {
    let bytes = tokio::fs::read(path).await?;
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    Ok(state.convo.store_attachment(&bytes, extension).await?)
}
