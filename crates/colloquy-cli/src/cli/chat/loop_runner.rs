//! Main chat loop orchestration.
//!
//! Resolves or creates the session, prints the banner, then runs the
//! input loop: slash commands, turn submission with a thinking spinner,
//! and typewriter-revealed replies. A failed request keeps the loop alive
//! so the user can retry.

use std::io::Write;
use std::time::Duration;

use anyhow::Context;
use console::style;
use uuid::Uuid;

use colloquy_core::render::Typewriter;
use colloquy_core::store::ConversationStore;
use colloquy_types::session::Session;

use crate::state::AppState;

use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};
use super::renderer::ChatRenderer;

fn thinking_spinner() -> indicatif::ProgressBar {
    let spinner = indicatif::ProgressBar::new_spinner();
    spinner.set_style(
        indicatif::ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner()),
    );
    spinner.set_message("thinking...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

fn print_banner(session: &Session, endpoint: &str) {
    println!();
    println!(
        "  {} {}",
        style("Colloquy").cyan().bold(),
        style(endpoint).dim()
    );
    println!("  {} {}", style("session").dim(), style(session.id).dim());
    println!(
        "  {}",
        style("Type /help for commands, Ctrl+D to exit.").dim()
    );
    println!();
}

/// Run the interactive chat loop.
pub async fn run_chat_loop(
    state: &AppState,
    owner: &str,
    resume: Option<Uuid>,
) -> anyhow::Result<()> {
    let mut session = match resume {
        Some(id) => state
            .convo
            .store()
            .get_session(&id)
            .await?
            .with_context(|| format!("Session '{id}' not found"))?,
        None => state.convo.create_session(owner, None).await?,
    };

    print_banner(&session, &state.config.endpoint.base_url);

    let renderer = ChatRenderer::new();
    let typewriter = Typewriter::new(Duration::from_millis(state.config.render.tick_ms));

    let prompt = format!("  {} ", style("You >").green().bold());
    let (mut chat_input, _writer) =
        ChatInput::new(prompt).map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    loop {
        match chat_input.read_line().await {
            InputEvent::Eof => {
                println!("\n  {}", style("Session ended.").dim());
                break;
            }
            InputEvent::Interrupted => {
                println!(
                    "\n  {}",
                    style("Press Ctrl+D to exit, or keep chatting.").dim()
                );
                continue;
            }
            InputEvent::Message(text) => {
                if text.is_empty() {
                    continue;
                }

                if let Some(cmd) = commands::parse(&text) {
                    match cmd {
                        ChatCommand::Help => {
                            commands::print_help();
                        }
                        ChatCommand::Quit => {
                            println!("\n  {}", style("Session ended.").dim());
                            break;
                        }
                        ChatCommand::Id => {
                            println!("\n  {}\n", style(session.id).cyan());
                        }
                        ChatCommand::New => {
                            session = state.convo.create_session(owner, None).await?;
                            println!(
                                "\n  {} New session: {}\n",
                                style("+").green().bold(),
                                style(session.id).cyan()
                            );
                        }
                        ChatCommand::History => {
                            let messages =
                                state.convo.store().list_messages(&session.id).await?;
                            println!();
                            for msg in &messages {
                                let label = if msg.is_from_user {
                                    style("You").green().bold()
                                } else {
                                    style("Assistant").cyan().bold()
                                };
                                let preview: String = if msg.content.chars().count() > 100 {
                                    let head: String = msg.content.chars().take(97).collect();
                                    format!("{head}...")
                                } else {
                                    msg.content.clone()
                                };
                                println!("  {label} {preview}");
                            }
                            println!();
                        }
                        ChatCommand::Unknown(name) => {
                            println!(
                                "\n  {} Unknown command: {}. Type /help for available commands.\n",
                                style("?").yellow().bold(),
                                style(name).dim()
                            );
                        }
                    }
                    continue;
                }

                let spinner = thinking_spinner();
                match state.convo.submit_turn(&session.id, &text, vec![]).await {
                    Ok(outcome) => {
                        spinner.finish_and_clear();
                        if let Some(assistant) = outcome.assistant {
                            print!("\n  {} ", style("Assistant >").cyan().bold());
                            let _ = std::io::stdout().flush();
                            renderer.reveal(&typewriter, &assistant.content).await;
                            println!();
                        }
                    }
                    Err(err) => {
                        spinner.finish_and_clear();
                        eprintln!("\n  {} {err}", style("!").red().bold());
                        eprintln!(
                            "  {}",
                            style("Your message was saved. Type again to retry, /quit to exit.")
                                .dim()
                        );
                    }
                }
            }
        }
    }

    Ok(())
}
