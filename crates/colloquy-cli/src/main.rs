//! Colloquy CLI entry point.
//!
//! Binary name: `colloquy`
//!
//! Parses CLI arguments, initializes the database and conversation
//! service, then dispatches to the command handlers.

mod cli;
mod state;

use clap::Parser;

use cli::{Cli, Commands, SessionCommand};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,colloquy=debug",
        _ => "trace",
    };
    if let Err(err) = colloquy_observe::init_tracing(filter, cli.json) {
        eprintln!("Warning: failed to initialize tracing: {err}");
    }

    let state = AppState::init().await?;
    let owner = state.owner_key(cli.owner.as_deref());

    match cli.command {
        Commands::Session { action } => match action {
            SessionCommand::New { title } => {
                cli::session::new_session(&state, &owner, title, cli.json).await?;
            }
            SessionCommand::List => {
                cli::session::list_sessions(&state, &owner, cli.json).await?;
            }
            SessionCommand::Delete { id, force } => {
                cli::session::delete_session(&state, &id, force, cli.json).await?;
            }
        },

        Commands::Send {
            text,
            image,
            attach,
            session,
        } => {
            cli::send::send_turn(&state, &owner, &text, image, attach, session, cli.json).await?;
        }

        Commands::History { session_id } => {
            cli::history::show_history(&state, &session_id, cli.json).await?;
        }

        Commands::Chat { session } => {
            cli::chat::run_chat_loop(&state, &owner, session).await?;
        }
    }

    Ok(())
}
