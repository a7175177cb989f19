//! CLI command definitions and dispatch for the `colloquy` binary.
//!
//! Uses clap derive macros for argument parsing. Commands follow a
//! noun-verb pattern for resources (`colloquy session new`) with flat
//! verbs for the frequent actions (`colloquy send`, `colloquy chat`).

pub mod chat;
pub mod history;
pub mod send;
pub mod session;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Chat with a completion endpoint from the terminal.
#[derive(Parser)]
#[command(name = "colloquy", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Owner identity to scope sessions (overrides config.toml).
    #[arg(long, global = true)]
    pub owner: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage chat sessions.
    Session {
        #[command(subcommand)]
        action: SessionCommand,
    },

    /// Send one message and print the reply.
    Send {
        /// The message text.
        text: String,

        /// Image file to attach (repeatable).
        #[arg(long)]
        image: Vec<PathBuf>,

        /// Any other file to attach (repeatable).
        #[arg(long)]
        attach: Vec<PathBuf>,

        /// Session to append to (a new one is created when omitted).
        #[arg(long)]
        session: Option<uuid::Uuid>,
    },

    /// Print the messages of a session.
    History {
        /// Session ID.
        session_id: uuid::Uuid,
    },

    /// Start an interactive chat loop.
    Chat {
        /// Resume an existing session by ID.
        #[arg(long)]
        session: Option<uuid::Uuid>,
    },
}

#[derive(Subcommand)]
pub enum SessionCommand {
    /// Create a new session.
    New {
        /// Explicit title (otherwise the first message titles it).
        #[arg(long)]
        title: Option<String>,
    },

    /// List sessions, newest first.
    #[command(alias = "ls")]
    List,

    /// Delete a session and its messages and attachments.
    #[command(alias = "rm")]
    Delete {
        /// Session ID to delete.
        id: uuid::Uuid,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },
}
