//! Slash commands available inside the chat loop.

use console::style;

/// A parsed slash command.
#[derive(Debug, PartialEq, Eq)]
pub enum ChatCommand {
    Help,
    /// Start a fresh session.
    New,
    /// Print the current session id.
    Id,
    /// Print recent messages.
    History,
    Quit,
    Unknown(String),
}

/// Parse a slash command; `None` means the line is a normal message.
pub fn parse(text: &str) -> Option<ChatCommand> {
    let text = text.trim();
    if !text.starts_with('/') {
        return None;
    }

    Some(match text {
        "/help" => ChatCommand::Help,
        "/new" => ChatCommand::New,
        "/id" => ChatCommand::Id,
        "/history" => ChatCommand::History,
        "/quit" | "/exit" => ChatCommand::Quit,
        other => ChatCommand::Unknown(other.to_string()),
    })
}

pub fn print_help() {
    println!();
    println!("  {}", style("Commands").bold());
    println!("  {}      show this help", style("/help").yellow());
    println!("  {}       start a fresh session", style("/new").yellow());
    println!("  {}        print the current session id", style("/id").yellow());
    println!("  {}   print recent messages", style("/history").yellow());
    println!("  {}      end the session (or Ctrl+D)", style("/quit").yellow());
    println!();
}
