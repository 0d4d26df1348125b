//! Slash command parsing for the chat REPL.
//!
//! This module handles parsing of special commands that start with `/`,
//! allowing users to control the session without sending messages to the
//! service.

/// A parsed chat command.
///
/// These commands control the local session and are never sent to the
/// service.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Show the connectivity phase and session details.
    Status,

    /// Force a health probe now.
    Poll,

    /// Drop the session token and start a fresh conversation.
    Reset,

    /// Expand a code block by id.
    Expand(String),

    /// Collapse a code block by id.
    Collapse(String),

    /// Display help information.
    Help,

    /// Exit the chat application.
    Quit,

    /// Report a parsing error back to the caller.
    Invalid(String),
}

/// Parses user input for slash commands.
///
/// Returns `Some(ChatCommand)` if the input is a command,
/// or `None` if it should be treated as a regular message.
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    if !input.starts_with('/') {
        return None;
    }

    let mut parts = input[1..].splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "status" => ChatCommand::Status,
        "poll" => ChatCommand::Poll,
        "reset" => ChatCommand::Reset,
        "expand" => match argument {
            Some(id) => ChatCommand::Expand(id.to_string()),
            None => ChatCommand::Invalid("/expand requires a block id".to_string()),
        },
        "collapse" => match argument {
            Some(id) => ChatCommand::Collapse(id.to_string()),
            None => ChatCommand::Invalid("/collapse requires a block id".to_string()),
        },
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{command}")),
    };

    Some(result)
}

/// Returns the help text describing available commands.
pub fn help_text() -> &'static str {
    "Available commands:
  /status          Show connectivity and session details
  /poll            Probe the service's health now
  /reset           Drop the session token and start fresh
  /expand <id>     Expand a code block
  /collapse <id>   Collapse a code block
  /help, /?        Show this help
  /quit, /exit     Exit the application"
}
