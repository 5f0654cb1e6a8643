//! Slash command parsing for the terminal front-end.
//!
//! Input that starts with `/` controls the client; anything else is a chat
//! message.

/// A parsed slash command.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    /// Sign in.  A missing password is prompted for without echo.
    Login {
        /// Account name.
        username: String,
        /// Password, if it was given inline.
        password: Option<String>,
    },

    /// Create an account.  A missing password is prompted for without echo.
    Register {
        /// Account name.
        username: String,
        /// Password, if it was given inline.
        password: Option<String>,
    },

    /// Clear the conversation history.
    Clear,

    /// Resolve the session again and redraw its history.
    Reload,

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
///
/// # Examples
///
/// ```
/// # use chatgate::commands::parse_command;
/// assert!(parse_command("/quit").is_some());
/// assert!(parse_command("/login ann").is_some());
/// assert!(parse_command("What is on the menu?").is_none());
/// ```
pub fn parse_command(input: &str) -> Option<ChatCommand> {
    let input = input.trim();

    if !input.starts_with('/') {
        return None;
    }

    let mut parts = input[1..].splitn(2, ' ');
    let command = parts.next()?.to_lowercase();
    let argument = parts.next().map(|s| s.trim()).filter(|s| !s.is_empty());

    let result = match command.as_str() {
        "login" | "signin" => match parse_credentials(argument) {
            Some((username, password)) => ChatCommand::Login { username, password },
            None => ChatCommand::Invalid("/login requires a username".to_string()),
        },
        "register" | "signup" => match parse_credentials(argument) {
            Some((username, password)) => ChatCommand::Register { username, password },
            None => ChatCommand::Invalid("/register requires a username".to_string()),
        },
        "clear" => ChatCommand::Clear,
        "reload" => ChatCommand::Reload,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        _ => ChatCommand::Invalid(format!("Unknown command: /{}", command)),
    };

    Some(result)
}

fn parse_credentials(argument: Option<&str>) -> Option<(String, Option<String>)> {
    let mut parts = argument?.splitn(2, ' ');
    let username = parts.next()?.to_string();
    let password = parts.next().map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    Some((username, password))
}

/// Returns help text describing available commands.
pub fn help_text() -> &'static str {
    r#"Available commands:
  /login <user>                Sign in (the password is asked for without echo)
  /register <user>             Create an account (same password prompt)
  /clear                       Clear the conversation history
  /reload                      Reload the conversation from the server
  /help                        Show this help message
  /quit                        Exit the chat
Anything else is sent to the bot.
A password typed after the username is accepted but stays on screen."#
}
