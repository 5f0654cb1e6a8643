//! Interactive terminal client for the chat backend.
//!
//! # Usage
//!
//! ```bash
//! # Talk to a backend on localhost
//! chatgate
//!
//! # Point at another backend and remember the sign-in between runs
//! chatgate --base-url https://chat.example.com/ --state-file ~/.chatgate.json
//!
//! # Russian messages, no colors
//! chatgate --locale ru --no-color
//! ```
//!
//! # Commands
//!
//! - `/login <user>` - Sign in; the password is prompted for without echo
//! - `/register <user>` - Create an account
//! - `/clear` - Clear the conversation
//! - `/reload` - Reload the conversation from the server
//! - `/help` - Show available commands
//! - `/quit` - Exit the application

use arrrg::CommandLine;
use dialoguer::Password;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing_subscriber::EnvFilter;

use chatgate::commands::{ChatCommand, help_text, parse_command};
use chatgate::config::{ChatArgs, ChatConfig};
use chatgate::{
    Catalog, ChatClient, ChatController, Command, CredentialForm, FileStorage, MemoryStorage,
    SessionState, Storage, TerminalView,
};

/// Main entry point for the chatgate application.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, _) = ChatArgs::from_command_line_relaxed("chatgate [OPTIONS]");
    let config = ChatConfig::try_from(args)?;
    init_tracing(config.verbose);

    let client = ChatClient::with_options(config.base_url.clone(), Some(config.timeout))?;
    tracing::info!(base_url = %client.base_url(), "using chat backend");

    let storage: Box<dyn Storage> = match &config.state_file {
        Some(path) => Box::new(FileStorage::open(path)?),
        None => Box::new(MemoryStorage::new()),
    };
    let state = SessionState::new(storage);
    let view = TerminalView::with_color(config.use_color);
    let mut controller =
        ChatController::new(client, view, state, Catalog::for_locale(config.locale));
    let mut rl = DefaultEditor::new()?;

    println!("Chat ({})", controller.backend().base_url());
    println!("Type /help for commands, /quit to exit\n");

    let _ = controller.dispatch(Command::Start).await;

    loop {
        let readline = rl.readline("> ");

        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let command = match parse_command(line) {
                    Some(ChatCommand::Quit) => {
                        println!("Goodbye!");
                        break;
                    }
                    Some(ChatCommand::Help) => {
                        for line in help_text().lines() {
                            controller.view_mut().print_info(&format!("    {line}"));
                        }
                        continue;
                    }
                    Some(ChatCommand::Invalid(message)) => {
                        controller.view_mut().print_info(&message);
                        continue;
                    }
                    Some(ChatCommand::Login { username, password }) => {
                        let Some(form) = credential_form(username, password) else {
                            continue;
                        };
                        Command::Login(form)
                    }
                    Some(ChatCommand::Register { username, password }) => {
                        let Some(form) = credential_form(username, password) else {
                            continue;
                        };
                        Command::Register(form)
                    }
                    Some(ChatCommand::Clear) => Command::ClearHistory,
                    Some(ChatCommand::Reload) => Command::ResolveSession,
                    None => {
                        let _ = rl.add_history_entry(line);
                        Command::SendMessage(line.to_string())
                    }
                };

                // Failures are already on screen.
                if let Err(err) = controller.dispatch(command).await {
                    tracing::debug!(error = %err, "command failed");
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Input error: {err}");
                break;
            }
        }
    }

    Ok(())
}

/// Logs go to stderr so they never interleave with the conversation on stdout.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "chatgate=debug" } else { "chatgate=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Builds the form, asking for the password without echo when it was not given.
fn credential_form(username: String, password: Option<String>) -> Option<CredentialForm> {
    let password = match password {
        Some(password) => password,
        None => match Password::new().with_prompt("Password").interact() {
            Ok(password) => password,
            Err(err) => {
                eprintln!("Password prompt failed: {err}");
                return None;
            }
        },
    };
    Some(CredentialForm::new(username, password))
}
