//! Presentation collaborators.
//!
//! The controller drives a [`ChatView`] and never renders anything itself.  The
//! terminal front-end uses [`TerminalView`]; a browser or GUI front-end would
//! provide its own implementation.

use std::io::{self, Stdout, Write};
use std::time::Duration;

use time::OffsetDateTime;
use time::macros::format_description;

use crate::form::{PASSWORD_FIELD, USERNAME_FIELD};
use crate::types::{ChatMessage, SenderType};

/// ANSI escape code for dim text (used for the typing indicator).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for bot messages).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for green text (used for user messages and success notices).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// ANSI escape code for yellow text (used for the sign-in prompt).
const ANSI_YELLOW: &str = "\x1b[33m";

/// Carriage return plus erase-line, used to take the typing indicator down.
const ANSI_ERASE_LINE: &str = "\r\x1b[2K";

/// Everything the controller needs from a user interface.
pub trait ChatView: Send {
    /// Append a message to the chat log.
    fn append_message(&mut self, sender: SenderType, text: &str);

    /// Append a message loaded from the server's history.
    fn append_history(&mut self, message: &ChatMessage) {
        self.append_message(message.sender_type, &message.text);
    }

    /// Remove every message from the chat log.
    fn clear_messages(&mut self);

    /// Show the typing indicator.
    fn show_typing(&mut self);

    /// Hide the typing indicator.
    fn hide_typing(&mut self);

    /// Show the blocking sign-in overlay.
    fn show_overlay(&mut self);

    /// Hide the sign-in overlay.
    fn hide_overlay(&mut self);

    /// Show a dismissable error popup.
    fn show_popup(&mut self, message: &str);

    /// Whether the form has an input called `field`.
    fn has_field(&self, field: &str) -> bool {
        field == USERNAME_FIELD || field == PASSWORD_FIELD
    }

    /// Attach an inline error to a form input.
    fn show_field_error(&mut self, field: &str, message: &str);

    /// Show an error that belongs to no particular input.
    fn show_global_error(&mut self, message: &str);

    /// Remove all inline and global form errors.
    fn clear_errors(&mut self);

    /// Show a success notice that goes away after `dismiss_after`.
    fn show_success(&mut self, message: &str, dismiss_after: Duration);
}

/// Line-oriented view for a terminal, with optional ANSI styling.
pub struct TerminalView {
    stdout: Stdout,
    use_color: bool,
    typing: bool,
    overlay: bool,
}

impl TerminalView {
    /// Creates a new TerminalView with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new TerminalView with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            typing: false,
            overlay: false,
        }
    }

    /// Whether the sign-in overlay is currently up.
    pub fn overlay_visible(&self) -> bool {
        self.overlay
    }

    /// Prints an informational line.
    pub fn print_info(&mut self, info: &str) {
        self.take_down_typing();
        println!("{info}");
        self.flush();
    }

    /// Flushes stdout to ensure immediate display.
    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_color {
            format!("{color}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }

    fn print_message(&mut self, sender: SenderType, text: &str, sent_at: Option<OffsetDateTime>) {
        self.take_down_typing();
        let label = match sender {
            SenderType::User => "You",
            SenderType::Bot => "Bot",
        };
        let line = match sent_at.and_then(stamp) {
            Some(stamp) => format!("[{stamp}] {label}: {text}"),
            None => format!("{label}: {text}"),
        };
        let line = match sender {
            SenderType::User => self.paint(ANSI_GREEN, &line),
            SenderType::Bot => self.paint(ANSI_CYAN, &line),
        };
        println!("{line}");
        self.flush();
    }

    fn take_down_typing(&mut self) {
        if self.typing {
            if self.use_color {
                print!("{ANSI_ERASE_LINE}");
            } else {
                println!();
            }
            self.typing = false;
        }
    }
}

impl Default for TerminalView {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatView for TerminalView {
    fn append_message(&mut self, sender: SenderType, text: &str) {
        self.print_message(sender, text, None);
    }

    fn append_history(&mut self, message: &ChatMessage) {
        self.print_message(message.sender_type, &message.text, message.sent_at);
    }

    fn clear_messages(&mut self) {
        self.take_down_typing();
        if self.use_color {
            print!("\x1b[2J\x1b[H");
        } else {
            println!("----");
        }
        self.flush();
    }

    fn show_typing(&mut self) {
        if !self.typing {
            print!("{}", self.paint(ANSI_DIM, "Bot is typing..."));
            self.typing = true;
            self.flush();
        }
    }

    fn hide_typing(&mut self) {
        self.take_down_typing();
        self.flush();
    }

    fn show_overlay(&mut self) {
        self.take_down_typing();
        self.overlay = true;
        let prompt = self.paint(
            ANSI_YELLOW,
            "Sign in with /login <username> [password] or create an account with /register <username> [password].",
        );
        println!("{prompt}");
        self.flush();
    }

    fn hide_overlay(&mut self) {
        self.overlay = false;
    }

    fn show_popup(&mut self, message: &str) {
        self.take_down_typing();
        eprintln!("{}", self.paint(ANSI_RED, &format!("Error: {message}")));
    }

    fn show_field_error(&mut self, field: &str, message: &str) {
        self.take_down_typing();
        eprintln!("{}", self.paint(ANSI_RED, &format!("  {field}: {message}")));
    }

    fn show_global_error(&mut self, message: &str) {
        self.take_down_typing();
        eprintln!("{}", self.paint(ANSI_RED, message));
    }

    fn clear_errors(&mut self) {}

    fn show_success(&mut self, message: &str, _dismiss_after: Duration) {
        self.take_down_typing();
        println!("{}", self.paint(ANSI_GREEN, message));
        self.flush();
    }
}

/// Formats a history timestamp to the minute.
fn stamp(sent_at: OffsetDateTime) -> Option<String> {
    sent_at
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
        .ok()
}
