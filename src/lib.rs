// Public modules
pub mod catalog;
pub mod client;
pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod form;
pub mod render;
pub mod state;
pub mod storage;
pub mod types;
pub mod utils;

mod observability;

// Re-exports
pub use catalog::{Catalog, Locale};
pub use client::{ChatBackend, ChatClient};
pub use controller::{ChatController, Command};
pub use error::{Error, ErrorClass, Result};
pub use form::CredentialForm;
pub use observability::register_biometrics;
pub use render::{ChatView, TerminalView};
pub use state::{Event, Phase, SessionState};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use types::*;
