//! Shared fixtures: an in-memory backend and a view that records what it was told.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use time::macros::datetime;

use chatgate::{
    Catalog, ChatBackend, ChatController, ChatMessage, ChatView, Credentials, Error,
    MessageCreate, Result, SenderType, SessionId, SessionState, Token, ValidationError,
};

/// Backend operations, for scripting faults and counting calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Login,
    Register,
    CreateSession,
    History,
    ClearHistory,
    SendMessage,
}

/// A scripted failure for one operation.
#[derive(Debug, Clone)]
pub enum Fault {
    /// The server refuses the bearer token.
    Expired,
    /// The server cannot be reached.
    Unreachable,
    /// The server answers 422 with these errors.
    Invalid(Vec<ValidationError>),
    /// The server answers with an unexpected status.
    Status(u16),
}

impl Fault {
    fn into_error(self) -> Error {
        match self {
            Fault::Expired => Error::authentication("Could not validate credentials"),
            Fault::Unreachable => Error::connection("Connection refused", None),
            Fault::Invalid(errors) => Error::validation(errors),
            Fault::Status(status) => Error::api(status, "Internal Server Error"),
        }
    }
}

/// The time the fake server records for every stored message.
pub const SENT_AT: OffsetDateTime = datetime!(2024-05-01 12:00 UTC);

fn stored(sender_type: SenderType, text: impl Into<String>) -> ChatMessage {
    ChatMessage {
        sent_at: Some(SENT_AT),
        ..ChatMessage::new(sender_type, text)
    }
}

#[derive(Debug, Default)]
pub struct ServerState {
    pub users: HashMap<String, String>,
    pub tokens: HashMap<String, String>,
    pub sessions: HashMap<String, Vec<ChatMessage>>,
    pub faults: HashMap<Op, Fault>,
    pub calls: Vec<Op>,
    pub sent: Vec<MessageCreate>,
    next_token: usize,
    next_session: usize,
}

/// An in-memory stand-in for the chat backend.
///
/// Tokens are issued as `t1`, `t2`, ... and sessions as `s1`, `s2`, ...  The bot
/// answers every user message with `echo: <text>`.
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    inner: Arc<Mutex<ServerState>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, username: &str, password: &str) -> Self {
        self.server()
            .users
            .insert(username.to_string(), password.to_string());
        self
    }

    pub fn server(&self) -> MutexGuard<'_, ServerState> {
        self.inner.lock().unwrap()
    }

    pub fn fail(&self, op: Op, fault: Fault) {
        self.server().faults.insert(op, fault);
    }

    pub fn heal(&self, op: Op) {
        self.server().faults.remove(&op);
    }

    /// Revokes every token the server has issued.
    pub fn revoke_tokens(&self) {
        self.server().tokens.clear();
    }

    pub fn calls(&self, op: Op) -> usize {
        self.server().calls.iter().filter(|c| **c == op).count()
    }

    pub fn history_of(&self, session_id: &str) -> Vec<ChatMessage> {
        self.server()
            .sessions
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    fn enter(&self, op: Op) -> Result<MutexGuard<'_, ServerState>> {
        let mut server = self.server();
        server.calls.push(op);
        match server.faults.get(&op).cloned() {
            Some(fault) => Err(fault.into_error()),
            None => Ok(server),
        }
    }
}

fn authorize(server: &ServerState, token: &Token) -> Result<()> {
    if server.tokens.contains_key(token.as_str()) {
        Ok(())
    } else {
        Err(Error::authentication("Could not validate credentials"))
    }
}

#[async_trait]
impl ChatBackend for FakeBackend {
    async fn login(&self, credentials: &Credentials) -> Result<Token> {
        let mut server = self.enter(Op::Login)?;
        let valid = server
            .users
            .get(&credentials.username)
            .is_some_and(|password| *password == credentials.password);
        if !valid {
            return Err(Error::invalid_credentials("Incorrect username or password"));
        }
        server.next_token += 1;
        let token = format!("t{}", server.next_token);
        server
            .tokens
            .insert(token.clone(), credentials.username.clone());
        Ok(Token::new(token))
    }

    async fn register(&self, credentials: &Credentials) -> Result<()> {
        let mut server = self.enter(Op::Register)?;
        if server.users.contains_key(&credentials.username) {
            return Err(Error::conflict("Username already registered"));
        }
        server
            .users
            .insert(credentials.username.clone(), credentials.password.clone());
        Ok(())
    }

    async fn create_session(&self, token: &Token) -> Result<SessionId> {
        let mut server = self.enter(Op::CreateSession)?;
        authorize(&server, token)?;
        server.next_session += 1;
        let id = format!("s{}", server.next_session);
        server.sessions.insert(id.clone(), Vec::new());
        Ok(SessionId::new(id))
    }

    async fn history(&self, token: &Token, session_id: &SessionId) -> Result<Vec<ChatMessage>> {
        let server = self.enter(Op::History)?;
        authorize(&server, token)?;
        server
            .sessions
            .get(session_id.as_str())
            .cloned()
            .ok_or_else(|| Error::api(404, "Session not found"))
    }

    async fn clear_history(&self, token: &Token, session_id: &SessionId) -> Result<()> {
        let mut server = self.enter(Op::ClearHistory)?;
        authorize(&server, token)?;
        match server.sessions.get_mut(session_id.as_str()) {
            Some(messages) => {
                messages.clear();
                Ok(())
            }
            None => Err(Error::api(404, "Session not found")),
        }
    }

    async fn send_message(&self, token: &Token, message: &MessageCreate) -> Result<Option<String>> {
        let mut server = self.enter(Op::SendMessage)?;
        authorize(&server, token)?;
        server.sent.push(message.clone());
        let Some(messages) = server.sessions.get_mut(message.session_id.as_str()) else {
            return Err(Error::api(404, "Session not found"));
        };
        messages.push(stored(message.sender_type, message.text.clone()));
        if message.sender_type.is_user() {
            let answer = format!("echo: {}", message.text);
            messages.push(stored(SenderType::Bot, answer.clone()));
            Ok(Some(answer))
        } else {
            Ok(None)
        }
    }
}

/// Everything a view can be told.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    Message(SenderType, String),
    Cleared,
    TypingShown,
    TypingHidden,
    OverlayShown,
    OverlayHidden,
    Popup(String),
    FieldError(String, String),
    GlobalError(String),
    ErrorsCleared,
    Success(String),
}

/// A view that keeps the chat log like a screen would and records every call.
#[derive(Debug, Default)]
pub struct RecordingView {
    pub events: Vec<ViewEvent>,
    pub log: Vec<(SenderType, String)>,
    pub overlay: bool,
    pub typing: bool,
    /// Timestamps of the messages that came from history, in order.
    pub history_stamps: Vec<Option<OffsetDateTime>>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn popups(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ViewEvent::Popup(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn field_errors(&self) -> Vec<(&str, &str)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ViewEvent::FieldError(field, text) => Some((field.as_str(), text.as_str())),
                _ => None,
            })
            .collect()
    }

    pub fn global_errors(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ViewEvent::GlobalError(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, event: &ViewEvent) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.log.iter().map(|(_, text)| text.as_str()).collect()
    }

    pub fn reset_events(&mut self) {
        self.events.clear();
    }
}

impl ChatView for RecordingView {
    fn append_message(&mut self, sender: SenderType, text: &str) {
        self.log.push((sender, text.to_string()));
        self.events.push(ViewEvent::Message(sender, text.to_string()));
    }

    fn append_history(&mut self, message: &ChatMessage) {
        self.history_stamps.push(message.sent_at);
        self.append_message(message.sender_type, &message.text);
    }

    fn clear_messages(&mut self) {
        self.log.clear();
        self.events.push(ViewEvent::Cleared);
    }

    fn show_typing(&mut self) {
        self.typing = true;
        self.events.push(ViewEvent::TypingShown);
    }

    fn hide_typing(&mut self) {
        self.typing = false;
        self.events.push(ViewEvent::TypingHidden);
    }

    fn show_overlay(&mut self) {
        self.overlay = true;
        self.events.push(ViewEvent::OverlayShown);
    }

    fn hide_overlay(&mut self) {
        self.overlay = false;
        self.events.push(ViewEvent::OverlayHidden);
    }

    fn show_popup(&mut self, message: &str) {
        self.events.push(ViewEvent::Popup(message.to_string()));
    }

    fn show_field_error(&mut self, field: &str, message: &str) {
        self.events
            .push(ViewEvent::FieldError(field.to_string(), message.to_string()));
    }

    fn show_global_error(&mut self, message: &str) {
        self.events.push(ViewEvent::GlobalError(message.to_string()));
    }

    fn clear_errors(&mut self) {
        self.events.push(ViewEvent::ErrorsCleared);
    }

    fn show_success(&mut self, message: &str, _dismiss_after: Duration) {
        self.events.push(ViewEvent::Success(message.to_string()));
    }
}

pub type TestController = ChatController<FakeBackend, RecordingView>;

/// A controller over `backend` with empty in-memory storage and English text.
pub fn controller(backend: FakeBackend) -> TestController {
    ChatController::new(
        backend,
        RecordingView::new(),
        SessionState::in_memory(),
        Catalog::english(),
    )
}

/// A controller whose storage already holds `token`.
pub fn controller_with_token(backend: FakeBackend, token: &str) -> TestController {
    let mut state = SessionState::in_memory();
    state.set_token(&Token::new(token)).unwrap();
    ChatController::new(backend, RecordingView::new(), state, Catalog::english())
}
