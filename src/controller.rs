//! The chat controller: auth gate, session resolution, and message exchange.
//!
//! [`ChatController`] owns the [`SessionState`] and drives a [`ChatView`].  Every
//! handler follows the same shape: do the work, then hand any failure to one
//! presentation policy that dispatches on [`ErrorClass`].  A 401 from any
//! authenticated call therefore always ends in [`ChatController::handle_token_expired`].

use std::time::Duration;

use crate::catalog::Catalog;
use crate::client::ChatBackend;
use crate::error::{Error, ErrorClass, Result};
use crate::form::CredentialForm;
use crate::observability::{
    MESSAGES_DROPPED, MESSAGES_RENDERED, MESSAGES_SENT, SESSIONS_CREATED, SESSIONS_RESUMED,
    TOKEN_EXPIRIES,
};
use crate::render::ChatView;
use crate::state::{Event, Phase, SessionState};
use crate::types::{MessageCreate, SenderType, SessionId, Token, ValidationError};

/// How long the registration success notice stays up.
pub const SUCCESS_NOTICE_DURATION: Duration = Duration::from_secs(3);

/// A user action, independent of the UI that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// The UI finished loading.
    Start,
    /// The sign-in form was submitted.
    Login(CredentialForm),
    /// The registration button was pressed.
    Register(CredentialForm),
    /// The user sent a chat message.
    SendMessage(String),
    /// The user asked to wipe the conversation.
    ClearHistory,
    /// Resolve (or re-resolve) the chat session.
    ResolveSession,
}

/// Drives the auth/session/message flow against a backend and a view.
pub struct ChatController<B: ChatBackend, V: ChatView> {
    backend: B,
    view: V,
    state: SessionState,
    catalog: Catalog,
}

impl<B: ChatBackend, V: ChatView> ChatController<B, V> {
    /// Creates a controller.  Call [`Self::start`] (or dispatch [`Command::Start`]) next.
    pub fn new(backend: B, view: V, state: SessionState, catalog: Catalog) -> Self {
        Self {
            backend,
            view,
            state,
            catalog,
        }
    }

    /// The backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The view.
    pub fn view(&self) -> &V {
        &self.view
    }

    /// The view, mutably.
    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// The client state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The client state, mutably.
    pub fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    /// The current phase.
    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// The text catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Runs the handler for `command`.
    ///
    /// Failures have already been presented through the view when this returns
    /// `Err`; the error is handed back for callers that want to log or test it.
    pub async fn dispatch(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Start => self.start().await,
            Command::Login(form) => self.login(&form).await,
            Command::Register(form) => self.register(&form).await,
            Command::SendMessage(text) => self.submit_user_message(&text).await,
            Command::ClearHistory => self.clear_history().await,
            Command::ResolveSession => self.ensure_session().await,
        }
    }

    /// Page-load entry point.
    ///
    /// Without a stored token the overlay goes up and nothing else happens.  With
    /// one, the session is resolved right away.
    pub async fn start(&mut self) -> Result<()> {
        if self.state.token().is_none() {
            tracing::debug!("no stored token; waiting for sign-in");
            self.view.show_overlay();
            return Ok(());
        }
        self.state.advance(Event::Authenticate)?;
        self.view.hide_overlay();
        self.ensure_session().await
    }

    /// Signs in with the submitted form.
    pub async fn login(&mut self, form: &CredentialForm) -> Result<()> {
        self.view.clear_errors();
        if self.state.phase() != Phase::Unauthenticated {
            self.view.show_popup(&self.catalog.already_signed_in);
            return Err(Error::state(format!(
                "cannot sign in while {}",
                self.state.phase()
            )));
        }
        let credentials = self.settle(form.validate(&self.catalog), String::new())?;

        self.state.advance(Event::Authenticate)?;
        let result = match self.backend.login(&credentials).await {
            Ok(token) => self.state.set_token(&token),
            Err(err) => Err(err),
        };
        if result.is_err() {
            self.state.advance(Event::Rejected)?;
        }
        let fallback = self.auth_fallback(&result, &self.catalog.login_failed);
        self.settle(result, fallback)?;
        tracing::info!(username = %credentials.username, "signed in");

        match self.ensure_session().await {
            Err(err) if err.is_authentication() => Err(err),
            result => {
                self.view.hide_overlay();
                result
            }
        }
    }

    /// Creates an account.  Does not sign in.
    pub async fn register(&mut self, form: &CredentialForm) -> Result<()> {
        self.view.clear_errors();
        let credentials = self.settle(form.validate(&self.catalog), String::new())?;

        let result = self.backend.register(&credentials).await;
        let fallback = self.auth_fallback(&result, &self.catalog.register_failed);
        self.settle(result, fallback)?;
        tracing::info!(username = %credentials.username, "registered");
        self.view
            .show_success(&self.catalog.registered, SUCCESS_NOTICE_DURATION);
        Ok(())
    }

    /// Resumes the stored session or creates and greets a new one.
    ///
    /// Calling this again without clearing storage takes the resume branch; it never
    /// creates a second session.
    pub async fn ensure_session(&mut self) -> Result<()> {
        if self.reopen_sign_in() {
            return Ok(());
        }
        let token = match self.require_token() {
            Ok(token) => token,
            Err(err) => return self.settle(Err(err), String::new()),
        };
        match self.state.session_id() {
            Some(session_id) => self.resume_session(&session_id).await,
            None => self.create_session(&token).await,
        }
    }

    async fn resume_session(&mut self, session_id: &SessionId) -> Result<()> {
        let reloading = self.state.phase().is_ready();
        self.state.advance(Event::Resolve { existing: true })?;
        self.state.advance(Event::LoadHistory)?;
        SESSIONS_RESUMED.click();
        if reloading {
            self.view.clear_messages();
        }
        match self.load_history(session_id).await {
            Ok(()) => {
                self.state.advance(Event::HistoryLoaded)?;
                Ok(())
            }
            Err(err) => self.abandon(err),
        }
    }

    async fn create_session(&mut self, token: &Token) -> Result<()> {
        self.state.advance(Event::Resolve { existing: false })?;
        let result = match self.backend.create_session(token).await {
            Ok(session_id) => self.state.set_session_id(&session_id).map(|()| session_id),
            Err(err) => Err(err),
        };
        let session_id = match self.settle(result, self.catalog.session_failed.clone()) {
            Ok(session_id) => session_id,
            Err(err) => return self.abandon(err),
        };
        SESSIONS_CREATED.click();
        tracing::info!(session_id = %session_id, "session created");

        self.state.advance(Event::SessionCreated)?;
        match self.seed_greeting().await {
            Ok(()) => {
                self.state.advance(Event::Greeted)?;
                Ok(())
            }
            Err(err) => self.abandon(err),
        }
    }

    /// Records a failed resolution step.  Expiry has already reset the phase.
    fn abandon(&mut self, err: Error) -> Result<()> {
        if !err.is_authentication() {
            self.state.advance(Event::Abandon)?;
        }
        Err(err)
    }

    /// Fetches a session's history and renders it in order.
    pub async fn load_history(&mut self, session_id: &SessionId) -> Result<()> {
        let result = match self.require_token() {
            Ok(token) => self.backend.history(&token, session_id).await,
            Err(err) => Err(err),
        };
        let messages = self.settle(result, self.catalog.history_failed.clone())?;
        tracing::debug!(session_id = %session_id, count = messages.len(), "history loaded");
        for message in &messages {
            self.view.append_history(message);
            MESSAGES_RENDERED.click();
        }
        Ok(())
    }

    /// Entry point for text typed by the user.
    ///
    /// Blank input is ignored, and so is input arriving while a send is
    /// outstanding.  Before sign-in the overlay is shown again instead.
    ///
    /// The terminal front-end awaits every dispatch before reading the next line,
    /// so it never reaches the drop branch; that branch serves front-ends that
    /// dispatch concurrently or hold the typing flag themselves.
    pub async fn submit_user_message(&mut self, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        if self.reopen_sign_in() {
            return Ok(());
        }
        if self.state.is_typing() {
            MESSAGES_DROPPED.click();
            tracing::debug!("message dropped while a send is outstanding");
            return Ok(());
        }
        self.view.append_message(SenderType::User, text);
        self.send_message(text, SenderType::User).await
    }

    /// Posts a message to the current session.
    ///
    /// For user messages the bot's answer is rendered.  The typing indicator is up
    /// for the duration of the request and comes down exactly once.
    pub async fn send_message(&mut self, text: &str, sender: SenderType) -> Result<()> {
        if !self.state.begin_send() {
            MESSAGES_DROPPED.click();
            tracing::debug!("send dropped while another is outstanding");
            return Ok(());
        }
        self.view.show_typing();
        let result = match self.outgoing(text, sender) {
            Ok((token, message)) => self.backend.send_message(&token, &message).await,
            Err(err) => Err(err),
        };
        self.state.end_send();
        self.view.hide_typing();

        let answer = self.settle(result, self.catalog.send_failed.clone())?;
        MESSAGES_SENT.click();
        if let Some(answer) = answer {
            self.view.append_message(SenderType::Bot, &answer);
        }
        if sender.is_user() && self.state.phase().is_ready() {
            self.state.advance(Event::Exchanged)?;
        }
        Ok(())
    }

    /// Wipes the conversation locally, then on the server, then re-seeds the greeting.
    ///
    /// The local view is cleared before the server confirms and is not restored if
    /// the delete fails.
    pub async fn clear_history(&mut self) -> Result<()> {
        if self.reopen_sign_in() {
            return Ok(());
        }
        if self.state.end_send() {
            self.view.hide_typing();
        }
        self.view.clear_messages();

        let result = match (self.require_token(), self.require_session()) {
            (Ok(token), Ok(session_id)) => self
                .backend
                .clear_history(&token, &session_id)
                .await
                .map(|()| session_id),
            (Err(err), _) | (_, Err(err)) => Err(err),
        };
        let session_id = self.settle(result, self.catalog.clear_failed.clone())?;
        tracing::info!(session_id = %session_id, "history cleared");
        self.seed_greeting().await
    }

    /// The single recovery path for a refused or missing token.
    pub fn handle_token_expired(&mut self) {
        TOKEN_EXPIRIES.click();
        tracing::warn!(phase = %self.state.phase(), "token expired; returning to sign-in");
        if let Err(err) = self.state.clear_token() {
            tracing::error!(error = %err, "could not remove the stored token");
        }
        if self.state.end_send() {
            self.view.hide_typing();
        }
        // Expired is accepted from every phase.
        let _ = self.state.advance(Event::Expired);
        self.view.show_popup(&self.catalog.session_expired);
        self.view.show_overlay();
        self.view.clear_messages();
    }

    async fn seed_greeting(&mut self) -> Result<()> {
        let greeting = self.catalog.greeting.clone();
        self.view.append_message(SenderType::Bot, &greeting);
        self.send_message(&greeting, SenderType::Bot).await
    }

    /// Before sign-in, puts the overlay back up and reports that the caller should stop.
    fn reopen_sign_in(&mut self) -> bool {
        if self.state.phase() != Phase::Unauthenticated {
            return false;
        }
        tracing::debug!("not signed in; showing the sign-in overlay");
        self.view.show_overlay();
        true
    }

    fn require_token(&self) -> Result<Token> {
        self.state
            .token()
            .ok_or_else(|| Error::authentication("no bearer token is stored"))
    }

    fn require_session(&self) -> Result<SessionId> {
        self.state
            .session_id()
            .ok_or_else(|| Error::no_session("no chat session has been created"))
    }

    fn outgoing(&self, text: &str, sender: SenderType) -> Result<(Token, MessageCreate)> {
        let token = self.require_token()?;
        let session_id = self.require_session()?;
        Ok((token, MessageCreate::new(session_id, sender, text)))
    }

    fn auth_fallback<T>(&self, result: &Result<T>, otherwise: &str) -> String {
        match result {
            Err(err) if err.is_unreachable() => self.catalog.connection_failed.clone(),
            _ => otherwise.to_string(),
        }
    }

    /// Presents `result`'s failure, if any, and passes the result through.
    fn settle<T>(&mut self, result: Result<T>, fallback: String) -> Result<T> {
        if let Err(err) = &result {
            self.present_failure(err, &fallback);
        }
        result
    }

    fn present_failure(&mut self, err: &Error, fallback: &str) {
        match err.class() {
            ErrorClass::AuthExpired => self.handle_token_expired(),
            ErrorClass::InvalidCredentials => {
                self.view.show_popup(&self.catalog.invalid_credentials);
            }
            ErrorClass::Conflict => self.view.show_popup(&self.catalog.user_exists),
            ErrorClass::ValidationFailed => {
                if let Error::Validation { errors } = err {
                    self.display_validation_errors(errors);
                }
            }
            ErrorClass::InvalidForm => {
                if let Error::FormInvalid { field, message } = err {
                    if self.view.has_field(field) {
                        self.view.show_field_error(field, message);
                    } else {
                        self.view.show_global_error(message);
                    }
                }
            }
            ErrorClass::Transport => {
                tracing::error!(error = %err, "{fallback}");
                self.view.show_popup(fallback);
            }
        }
    }

    fn display_validation_errors(&mut self, errors: &[ValidationError]) {
        for error in errors {
            let message = self.catalog.describe(error);
            match error.field() {
                Some(field) if self.view.has_field(field) => {
                    self.view.show_field_error(field, &message);
                }
                _ => self.view.show_global_error(&message),
            }
        }
    }
}
