//! The client-side session state machine.
//!
//! ```text
//! Unauthenticated -> Authenticating -> SessionNew -> Greeting -> Ready
//!                                   \-> SessionExisting -> HistoryLoading -> Ready
//! ```
//!
//! `Ready` loops on every exchange.  `Expired` returns any phase to
//! `Unauthenticated`.  [`SessionState`] owns the phase together with the busy flag
//! and the two persisted slots.

use std::fmt;

use crate::error::{Error, Result};
use crate::storage::{MemoryStorage, SESSION_ID_KEY, Storage, TOKEN_KEY};
use crate::types::{SessionId, Token};

/// Where the client is in the auth/session flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No usable token; the auth overlay is up.
    Unauthenticated,
    /// A token is being obtained or has been obtained, and no session is resolved yet.
    Authenticating,
    /// No stored session; one is being created.
    SessionNew,
    /// A session was created; the greeting is being seeded.
    Greeting,
    /// A stored session is about to be resumed.
    SessionExisting,
    /// The stored session's history is being fetched.
    HistoryLoading,
    /// The chat is usable.
    Ready,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Unauthenticated => "unauthenticated",
            Phase::Authenticating => "authenticating",
            Phase::SessionNew => "session-new",
            Phase::Greeting => "greeting",
            Phase::SessionExisting => "session-existing",
            Phase::HistoryLoading => "history-loading",
            Phase::Ready => "ready",
        };
        f.write_str(name)
    }
}

/// Something that happened to the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Credentials were submitted or a stored token was found.
    Authenticate,
    /// The login attempt failed.
    Rejected,
    /// Session resolution started; `existing` tells which branch.
    Resolve {
        /// Whether a session identifier was already stored.
        existing: bool,
    },
    /// The backend created a session.
    SessionCreated,
    /// The greeting was seeded.
    Greeted,
    /// History fetch started.
    LoadHistory,
    /// History was rendered.
    HistoryLoaded,
    /// A message round-trip completed.
    Exchanged,
    /// A non-auth failure ended the current step.
    Abandon,
    /// The backend refused the token.
    Expired,
}

impl Phase {
    /// Applies `event`, refusing transitions the flow does not allow.
    pub fn advance(self, event: Event) -> Result<Phase> {
        use Event as E;
        use Phase as P;
        let next = match (self, event) {
            (_, E::Expired) => P::Unauthenticated,
            (P::Unauthenticated, E::Authenticate) => P::Authenticating,
            (P::Authenticating, E::Rejected) => P::Unauthenticated,
            (P::Authenticating | P::Ready, E::Resolve { existing: true }) => P::SessionExisting,
            (P::Authenticating | P::Ready, E::Resolve { existing: false }) => P::SessionNew,
            (P::SessionNew, E::SessionCreated) => P::Greeting,
            (P::Greeting, E::Greeted) => P::Ready,
            (P::SessionExisting, E::LoadHistory) => P::HistoryLoading,
            (P::HistoryLoading, E::HistoryLoaded) => P::Ready,
            (P::Ready, E::Exchanged) => P::Ready,
            (P::SessionNew, E::Abandon) => P::Authenticating,
            (P::Greeting | P::SessionExisting | P::HistoryLoading, E::Abandon) => P::Ready,
            (from, event) => {
                return Err(Error::state(format!("{event:?} is not valid while {from}")));
            }
        };
        Ok(next)
    }

    /// True once a session has been resolved.
    pub fn is_ready(self) -> bool {
        self == Phase::Ready
    }
}

/// All mutable client state, owned by one controller.
pub struct SessionState {
    phase: Phase,
    is_typing: bool,
    durable: Box<dyn Storage>,
    volatile: MemoryStorage,
}

impl SessionState {
    /// Creates state over a durable store.  The volatile store starts empty.
    pub fn new(durable: Box<dyn Storage>) -> Self {
        Self {
            phase: Phase::Unauthenticated,
            is_typing: false,
            durable,
            volatile: MemoryStorage::new(),
        }
    }

    /// Creates state that keeps everything in memory.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::new()))
    }

    /// The current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Applies `event` to the phase.
    pub fn advance(&mut self, event: Event) -> Result<Phase> {
        let next = self.phase.advance(event)?;
        if next != self.phase {
            tracing::debug!(from = %self.phase, to = %next, ?event, "phase transition");
        }
        self.phase = next;
        Ok(next)
    }

    /// The stored bearer token.
    pub fn token(&self) -> Option<Token> {
        self.durable
            .get(TOKEN_KEY)
            .filter(|t| !t.is_empty())
            .map(Token::new)
    }

    /// Persists the bearer token.
    pub fn set_token(&mut self, token: &Token) -> Result<()> {
        self.durable.set(TOKEN_KEY, token.as_str())
    }

    /// Forgets the bearer token.
    pub fn clear_token(&mut self) -> Result<()> {
        self.durable.remove(TOKEN_KEY)
    }

    /// The stored session identifier.
    pub fn session_id(&self) -> Option<SessionId> {
        self.volatile
            .get(SESSION_ID_KEY)
            .filter(|s| !s.is_empty())
            .map(SessionId::new)
    }

    /// Persists the session identifier.
    pub fn set_session_id(&mut self, session_id: &SessionId) -> Result<()> {
        self.volatile.set(SESSION_ID_KEY, session_id.as_str())
    }

    /// Whether a send is outstanding.
    pub fn is_typing(&self) -> bool {
        self.is_typing
    }

    /// Marks a send as outstanding.  Returns false if one already is.
    pub fn begin_send(&mut self) -> bool {
        if self.is_typing {
            false
        } else {
            self.is_typing = true;
            true
        }
    }

    /// Marks the outstanding send as finished.  Returns true if one was outstanding.
    pub fn end_send(&mut self) -> bool {
        std::mem::replace(&mut self.is_typing, false)
    }
}
