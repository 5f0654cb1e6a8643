//! Request and response bodies that only exist on the wire.

use serde::{Deserialize, Serialize};

use crate::types::{SenderType, SessionId};

/// Successful login response.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AccessTokenResponse {
    /// The bearer token.
    pub access_token: String,
    /// Token scheme; anything but `bearer` is logged and then used as bearer anyway.
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Successful session-creation response.
///
/// The backend returns the whole session record; only the id matters here.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SessionCreated {
    /// Identifier of the new session.
    pub id: SessionId,
}

/// Body of `POST /chat/message`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MessageCreate {
    /// Session the message belongs to.
    pub session_id: SessionId,
    /// Author of the message.
    pub sender_type: SenderType,
    /// Message body.
    pub text: String,
}

impl MessageCreate {
    /// Creates a message body.
    pub fn new(session_id: SessionId, sender_type: SenderType, text: impl Into<String>) -> Self {
        Self {
            session_id,
            sender_type,
            text: text.into(),
        }
    }
}

/// Bot reply to a user message.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BotAnswer {
    /// The reply text.
    pub answer: String,
}
