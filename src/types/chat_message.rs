use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::SenderType;

/// A message as stored in a session's history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    /// Who wrote the message.
    pub sender_type: SenderType,

    /// The message body.
    pub text: String,

    /// When the backend recorded the message, if it says.
    #[serde(
        default,
        with = "crate::utils::time::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub sent_at: Option<OffsetDateTime>,
}

impl ChatMessage {
    /// Creates a message without a timestamp.
    pub fn new(sender_type: SenderType, text: impl Into<String>) -> Self {
        Self {
            sender_type,
            text: text.into(),
            sent_at: None,
        }
    }
}
