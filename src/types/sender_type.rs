use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SenderType {
    /// The person typing into the chat.
    User,
    /// The backend bot, including the locally seeded greeting.
    Bot,
}

impl SenderType {
    /// Returns true for [`SenderType::User`].
    pub fn is_user(self) -> bool {
        matches!(self, SenderType::User)
    }

    /// Returns the wire name of the sender.
    pub fn as_str(self) -> &'static str {
        match self {
            SenderType::User => "user",
            SenderType::Bot => "bot",
        }
    }
}

impl fmt::Display for SenderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SenderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(SenderType::User),
            "bot" => Ok(SenderType::Bot),
            _ => Err(format!("unknown sender type: {s}")),
        }
    }
}
