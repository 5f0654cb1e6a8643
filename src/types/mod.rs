// Public modules
pub mod chat_message;
pub mod credentials;
pub mod sender_type;
pub mod session_id;
pub mod token;
pub mod validation_error;
pub mod wire;

// Re-exports
pub use chat_message::ChatMessage;
pub use credentials::Credentials;
pub use sender_type::SenderType;
pub use session_id::SessionId;
pub use token::Token;
pub use validation_error::{LocSegment, ValidationError, ValidationErrorResponse};
pub use wire::{AccessTokenResponse, BotAnswer, MessageCreate, SessionCreated};
