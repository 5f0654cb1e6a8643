//! Error types for chatgate.
//!
//! Every failure the client can observe, whether it comes from the backend, the
//! network, local storage, or the session state machine, is an [`Error`].  The
//! controller never inspects status codes itself; it asks an error for its
//! [`ErrorClass`] and presents it accordingly.

use std::error;
use std::fmt;
use std::io;
use std::sync::Arc;

use crate::types::ValidationError;

/// How a failure is presented to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// The bearer token was refused (or is missing) on an authenticated call.
    AuthExpired,
    /// The login endpoint refused the username/password pair.
    InvalidCredentials,
    /// The backend rejected one or more fields.
    ValidationFailed,
    /// Registration collided with an existing user.
    Conflict,
    /// The form failed client-side validation; nothing was sent.
    InvalidForm,
    /// Network failure, undecodable response, unexpected status, or a local fault.
    Transport,
}

/// The main error type for chatgate.
#[derive(Clone, Debug)]
pub enum Error {
    /// The backend answered with an unexpected non-success status.
    Api {
        /// HTTP status code.
        status_code: u16,
        /// Response body or a description of it.
        message: String,
    },

    /// An authenticated call was refused; the token is expired or invalid.
    Authentication {
        /// Human-readable error message.
        message: String,
    },

    /// The login endpoint refused the credentials.
    InvalidCredentials {
        /// Human-readable error message.
        message: String,
    },

    /// The resource already exists (duplicate username on registration).
    Conflict {
        /// Human-readable error message.
        message: String,
    },

    /// The backend reported field-level validation errors.
    Validation {
        /// Errors in the order the backend reported them.
        errors: Vec<ValidationError>,
    },

    /// A required form field is missing.
    FormInvalid {
        /// The offending field.
        field: String,
        /// Human-readable error message.
        message: String,
    },

    /// An operation needed a chat session and none is stored.
    NoSession {
        /// Human-readable error message.
        message: String,
    },

    /// The session state machine refused a transition.
    State {
        /// Human-readable error message.
        message: String,
    },

    /// The request did not complete within the client timeout.
    Timeout {
        /// Human-readable error message.
        message: String,
        /// Duration of the timeout in seconds.
        duration: Option<f64>,
    },

    /// The backend could not be reached.
    Connection {
        /// Human-readable error message.
        message: String,
        /// Underlying cause.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// The HTTP client failed for another reason.
    HttpClient {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// JSON or YAML could not be produced or parsed.
    Serialization {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// I/O error.
    Io {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Arc<io::Error>,
    },

    /// A URL parsing or manipulation error.
    Url {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<url::ParseError>,
    },
}

impl Error {
    /// Creates a new API error.
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        Error::Api {
            status_code,
            message: message.into(),
        }
    }

    /// Creates a new authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Error::Authentication {
            message: message.into(),
        }
    }

    /// Creates a new invalid credentials error.
    pub fn invalid_credentials(message: impl Into<String>) -> Self {
        Error::InvalidCredentials {
            message: message.into(),
        }
    }

    /// Creates a new conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Error::Conflict {
            message: message.into(),
        }
    }

    /// Creates a new validation error.
    pub fn validation(errors: Vec<ValidationError>) -> Self {
        Error::Validation { errors }
    }

    /// Creates a new form error.
    pub fn form_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::FormInvalid {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a new missing-session error.
    pub fn no_session(message: impl Into<String>) -> Self {
        Error::NoSession {
            message: message.into(),
        }
    }

    /// Creates a new state error.
    pub fn state(message: impl Into<String>) -> Self {
        Error::State {
            message: message.into(),
        }
    }

    /// Creates a new timeout error.
    pub fn timeout(message: impl Into<String>, duration: Option<f64>) -> Self {
        Error::Timeout {
            message: message.into(),
            duration,
        }
    }

    /// Creates a new connection error.
    pub fn connection(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Connection {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new HTTP client error.
    pub fn http_client(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::HttpClient {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new serialization error.
    pub fn serialization(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Serialization {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new I/O error.
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Error::Io {
            message: message.into(),
            source: Arc::new(source),
        }
    }

    /// Creates a new URL error.
    pub fn url(message: impl Into<String>, source: Option<url::ParseError>) -> Self {
        Error::Url {
            message: message.into(),
            source,
        }
    }

    /// Returns the presentation class of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::Authentication { .. } => ErrorClass::AuthExpired,
            Error::InvalidCredentials { .. } => ErrorClass::InvalidCredentials,
            Error::Validation { .. } => ErrorClass::ValidationFailed,
            Error::Conflict { .. } => ErrorClass::Conflict,
            Error::FormInvalid { .. } => ErrorClass::InvalidForm,
            _ => ErrorClass::Transport,
        }
    }

    /// Returns true if this error means the token must be discarded.
    pub fn is_authentication(&self) -> bool {
        matches!(self, Error::Authentication { .. })
    }

    /// Returns true if this error is a conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }

    /// Returns true if this error carries backend validation errors.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }

    /// Returns true if this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// Returns true if the backend was never reached or never answered.
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            Error::Connection { .. } | Error::Timeout { .. } | Error::HttpClient { .. }
        )
    }

    /// Returns the status code associated with this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api { status_code, .. } => Some(*status_code),
            Error::Authentication { .. } | Error::InvalidCredentials { .. } => Some(401),
            Error::Conflict { .. } => Some(400),
            Error::Validation { .. } => Some(422),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Api {
                status_code,
                message,
            } => {
                write!(f, "API error ({status_code}): {message}")
            }
            Error::Authentication { message } => {
                write!(f, "Authentication error: {message}")
            }
            Error::InvalidCredentials { message } => {
                write!(f, "Invalid credentials: {message}")
            }
            Error::Conflict { message } => {
                write!(f, "Conflict: {message}")
            }
            Error::Validation { errors } => {
                write!(f, "Validation failed:")?;
                for (idx, err) in errors.iter().enumerate() {
                    let sep = if idx == 0 { " " } else { "; " };
                    write!(f, "{sep}{}: {}", err.field().unwrap_or("?"), err.msg)?;
                }
                Ok(())
            }
            Error::FormInvalid { field, message } => {
                write!(f, "Invalid form: {message} (field: {field})")
            }
            Error::NoSession { message } => {
                write!(f, "No session: {message}")
            }
            Error::State { message } => {
                write!(f, "State error: {message}")
            }
            Error::Timeout { message, duration } => {
                if let Some(duration) = duration {
                    write!(f, "Timeout error: {message} ({duration} seconds)")
                } else {
                    write!(f, "Timeout error: {message}")
                }
            }
            Error::Connection { message, .. } => {
                write!(f, "Connection error: {message}")
            }
            Error::HttpClient { message, .. } => {
                write!(f, "HTTP client error: {message}")
            }
            Error::Serialization { message, .. } => {
                write!(f, "Serialization error: {message}")
            }
            Error::Io { message, .. } => {
                write!(f, "I/O error: {message}")
            }
            Error::Url { message, .. } => {
                write!(f, "URL error: {message}")
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Connection { source, .. }
            | Error::HttpClient { source, .. }
            | Error::Serialization { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::Io { source, .. } => Some(source),
            Error::Url { source, .. } => {
                source.as_ref().map(|e| e as &(dyn error::Error + 'static))
            }
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::io(err.to_string(), err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::serialization(format!("JSON error: {err}"), Some(Box::new(err)))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::serialization(format!("YAML error: {err}"), Some(Box::new(err)))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::url(format!("URL parse error: {err}"), Some(err))
    }
}

/// A specialized Result type for chatgate operations.
pub type Result<T> = std::result::Result<T, Error>;
