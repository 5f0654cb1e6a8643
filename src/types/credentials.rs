use std::fmt;

use serde::Serialize;

/// Username and password posted to the login and registration endpoints.
#[derive(Clone, Serialize, PartialEq, Eq)]
pub struct Credentials {
    /// Account name.
    pub username: String,
    /// Account password, sent as-is.
    pub password: String,
}

impl Credentials {
    /// Creates a credential pair.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_shape() {
        let json = serde_json::to_value(Credentials::new("ann", "secret1")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"username": "ann", "password": "secret1"})
        );
    }

    #[test]
    fn debug_hides_password() {
        let debug = format!("{:?}", Credentials::new("ann", "secret1"));
        assert!(debug.contains("ann"));
        assert!(!debug.contains("secret1"));
    }
}
