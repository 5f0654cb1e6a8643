//! Client-side checks on the credential form.
//!
//! Only presence is checked here; length and format rules belong to the backend,
//! which answers with 422 and a list of [`ValidationError`](crate::types::ValidationError).

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::types::Credentials;

/// Field id of the username input.
pub const USERNAME_FIELD: &str = "username";

/// Field id of the password input.
pub const PASSWORD_FIELD: &str = "password";

/// The login/registration form as the user filled it in.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CredentialForm {
    /// Raw username input.
    pub username: String,
    /// Raw password input.
    pub password: String,
}

impl CredentialForm {
    /// Creates a form.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Checks required fields in input order and yields the credentials to post.
    ///
    /// The username is trimmed before the check; the password is taken verbatim.
    pub fn validate(&self, catalog: &Catalog) -> Result<Credentials> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(Error::form_invalid(USERNAME_FIELD, &catalog.field_required));
        }
        if self.password.is_empty() {
            return Err(Error::form_invalid(PASSWORD_FIELD, &catalog.field_required));
        }
        Ok(Credentials::new(username, self.password.clone()))
    }
}

impl std::fmt::Debug for CredentialForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialForm")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}
