//! User-facing text.
//!
//! A [`Catalog`] holds every string the controller shows, for one [`Locale`].
//! It also turns backend validation errors into readable messages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::types::ValidationError;

/// Languages the client ships text for.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English.
    #[default]
    En,
    /// Russian.
    Ru,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Locale::En),
            "ru" | "russian" => Ok(Locale::Ru),
            _ => Err(format!("unsupported locale: {s}")),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::En => f.write_str("en"),
            Locale::Ru => f.write_str("ru"),
        }
    }
}

/// Every string the controller presents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    /// Bot greeting that seeds every new or cleared session.
    pub greeting: String,
    /// Login refused.
    pub invalid_credentials: String,
    /// Registration collided with an existing username.
    pub user_exists: String,
    /// Registration succeeded.
    pub registered: String,
    /// The backend could not be reached during login or registration.
    pub connection_failed: String,
    /// Login failed for another reason.
    pub login_failed: String,
    /// Registration failed for another reason.
    pub register_failed: String,
    /// The token was refused mid-session.
    pub session_expired: String,
    /// Session creation failed.
    pub session_failed: String,
    /// History fetch failed.
    pub history_failed: String,
    /// Sending a message failed.
    pub send_failed: String,
    /// Clearing history failed.
    pub clear_failed: String,
    /// Login attempted while already signed in.
    pub already_signed_in: String,
    /// A required field was left empty.
    pub field_required: String,
    /// Display name of the username field.
    pub username_label: String,
    /// Display name of the password field.
    pub password_label: String,
    /// Username below the minimum length.
    pub username_too_short: String,
    /// Password below the minimum length.
    pub password_too_short: String,
    /// Username above the maximum length.
    pub username_too_long: String,
    /// Password above the maximum length.
    pub password_too_long: String,
    /// Fallback template; `{field}` and `{msg}` are substituted.
    pub field_error: String,
}

impl Catalog {
    /// Returns the catalog for `locale`.
    pub fn for_locale(locale: Locale) -> Self {
        match locale {
            Locale::En => Self::english(),
            Locale::Ru => Self::russian(),
        }
    }

    /// English text.
    pub fn english() -> Self {
        Self {
            greeting: "Hi! I'm the VResta restaurant bot. Type \"help\" or \"commands\" to see what I can do.".to_string(),
            invalid_credentials: "Invalid username or password".to_string(),
            user_exists: "A user with this username already exists".to_string(),
            registered: "Registration successful!".to_string(),
            connection_failed: "Could not connect to the server".to_string(),
            login_failed: "Sign-in failed.".to_string(),
            register_failed: "Registration failed.".to_string(),
            session_expired: "Your session has expired. Please sign in again.".to_string(),
            session_failed: "Could not create a chat session.".to_string(),
            history_failed: "Could not load the chat history. Please try again.".to_string(),
            send_failed: "Could not send the message.".to_string(),
            clear_failed: "Could not clear the chat history.".to_string(),
            already_signed_in: "You are already signed in.".to_string(),
            field_required: "This field is required".to_string(),
            username_label: "username".to_string(),
            password_label: "password".to_string(),
            username_too_short: "Username must be at least 4 characters".to_string(),
            password_too_short: "Password must be at least 6 characters".to_string(),
            username_too_long: "Username must be at most 20 characters".to_string(),
            password_too_long: "Password must be at most 32 characters".to_string(),
            field_error: "Error in field \"{field}\": {msg}".to_string(),
        }
    }

    /// Russian text.
    pub fn russian() -> Self {
        Self {
            greeting: "Привет! Я бот, который был создан для ресторана VResta. Если хотите узнать все команды, напишите помощь или команды.".to_string(),
            invalid_credentials: "Неверный логин или пароль".to_string(),
            user_exists: "Пользователь с таким логином уже существует".to_string(),
            registered: "Регистрация прошла успешно!".to_string(),
            connection_failed: "Ошибка подключения к серверу".to_string(),
            login_failed: "Ошибка при входе в систему.".to_string(),
            register_failed: "Ошибка при регистрации.".to_string(),
            session_expired: "Сессия истекла. Пожалуйста, войдите снова.".to_string(),
            session_failed: "Ошибка при создании сессии.".to_string(),
            history_failed: "Ошибка при загрузке истории. Попробуйте еще раз.".to_string(),
            send_failed: "Ошибка при отправке сообщения.".to_string(),
            clear_failed: "Ошибка при очистке истории.".to_string(),
            already_signed_in: "Вы уже вошли в систему.".to_string(),
            field_required: "Заполните это поле".to_string(),
            username_label: "логин".to_string(),
            password_label: "пароль".to_string(),
            username_too_short: "Логин должен содержать минимум 4 символа".to_string(),
            password_too_short: "Пароль должен содержать минимум 6 символов".to_string(),
            username_too_long: "Логин должен содержать не более 20 символов".to_string(),
            password_too_long: "Пароль должен содержать не более 32 символов".to_string(),
            field_error: "Ошибка в поле \"{field}\": {msg}".to_string(),
        }
    }

    /// Display name of a form field.
    pub fn field_label<'a>(&'a self, field: &'a str) -> &'a str {
        match field {
            "username" => &self.username_label,
            "password" => &self.password_label,
            _ => field,
        }
    }

    /// Turns a backend validation error into a message for the user.
    pub fn describe(&self, error: &ValidationError) -> String {
        let field = error.field().unwrap_or_default();
        match (error.r#type.as_str(), field) {
            ("string_too_short", "username") => self.username_too_short.clone(),
            ("string_too_short", "password") => self.password_too_short.clone(),
            ("string_too_long", "username") => self.username_too_long.clone(),
            ("string_too_long", "password") => self.password_too_long.clone(),
            _ => self
                .field_error
                .replace("{field}", self.field_label(field))
                .replace("{msg}", &error.msg),
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::english()
    }
}
