use std::env;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{Error, Result};
use crate::observability::{
    CLIENT_AUTH_EXPIRED, CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS,
};
use crate::types::{
    AccessTokenResponse, BotAnswer, ChatMessage, Credentials, MessageCreate, SessionCreated,
    SessionId, Token, ValidationErrorResponse,
};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Environment variable consulted when no base URL is given.
pub const BASE_URL_ENV: &str = "CHATGATE_BASE_URL";

/// The chat/auth backend as the controller sees it.
///
/// [`ChatClient`] talks HTTP; tests substitute an in-memory implementation.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// `POST /auth/login`; yields the bearer token.
    async fn login(&self, credentials: &Credentials) -> Result<Token>;

    /// `POST /auth/register`.
    async fn register(&self, credentials: &Credentials) -> Result<()>;

    /// `POST /chat/session`; yields the new session's identifier.
    async fn create_session(&self, token: &Token) -> Result<SessionId>;

    /// `GET /chat/history/{session_id}`; messages in the order they were stored.
    async fn history(&self, token: &Token, session_id: &SessionId) -> Result<Vec<ChatMessage>>;

    /// `DELETE /chat/history/{session_id}`.
    async fn clear_history(&self, token: &Token, session_id: &SessionId) -> Result<()>;

    /// `POST /chat/message`; yields the bot's answer for user messages and `None`
    /// for bot messages.
    async fn send_message(&self, token: &Token, message: &MessageCreate)
    -> Result<Option<String>>;
}

/// Which family an endpoint belongs to.  It decides what a 400 or 401 means.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Access {
    /// The login endpoint: 401 means bad credentials.
    Login,
    /// The registration endpoint: 400 means the user exists.
    Register,
    /// Any call carrying the bearer token: 401 means the token is no good.
    Bearer,
}

/// HTTP client for the chat/auth backend.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
}

impl ChatClient {
    /// Create a new client.
    ///
    /// The base URL can be provided directly or read from the CHATGATE_BASE_URL
    /// environment variable; it defaults to a backend on localhost.
    pub fn new(base_url: Option<String>) -> Result<Self> {
        Self::with_options(base_url, None)
    }

    /// Create a new client with custom settings.
    pub fn with_options(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = match base_url {
            Some(url) => url,
            None => env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
        };
        let base_url = normalize_base_url(&base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// The URL every endpoint path is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn history_url(&self, session_id: &SessionId) -> Result<Url> {
        let mut url = self.endpoint("chat/history/")?;
        url.path_segments_mut()
            .map_err(|_| Error::url("base URL cannot carry a path", None))?
            .pop_if_empty()
            .push(session_id.as_str());
        Ok(url)
    }

    /// Send a request and turn every non-success outcome into an [`Error`].
    ///
    /// This is the only place status codes are interpreted.
    async fn execute(&self, request: RequestBuilder, access: Access) -> Result<Response> {
        CLIENT_REQUESTS.click();
        let started = Instant::now();
        let result = request.send().await;
        CLIENT_REQUEST_DURATION.add(started.elapsed().as_secs_f64());

        let response = result.map_err(|e| {
            CLIENT_REQUEST_ERRORS.click();
            tracing::warn!(error = %e, "request failed before a response arrived");
            if e.is_timeout() {
                Error::timeout(
                    format!("Request timed out: {}", e),
                    Some(self.timeout.as_secs_f64()),
                )
            } else if e.is_connect() {
                Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
            } else {
                Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
            }
        })?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), url = %response.url(), "response");
        if status.is_success() {
            return Ok(response);
        }

        CLIENT_REQUEST_ERRORS.click();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Err(Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                ));
            }
        };
        let err = classify(status.as_u16(), &body, access);
        if err.is_authentication() {
            CLIENT_AUTH_EXPIRED.click();
        }
        tracing::warn!(status = status.as_u16(), error = %err, "backend refused request");
        Err(err)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        response.json::<T>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })
    }
}

#[async_trait]
impl ChatBackend for ChatClient {
    async fn login(&self, credentials: &Credentials) -> Result<Token> {
        let url = self.endpoint("auth/login")?;
        let request = self.client.post(url).json(credentials);
        let response = self.execute(request, Access::Login).await?;
        let body: AccessTokenResponse = Self::decode(response).await?;
        if let Some(scheme) = body.token_type.as_deref()
            && !scheme.eq_ignore_ascii_case("bearer")
        {
            tracing::warn!(
                token_type = scheme,
                "login issued a non-bearer token; sending it as bearer"
            );
        }
        Ok(Token::new(body.access_token))
    }

    async fn register(&self, credentials: &Credentials) -> Result<()> {
        let url = self.endpoint("auth/register")?;
        let request = self.client.post(url).json(credentials);
        self.execute(request, Access::Register).await?;
        Ok(())
    }

    async fn create_session(&self, token: &Token) -> Result<SessionId> {
        let url = self.endpoint("chat/session")?;
        let request = self.client.post(url).bearer_auth(token.as_str());
        let response = self.execute(request, Access::Bearer).await?;
        let body: SessionCreated = Self::decode(response).await?;
        Ok(body.id)
    }

    async fn history(&self, token: &Token, session_id: &SessionId) -> Result<Vec<ChatMessage>> {
        let url = self.history_url(session_id)?;
        let request = self.client.get(url).bearer_auth(token.as_str());
        let response = self.execute(request, Access::Bearer).await?;
        Self::decode(response).await
    }

    async fn clear_history(&self, token: &Token, session_id: &SessionId) -> Result<()> {
        let url = self.history_url(session_id)?;
        let request = self.client.delete(url).bearer_auth(token.as_str());
        self.execute(request, Access::Bearer).await?;
        Ok(())
    }

    async fn send_message(
        &self,
        token: &Token,
        message: &MessageCreate,
    ) -> Result<Option<String>> {
        let url = self.endpoint("chat/message")?;
        let request = self
            .client
            .post(url)
            .bearer_auth(token.as_str())
            .json(message);
        let response = self.execute(request, Access::Bearer).await?;
        if message.sender_type.is_user() {
            let body: BotAnswer = Self::decode(response).await?;
            Ok(Some(body.answer))
        } else {
            Ok(None)
        }
    }
}

/// Map a non-success status and its body onto the error taxonomy.
pub(crate) fn classify(status: u16, body: &str, access: Access) -> Error {
    #[derive(Deserialize)]
    struct Detail {
        detail: String,
    }

    let message = serde_json::from_str::<Detail>(body)
        .map(|d| d.detail)
        .unwrap_or_else(|_| body.to_string());

    match (status, access) {
        (401, Access::Login) => Error::invalid_credentials(message),
        (401, Access::Bearer) => Error::authentication(message),
        (400, Access::Register) => Error::conflict(message),
        (422, _) => match serde_json::from_str::<ValidationErrorResponse>(body) {
            Ok(parsed) => Error::validation(parsed.detail),
            Err(_) => Error::api(status, message),
        },
        (408, _) => Error::timeout(message, None),
        _ => Error::api(status, message),
    }
}

fn normalize_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)?;
    if url.cannot_be_a_base() {
        return Err(Error::url(format!("{raw} cannot be a base URL"), None));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
