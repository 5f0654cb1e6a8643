//! `ChatClient` against a mock HTTP backend.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use chatgate::{
    ChatBackend, ChatClient, Credentials, ErrorClass, MessageCreate, SenderType, SessionId,
    Token,
};

fn client_for(server: &MockServer, base_path: &str) -> ChatClient {
    ChatClient::with_options(
        Some(format!("{}{base_path}", server.uri())),
        Some(Duration::from_secs(5)),
    )
    .unwrap()
}

fn ann() -> Credentials {
    Credentials::new("ann", "secret1")
}

fn detail(message: &str) -> ResponseTemplate {
    ResponseTemplate::new(401).set_body_json(json!({ "detail": message }))
}

#[tokio::test]
async fn login_posts_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"username": "ann", "password": "secret1"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "t1", "token_type": "bearer"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server, "");

    let token = client.login(&ann()).await.unwrap();

    assert_eq!(token.as_str(), "t1");
    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn other_token_schemes_are_still_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "t1", "token_type": "mac"})),
        )
        .mount(&server)
        .await;
    let client = client_for(&server, "");

    let token = client.login(&ann()).await.unwrap();

    assert_eq!(token.as_str(), "t1");
}

#[tokio::test]
async fn paths_resolve_under_base_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "t1"})))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server, "/api");

    client.login(&ann()).await.unwrap();
}

#[tokio::test]
async fn login_401_is_invalid_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(detail("Incorrect username or password"))
        .mount(&server)
        .await;
    let client = client_for(&server, "");

    let err = client.login(&ann()).await.unwrap_err();

    assert_eq!(err.class(), ErrorClass::InvalidCredentials);
    assert!(!err.is_authentication());
}

#[tokio::test]
async fn register_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .and(body_json(json!({"username": "ann", "password": "secret1"})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"id": 1, "username": "ann"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server, "");

    client.register(&ann()).await.unwrap();
}

#[tokio::test]
async fn register_400_is_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"detail": "Username already registered"})),
        )
        .mount(&server)
        .await;
    let client = client_for(&server, "");

    let err = client.register(&ann()).await.unwrap_err();

    assert!(err.is_conflict());
    assert_eq!(err.class(), ErrorClass::Conflict);
}

#[tokio::test]
async fn register_422_carries_field_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": [{
                "loc": ["body", "username"],
                "msg": "String should have at least 4 characters",
                "type": "string_too_short"
            }]
        })))
        .mount(&server)
        .await;
    let client = client_for(&server, "");

    let err = client
        .register(&Credentials::new("an", "secret1"))
        .await
        .unwrap_err();

    assert_eq!(err.class(), ErrorClass::ValidationFailed);
    match err {
        chatgate::Error::Validation { errors } => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].field(), Some("username"));
            assert_eq!(errors[0].r#type, "string_too_short");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn session_and_history_use_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/session"))
        .and(header("authorization", "Bearer t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "s1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/chat/history/s1"))
        .and(header("authorization", "Bearer t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"sender_type": "bot", "text": "hello", "sent_at": "2024-05-01T12:00:00"},
            {"sender_type": "user", "text": "hi", "sent_at": null}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/chat/history/s1"))
        .and(header("authorization", "Bearer t1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"detail": "History cleared"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server, "");
    let token = Token::new("t1");

    let session_id = client.create_session(&token).await.unwrap();
    assert_eq!(session_id.as_str(), "s1");

    let history = client.history(&token, &session_id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].sender_type, SenderType::Bot);
    assert_eq!(history[0].text, "hello");
    assert!(history[0].sent_at.is_some());
    assert_eq!(history[1].sender_type, SenderType::User);
    assert!(history[1].sent_at.is_none());

    client.clear_history(&token, &session_id).await.unwrap();
}

#[tokio::test]
async fn session_id_is_one_path_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/chat/history/a%2Fb"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server, "");

    let history = client
        .history(&Token::new("t1"), &SessionId::new("a/b"))
        .await
        .unwrap();

    assert!(history.is_empty());
}

#[tokio::test]
async fn send_message_bodies_and_answers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/message"))
        .and(header("authorization", "Bearer t1"))
        .and(body_json(
            json!({"session_id": "s1", "sender_type": "user", "text": "hi"}),
        ))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"answer": "echo: hi"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/message"))
        .and(body_json(
            json!({"session_id": "s1", "sender_type": "bot", "text": "Hi!"}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .expect(1)
        .mount(&server)
        .await;
    let client = client_for(&server, "");
    let token = Token::new("t1");
    let session_id = SessionId::new("s1");

    let answer = client
        .send_message(
            &token,
            &MessageCreate::new(session_id.clone(), SenderType::User, "hi"),
        )
        .await
        .unwrap();
    assert_eq!(answer.as_deref(), Some("echo: hi"));

    let answer = client
        .send_message(&token, &MessageCreate::new(session_id, SenderType::Bot, "Hi!"))
        .await
        .unwrap();
    assert!(answer.is_none());
}

#[tokio::test]
async fn bearer_401_is_auth_expired() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/session"))
        .respond_with(detail("Could not validate credentials"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/chat/history/s1"))
        .respond_with(detail("Could not validate credentials"))
        .mount(&server)
        .await;
    let client = client_for(&server, "");
    let token = Token::new("stale");

    let err = client.create_session(&token).await.unwrap_err();
    assert!(err.is_authentication());
    assert_eq!(err.status_code(), Some(401));

    let err = client
        .history(&token, &SessionId::new("s1"))
        .await
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::AuthExpired);
}

#[tokio::test]
async fn server_error_is_transport() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/session"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;
    let client = client_for(&server, "");

    let err = client.create_session(&Token::new("t1")).await.unwrap_err();

    assert_eq!(err.class(), ErrorClass::Transport);
    assert_eq!(err.status_code(), Some(500));
}

#[tokio::test]
async fn refused_connection_is_unreachable() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = ChatClient::new(Some(format!("http://{addr}/"))).unwrap();

    let err = client.login(&ann()).await.unwrap_err();

    assert!(err.is_unreachable());
    assert_eq!(err.class(), ErrorClass::Transport);
}
