//! Relay client against a local mock of the completions endpoint.

mod support;

use std::time::Duration;

use relaybot::relay::{Client, Error, RelaySettings};
use support::MockServer;

fn settings(url: String, timeout: Duration) -> RelaySettings {
    RelaySettings {
        api_url: url,
        model: "openai/gpt-3.5-turbo".to_string(),
        max_tokens: 1000,
        temperature: 0.7,
        timeout,
    }
}

fn client(server: &MockServer) -> Client {
    Client::new(
        Some("sk-or-test".to_string()),
        settings(server.url(), Duration::from_secs(5)),
    )
    .unwrap()
}

#[tokio::test]
async fn test_returns_first_completion() {
    let server = MockServer::start(
        200,
        r#"{"choices":[{"message":{"content":"4"}}]}"#,
        Duration::ZERO,
    )
    .await;

    let answer = client(&server).relay("What is 2+2?").await.unwrap();
    assert_eq!(answer, "4");
}

#[tokio::test]
async fn test_sends_one_request_with_expected_body() {
    let server = MockServer::start(
        200,
        r#"{"choices":[{"message":{"content":"4"}}]}"#,
        Duration::ZERO,
    )
    .await;

    client(&server).relay("What is 2+2?").await.unwrap();

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let head = requests[0].head.to_lowercase();
    assert!(head.starts_with("post /api/v1/chat/completions"));
    assert!(head.contains("authorization: bearer sk-or-test"));
    assert!(head.contains("content-type: application/json"));

    let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
    assert_eq!(body["model"], "openai/gpt-3.5-turbo");
    assert_eq!(
        body["messages"],
        serde_json::json!([{"role": "user", "content": "What is 2+2?"}])
    );
    assert_eq!(body["max_tokens"], 1000);
}

#[tokio::test]
async fn test_missing_choices_is_malformed() {
    let server = MockServer::start(200, r#"{"id":"gen-1"}"#, Duration::ZERO).await;
    let err = client(&server).relay("hi").await.unwrap_err();
    assert!(matches!(err, Error::MalformedResponse(_)));
    assert_eq!(err.user_message(), "❌ No response from AI.");
    assert_eq!(server.requests().len(), 1);
}

#[tokio::test]
async fn test_error_status_is_transport() {
    let server = MockServer::start(
        401,
        r#"{"error":{"message":"No auth credentials found","code":401}}"#,
        Duration::ZERO,
    )
    .await;
    let err = client(&server).relay("hi").await.unwrap_err();
    match err {
        Error::Transport(ref msg) => {
            assert!(msg.contains("401"));
            assert!(msg.contains("No auth credentials found"));
        }
        other => panic!("expected Transport, got {other:?}"),
    }
    assert_eq!(server.requests().len(), 1);
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let server = MockServer::start(
        200,
        r#"{"choices":[{"message":{"content":"late"}}]}"#,
        Duration::from_secs(3),
    )
    .await;
    let client = Client::new(
        Some("sk-or-test".to_string()),
        settings(server.url(), Duration::from_millis(300)),
    )
    .unwrap();

    let err = client.relay("hi").await.unwrap_err();
    assert!(matches!(err, Error::Timeout), "got {err:?}");
}

#[tokio::test]
async fn test_connection_refused_is_transport() {
    // Bind then drop to get a port nobody listens on
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = Client::new(
        Some("sk-or-test".to_string()),
        settings(format!("http://127.0.0.1:{port}/"), Duration::from_secs(2)),
    )
    .unwrap();

    let err = client.relay("hi").await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn test_unconfigured_sends_nothing() {
    let server = MockServer::start(
        200,
        r#"{"choices":[{"message":{"content":"4"}}]}"#,
        Duration::ZERO,
    )
    .await;
    let client = Client::new(None, settings(server.url(), Duration::from_secs(5))).unwrap();

    let err = client.relay("What is 2+2?").await.unwrap_err();
    assert!(matches!(err, Error::NotConfigured));
    assert!(server.requests().is_empty());
}
