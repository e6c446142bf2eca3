//! Integration tests for the Ollama chat client
//!
//! The real HTTP client is exercised against an in-process axum server
//! that imitates `/api/chat`. The live test needs a running Ollama and is
//! marked #[ignore].

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use shellmate::ollama::ChatMessage;
use shellmate::{AssistantConfig, ModelClient, ModelError, OllamaChatClient};

type Captured = Arc<Mutex<Vec<Value>>>;

#[derive(Clone)]
struct MockOllama {
    status: StatusCode,
    body: String,
    captured: Captured,
}

async fn chat(State(mock): State<MockOllama>, Json(request): Json<Value>) -> impl IntoResponse {
    mock.captured.lock().unwrap().push(request);
    (mock.status, mock.body.clone())
}

/// Start a mock server and return a client config pointing at it
async fn serve(status: StatusCode, body: impl Into<String>) -> (AssistantConfig, Captured) {
    let captured: Captured = Arc::default();
    let mock = MockOllama {
        status,
        body: body.into(),
        captured: captured.clone(),
    };
    let app = Router::new().route("/api/chat", post(chat)).with_state(mock);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = AssistantConfig {
        base_url: format!("http://{}", addr),
        model: "test-model".to_string(),
        ..AssistantConfig::default()
    };
    (config, captured)
}

fn ollama_body(content: &str) -> String {
    json!({
        "model": "test-model",
        "message": { "role": "assistant", "content": content },
        "done": true
    })
    .to_string()
}

/// The client posts the whole history with JSON format and parses message.content
#[tokio::test]
async fn test_send_parses_reply_and_posts_full_history() {
    let (config, captured) = serve(
        StatusCode::OK,
        ollama_body(r#"{"commands": ["ls -la"], "explanation": "lists files"}"#),
    )
    .await;
    let client = OllamaChatClient::new(&config).unwrap();

    let history = vec![ChatMessage::system("sys"), ChatMessage::user("list files")];
    let reply = client.send(history).await.unwrap();

    assert_eq!(reply.commands, vec!["ls -la"]);
    assert_eq!(reply.explanation.as_deref(), Some("lists files"));

    let requests = captured.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request["model"], "test-model");
    assert_eq!(request["stream"], false);
    assert_eq!(request["format"], "json");
    assert_eq!(request["messages"].as_array().unwrap().len(), 2);
    assert_eq!(request["messages"][1]["role"], "user");
    assert_eq!(request["messages"][1]["content"], "list files");
}

/// A body that is itself the reply object is accepted
#[tokio::test]
async fn test_send_accepts_bare_reply_body() {
    let (config, _) = serve(StatusCode::OK, r#"{"commands": ["uptime"]}"#).await;
    let client = OllamaChatClient::new(&config).unwrap();

    let reply = client.send(vec![ChatMessage::user("load?")]).await.unwrap();
    assert_eq!(reply.commands, vec!["uptime"]);
}

/// Assistant text that is not JSON comes back as a malformed reply with the raw text
#[tokio::test]
async fn test_malformed_assistant_text_surfaces_raw() {
    let (config, _) = serve(StatusCode::OK, ollama_body("Sorry, I can't do that.")).await;
    let client = OllamaChatClient::new(&config).unwrap();

    let err = client.send(vec![ChatMessage::user("hi")]).await.unwrap_err();
    match err {
        ModelError::MalformedResponse { raw, .. } => assert_eq!(raw, "Sorry, I can't do that."),
        other => panic!("expected MalformedResponse, got {:?}", other),
    }
}

/// A 200 response without assistant text is an unusable body, not model output
#[tokio::test]
async fn test_success_status_with_error_body() {
    let (config, _) = serve(StatusCode::OK, r#"{"error":"model 'x' is loading"}"#).await;
    let client = OllamaChatClient::new(&config).unwrap();

    let err = client.send(vec![ChatMessage::user("hi")]).await.unwrap_err();
    assert!(matches!(err, ModelError::UnexpectedBody { .. }), "got {:?}", err);
    assert_eq!(err.raw_text(), Some(r#"{"error":"model 'x' is loading"}"#));
    assert_eq!(err.assistant_text(), None);
}

/// A non-success status is reported with its code and body
#[tokio::test]
async fn test_http_error_status() {
    let (config, _) = serve(StatusCode::NOT_FOUND, r#"{"error":"model 'test-model' not found"}"#).await;
    let client = OllamaChatClient::new(&config).unwrap();

    let err = client.send(vec![ChatMessage::user("hi")]).await.unwrap_err();
    match err {
        ModelError::Http { status, body } => {
            assert_eq!(status, 404);
            assert!(body.contains("not found"));
        }
        other => panic!("expected Http, got {:?}", other),
    }
}

/// A closed port is reported as unreachable
#[tokio::test]
async fn test_unreachable_endpoint() {
    // Bind then drop to get a port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = AssistantConfig {
        base_url: format!("http://{}", addr),
        ..AssistantConfig::default()
    };
    let client = OllamaChatClient::new(&config).unwrap();

    let err = client.send(vec![ChatMessage::user("hi")]).await.unwrap_err();
    assert!(matches!(err, ModelError::Unreachable { .. }), "got {:?}", err);
}

/// Round trip against a real local Ollama
#[tokio::test]
#[ignore = "Requires Ollama running"]
async fn test_live_ollama_round_trip() {
    let config = AssistantConfig::from_env().unwrap();
    let client = OllamaChatClient::new(&config).unwrap();
    let history = vec![
        ChatMessage::system(r#"Reply only with {"commands": ["echo hi"]}"#),
        ChatMessage::user("say hi"),
    ];

    let reply = client.send(history).await.unwrap();
    assert!(!reply.commands.is_empty() || reply.question.is_some());
}
