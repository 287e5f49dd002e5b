use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::json;
use video_gpt::AppState;
use video_gpt::config::AppConfig;
use video_gpt::server::router;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// App wired to a mocked backend.
struct Harness {
    server: TestServer,
    state: AppState,
    backend: MockServer,
}

async fn harness() -> Harness {
    let backend = MockServer::start().await;
    let (server, state) = app(&backend.uri());

    Harness {
        server,
        state,
        backend,
    }
}

fn app(backend_url: &str) -> (TestServer, AppState) {
    let config = AppConfig::load_from_args([
        "video-gpt",
        "--backend-url",
        backend_url,
        "--locale",
        "en-US",
    ])
    .expect("config");
    let state = AppState::from_config(Arc::new(config)).expect("state");
    let server = TestServer::new(router(state.clone())).expect("test server");
    (server, state)
}

/// A local address with nothing listening on it.
fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}")
}

fn htmx() -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("hx-request"),
        HeaderValue::from_static("true"),
    )
}

/// Undo attribute-safe entity escaping so assertions read naturally.
fn decoded(html: &str) -> String {
    html.replace("&#x2f;", "/")
        .replace("&#x27;", "'")
        .replace("&quot;", "\"")
}

#[tokio::test]
async fn test_index_renders_greeting() {
    let h = harness().await;

    let response = h.server.get("/").await;
    response.assert_status_ok();

    let html = decoded(&response.text());
    assert!(html.contains("Video-GPT"));
    assert!(html.contains("learn python decorators"));
    assert!(html.contains("Ask a query to see video results."));
    assert_eq!(h.state.sessions.len(), 1);
}

#[tokio::test]
async fn test_successful_query_renders_card() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(body_json(json!({ "message": "learn python decorators" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": "learn python decorators",
            "results": [{
                "video_id": "dQw4",
                "title": "Python Decorators Explained",
                "channel": "Corey Schafer",
                "published_at": "2016-07-14T15:00:00Z",
                "thumbnail": "https://i.ytimg.com/vi/dQw4/mqdefault.jpg",
                "views": 1_234_567,
                "likes": 0,
                "url": "https://www.youtube.com/watch?v=dQw4"
            }]
        })))
        .expect(1)
        .mount(&h.backend)
        .await;

    let session = h.state.sessions.create();
    let (name, value) = htmx();
    let response = h
        .server
        .post("/chat")
        .add_header(name, value)
        .form(&json!({
            "session_id": session.id(),
            "message": "  learn python decorators ",
        }))
        .await;
    response.assert_status_ok();

    let html = decoded(&response.text());
    assert!(html.starts_with(r#"<main id="chat""#));
    assert!(html.contains("1,234,567 views"));
    assert!(html.contains("7/14/2016"));
    assert!(html.contains("Python Decorators Explained"));
    assert!(!html.contains("window.alert("));

    let state: serde_json::Value = h
        .server
        .get(&format!("/api/sessions/{}/messages", session.id()))
        .await
        .json();
    let messages = state["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1]["role"], "user");
    assert_eq!(messages[1]["text"], "learn python decorators");
    assert_eq!(messages[2]["role"], "assistant");
    assert_eq!(messages[2]["query"], "learn python decorators");
    assert_eq!(messages[2]["videos"][0]["views"], 1_234_567);
    assert_eq!(state["pending"], false);
    assert!(session.transcript().input().is_empty());
}

#[tokio::test]
async fn test_backend_failure_notifies_and_records_sentinel() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(503).set_body_string("service unavailable"))
        .mount(&h.backend)
        .await;

    let session = h.state.sessions.create();
    let (name, value) = htmx();
    let response = h
        .server
        .post("/chat")
        .add_header(name, value)
        .form(&json!({ "session_id": session.id(), "message": "anything" }))
        .await;
    response.assert_status_ok();

    let html = decoded(&response.text());
    assert!(html.contains("Something went wrong. Try again."));
    assert!(html.contains("window.alert("));
    assert!(html.contains("503"));
    assert!(html.contains("service unavailable"));

    let messages = session.transcript().messages();
    assert_eq!(messages.len(), 3);
    assert!(messages[2].is_failure());
    assert!(!session.transcript().is_pending());
}

#[tokio::test]
async fn test_unreachable_backend_notifies_and_records_sentinel() {
    let (server, state) = app(&closed_port_url());

    let session = state.sessions.create();
    let (name, value) = htmx();
    let response = server
        .post("/chat")
        .add_header(name, value)
        .form(&json!({ "session_id": session.id(), "message": "learn rust" }))
        .await;
    response.assert_status_ok();

    let html = decoded(&response.text());
    assert!(html.contains("window.alert("));
    assert!(html.contains("Something went wrong. Try again."));
    assert!(html.to_lowercase().contains("connection refused"), "{html}");

    let messages = session.transcript().messages();
    assert_eq!(messages.len(), 3);
    assert!(!messages[1].is_failure());
    assert!(messages[2].is_failure());
    assert_eq!(messages.iter().filter(|m| m.is_failure()).count(), 1);

    let state: serde_json::Value = server
        .get(&format!("/api/sessions/{}/messages", session.id()))
        .await
        .json();
    assert_eq!(state["pending"], false);
    assert_eq!(state["messages"][2]["query"], "Error");
}

#[tokio::test]
async fn test_blank_message_is_ignored() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "query": "x" })))
        .expect(0)
        .mount(&h.backend)
        .await;

    let session = h.state.sessions.create();
    let (name, value) = htmx();
    let response = h
        .server
        .post("/chat")
        .add_header(name, value)
        .form(&json!({ "session_id": session.id(), "message": "   " }))
        .await;
    response.assert_status_ok();

    assert_eq!(session.transcript().len(), 1);
}

#[tokio::test]
async fn test_plain_form_post_gets_full_page() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": "rust async",
            "results": []
        })))
        .mount(&h.backend)
        .await;

    let session = h.state.sessions.create();
    let response = h
        .server
        .post("/chat")
        .form(&json!({ "session_id": session.id(), "message": "rust async" }))
        .await;
    response.assert_status_ok();

    let html = decoded(&response.text());
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("rust async"));
    assert_eq!(session.transcript().len(), 3);
}

#[tokio::test]
async fn test_unknown_session_gets_fresh_transcript() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "query": "hello",
            "results": []
        })))
        .mount(&h.backend)
        .await;

    let (name, value) = htmx();
    h.server
        .post("/chat")
        .add_header(name, value)
        .form(&json!({ "session_id": "stale-page", "message": "hello" }))
        .await
        .assert_status_ok();

    let session = h.state.sessions.get("stale-page").expect("session created");
    assert_eq!(session.transcript().len(), 3);
}

#[tokio::test]
async fn test_chat_fragment_and_missing_session() {
    let h = harness().await;
    let session = h.state.sessions.create();

    let response = h
        .server
        .get(&format!("/sessions/{}/chat", session.id()))
        .await;
    response.assert_status_ok();
    assert!(response.text().contains("Ask a query to see video results."));

    h.server
        .get("/sessions/nope/chat")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    h.server
        .get("/api/sessions/nope/messages")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
