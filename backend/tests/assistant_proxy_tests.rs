//! Chat proxy against a local stand-in for the AI gateway.

mod support;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use futures::StreamExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use court_booking::services::assistant::{ChatMessage, ChatRole};
use court_booking::services::{AssistantError, AssistantSettings, BookingPolicy, ChatProxy};
use support::TestApp;

const SSE_BODY: &str = "data: {\"choices\":[{\"delta\":{\"content\":\"We open at 8\"}}]}\n\ndata: [DONE]\n\n";

#[derive(Clone, Default)]
struct Captured {
    last: Arc<Mutex<Option<(Option<String>, Value)>>>,
}

async fn stream_ok(
    State(captured): State<Captured>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    *captured.last.lock().unwrap() = Some((auth, body));
    ([(header::CONTENT_TYPE, "text/event-stream")], SSE_BODY).into_response()
}

async fn stall() -> Response {
    let stream = async_stream::stream! {
        yield Ok::<_, std::io::Error>("data: first\n\n".as_bytes().to_vec());
        tokio::time::sleep(Duration::from_secs(60)).await;
        yield Ok("data: never\n\n".as_bytes().to_vec());
    };
    ([(header::CONTENT_TYPE, "text/event-stream")], Body::from_stream(stream)).into_response()
}

async fn spawn_gateway() -> (SocketAddr, Captured) {
    let captured = Captured::default();
    let app = Router::new()
        .route("/ok", post(stream_ok))
        .route("/limited", post(|| async { StatusCode::TOO_MANY_REQUESTS }))
        .route("/payment", post(|| async { StatusCode::PAYMENT_REQUIRED }))
        .route(
            "/broken",
            post(|| async { (StatusCode::BAD_GATEWAY, "upstream exploded") }),
        )
        .route("/stall", post(stall))
        .with_state(captured.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, captured)
}

fn settings(addr: SocketAddr, path: &str) -> AssistantSettings {
    AssistantSettings {
        gateway_url: format!("http://{}{}", addr, path),
        api_key: Some("test-key".to_string()),
        idle_timeout_secs: 1,
        ..AssistantSettings::default()
    }
}

fn question() -> Vec<ChatMessage> {
    vec![ChatMessage {
        role: ChatRole::User,
        content: "When do you open?".to_string(),
    }]
}

#[tokio::test]
async fn test_stream_is_forwarded_with_system_prompt() {
    let (addr, captured) = spawn_gateway().await;
    let proxy = ChatProxy::new(settings(addr, "/ok"), "Club prompt".to_string()).unwrap();

    let mut stream = proxy.open_stream(&question()).await.unwrap();
    let mut received = Vec::new();
    while let Some(chunk) = stream.next().await {
        received.extend(chunk.unwrap());
    }
    assert_eq!(String::from_utf8(received).unwrap(), SSE_BODY);

    let (auth, body) = captured.last.lock().unwrap().clone().unwrap();
    assert_eq!(auth.as_deref(), Some("Bearer test-key"));
    assert_eq!(body["stream"], true);
    assert_eq!(body["model"], AssistantSettings::default().model);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], "Club prompt");
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "When do you open?");
}

#[tokio::test]
async fn test_upstream_statuses_are_mapped() {
    let (addr, _) = spawn_gateway().await;

    let limited = ChatProxy::new(settings(addr, "/limited"), String::new()).unwrap();
    assert!(matches!(
        limited.open_stream(&question()).await.err().unwrap(),
        AssistantError::RateLimited
    ));

    let payment = ChatProxy::new(settings(addr, "/payment"), String::new()).unwrap();
    assert!(matches!(
        payment.open_stream(&question()).await.err().unwrap(),
        AssistantError::PaymentRequired
    ));

    let broken = ChatProxy::new(settings(addr, "/broken"), String::new()).unwrap();
    assert!(matches!(
        broken.open_stream(&question()).await.err().unwrap(),
        AssistantError::Gateway { status: 502 }
    ));
}

#[tokio::test]
async fn test_empty_conversation_is_rejected() {
    let (addr, _) = spawn_gateway().await;
    let proxy = ChatProxy::new(settings(addr, "/ok"), String::new()).unwrap();
    assert!(matches!(
        proxy.open_stream(&[]).await.err().unwrap(),
        AssistantError::EmptyConversation
    ));
}

#[tokio::test]
async fn test_idle_upstream_ends_the_stream() {
    let (addr, _) = spawn_gateway().await;
    let proxy = ChatProxy::new(settings(addr, "/stall"), String::new()).unwrap();

    let stream = proxy.open_stream(&question()).await.unwrap();
    let chunks: Vec<_> = tokio::time::timeout(Duration::from_secs(10), stream.collect::<Vec<_>>())
        .await
        .expect("stream should end after the idle timeout");
    let text: String = chunks
        .into_iter()
        .map(|c| String::from_utf8(c.unwrap()).unwrap())
        .collect();
    assert_eq!(text, "data: first\n\n");
}

async fn chat_through_router(app: &TestApp) -> (StatusCode, Option<String>, String) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "messages": [{ "role": "user", "content": "hi" }] }).to_string(),
        ))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, content_type, String::from_utf8_lossy(&bytes).into_owned())
}

#[tokio::test]
async fn test_chat_endpoint_streams_and_maps_errors() {
    let (addr, _) = spawn_gateway().await;

    let ok = TestApp::with_assistant(BookingPolicy::default(), settings(addr, "/ok"));
    let (status, content_type, body) = chat_through_router(&ok).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/event-stream"));
    assert_eq!(body, SSE_BODY);

    let limited = TestApp::with_assistant(BookingPolicy::default(), settings(addr, "/limited"));
    let (status, _, body) = chat_through_router(&limited).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(body.contains("UPSTREAM_RATE_LIMITED"));

    let payment = TestApp::with_assistant(BookingPolicy::default(), settings(addr, "/payment"));
    let (status, _, _) = chat_through_router(&payment).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);

    let broken = TestApp::with_assistant(BookingPolicy::default(), settings(addr, "/broken"));
    let (status, _, body) = chat_through_router(&broken).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("AI gateway error"));
}
