use std::net::SocketAddr;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use baccarat_advisor::session::{Phase, SessionView};
use baccarat_advisor::web::{self, MessageResponse};
use baccarat_advisor::{Engine, EngineConfig};
use reqwest::Client;
use rust_decimal_macros::dec;
use serde_json::json;
use tokio::time::{Duration, sleep};
use tower::ServiceExt;

fn engine() -> Engine {
    Engine::new(EngineConfig {
        seed: Some(8),
        ..EngineConfig::default()
    })
}

#[tokio::test]
async fn web_api_supports_conversation_flow() -> anyhow::Result<()> {
    let app: Router = web::router(engine());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr: SocketAddr = listener.local_addr()?;
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let base_url = format!("http://{}", addr);
    let client = Client::builder().build()?;

    sleep(Duration::from_millis(25)).await;

    let mut last: Option<MessageResponse> = None;
    for text in ["start", "5000", "3 5", "6 8"] {
        let response: MessageResponse = client
            .post(format!("{}/api/conversations/alice/messages", base_url))
            .json(&json!({ "text": text }))
            .send()
            .await?
            .json()
            .await?;
        last = Some(response);
    }

    let last = last.expect("four replies");
    assert!(last.reply.contains("Bankroll: 5142.50"), "{}", last.reply);
    assert_eq!(last.state.phase, Phase::AwaitingRound);
    assert_eq!(last.state.round_number, 2);

    let view: SessionView = client
        .get(format!("{}/api/conversations/alice", base_url))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(view.history.len(), 2);

    server.abort();
    let _ = server.await;
    Ok(())
}

async fn post(app: &Router, conversation: &str, text: &str) -> MessageResponse {
    let request = Request::post(format!("/api/conversations/{conversation}/messages"))
        .header("content-type", "application/json")
        .body(Body::from(json!({ "text": text }).to_string()))
        .expect("request builds");
    let response = app.clone().oneshot(request).await.expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    serde_json::from_slice(&bytes).expect("valid json")
}

#[tokio::test]
async fn conversations_do_not_share_state() {
    let app = web::router(engine());

    post(&app, "alice", "start").await;
    post(&app, "alice", "5000").await;
    post(&app, "bob", "start").await;
    post(&app, "bob", "900").await;
    let alice = post(&app, "alice", "3 5").await;
    let bob = post(&app, "bob", "status").await;

    assert_eq!(alice.state.round_number, 1);
    assert_eq!(bob.state.round_number, 0);
    assert_eq!(bob.state.summary.initial_bankroll, dec!(900));
    assert_ne!(alice.state.session_id, bob.state.session_id);
}

#[tokio::test]
async fn unknown_conversation_is_not_found() {
    let app = web::router(engine());
    let request = Request::get("/api/conversations/nobody")
        .body(Body::empty())
        .expect("request builds");
    let response = app.oneshot(request).await.expect("router responds");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_message_is_bad_request() {
    let app = web::router(engine());
    let request = Request::post("/api/conversations/carol/messages")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"text":"   "}"#))
        .expect("request builds");
    let response = app.oneshot(request).await.expect("router responds");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
