use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::engine::Engine;
use crate::session::{Session, SessionView};

/// Conversations keyed by the transport's conversation id. Each has its own
/// lock; only the engine configuration is shared.
#[derive(Clone)]
struct AppState {
    engine: Arc<Engine>,
    sessions: Arc<RwLock<HashMap<String, Arc<Mutex<Session>>>>>,
}

impl AppState {
    fn new(engine: Engine) -> Self {
        Self {
            engine: Arc::new(engine),
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn session_or_insert(&self, id: &str) -> Arc<Mutex<Session>> {
        if let Some(existing) = self.get_session(id) {
            return existing;
        }
        self.sessions
            .write()
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(self.engine.new_session())))
            .clone()
    }

    fn get_session(&self, id: &str) -> Option<Arc<Mutex<Session>>> {
        self.sessions.read().get(id).cloned()
    }

    fn remove_session(&self, id: &str) -> Option<Arc<Mutex<Session>>> {
        self.sessions.write().remove(id)
    }
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub reply: String,
    pub state: SessionView,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error("conversation not found")]
    NotFound,
    #[error("message text is empty")]
    EmptyMessage,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::EmptyMessage => StatusCode::BAD_REQUEST,
        };
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

pub async fn serve(addr: SocketAddr, engine: Engine) -> Result<()> {
    let app = build_router(AppState::new(engine));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "turn api listening");
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/conversations/:id",
            get(fetch_conversation).delete(drop_conversation),
        )
        .route("/conversations/:id/messages", post(post_message));

    Router::new()
        .route("/healthz", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub fn router(engine: Engine) -> Router {
    build_router(AppState::new(engine))
}

async fn health() -> &'static str {
    "ok"
}

async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let text = req.text.trim();
    if text.is_empty() {
        return Err(ApiError::EmptyMessage);
    }

    let session_arc = state.session_or_insert(&id);
    let mut session = session_arc.lock();
    let reply = state.engine.handle(&mut session, text);
    Ok(Json(MessageResponse {
        reply: reply.text,
        state: session.view(),
    }))
}

async fn fetch_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let session_arc = state.get_session(&id).ok_or(ApiError::NotFound)?;
    let session = session_arc.lock();
    Ok(Json(session.view()))
}

async fn drop_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.remove_session(&id).ok_or(ApiError::NotFound)?;
    Ok(StatusCode::NO_CONTENT)
}
