use std::sync::Arc;
use std::time::Duration;

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use thiserror::Error;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;
use crate::config::AppConfig;
use crate::render::ChatView;
use crate::session::Session;
use crate::transcript::SubmitOutcome;

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let state = AppState::from_config(Arc::clone(&config))?;

    info!(
        name: "backend.config.loaded",
        base_url = %config.backend.base_url,
        locale = %config.ui.locale,
        "Backend configuration loaded"
    );

    let _sweeper = state.sessions.spawn_sweeper(
        Duration::from_secs(config.session.sweep_interval_secs.max(1)),
        Duration::from_secs(config.session.idle_timeout_secs),
    );

    let app = router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        // HTML pages and fragments
        .route("/", get(index_handler))
        .route("/chat", post(send_message))
        .route("/sessions/{id}/chat", get(chat_fragment))
        // JSON API
        .route("/api/sessions/{id}/messages", get(api_get_messages))
        // Static assets
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Failures a handler turns into an error response.
#[derive(Error, Debug)]
pub enum AppError {
    /// No session with this ID.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// A template failed to render.
    #[error("Template error: {0}")]
    Render(#[from] minijinja::Error),

    /// The exchange task panicked or was cancelled.
    #[error("Chat task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::SessionNotFound(_) => StatusCode::NOT_FOUND,
            Self::Render(_) | Self::Task(_) => {
                tracing::error!(error = %self, "Request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, self.to_string()).into_response()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HTML Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET / - A fresh page view with its own transcript.
async fn index_handler(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let session = state.sessions.create();
    tracing::debug!(session_id = %session.id(), "Created session for page view");
    render(&state, &session, None, true)
}

/// Form body of the submit action.
#[derive(Debug, Deserialize)]
struct SendForm {
    /// Session the page belongs to.
    #[serde(default)]
    session_id: String,
    /// Text typed by the user.
    #[serde(default)]
    message: String,
}

/// POST /chat - Submit the composer and re-render the chat.
///
/// htmx requests get the `#chat` fragment; plain form posts get the page.
async fn send_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<SendForm>,
) -> Result<Html<String>, AppError> {
    let session_id = form.session_id.trim();
    let session = if session_id.is_empty() {
        state.sessions.create()
    } else {
        state.sessions.get_or_create(session_id)
    };
    session.touch();

    tracing::info!(
        session_id = %session.id(),
        message_length = form.message.len(),
        "Received chat submission"
    );

    let outcome = dispatch(&state, &session, form.message).await?;
    let partial = headers.contains_key("hx-request");
    render(&state, &session, outcome.notice(), !partial)
}

/// GET /sessions/:id/chat - Current `#chat` fragment of a session.
async fn chat_fragment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let session = state
        .sessions
        .get(&id)
        .ok_or(AppError::SessionNotFound(id))?;
    render(&state, &session, None, false)
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /api/sessions/:id/messages - Session transcript as JSON.
async fn api_get_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Session>, AppError> {
    state
        .sessions
        .get(&id)
        .map(Json)
        .ok_or(AppError::SessionNotFound(id))
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Run one exchange on its own task so a dropped connection cannot cut it short.
async fn dispatch(
    state: &AppState,
    session: &Session,
    message: String,
) -> Result<SubmitOutcome, AppError> {
    let backend = Arc::clone(&state.backend);
    let task_session = session.clone();

    let outcome = tokio::spawn(async move {
        task_session
            .transcript()
            .submit(&message, backend.as_ref())
            .await
    })
    .await?;

    match &outcome {
        SubmitOutcome::Ignored(reason) => {
            tracing::debug!(session_id = %session.id(), reason = ?reason, "Submission ignored");
        }
        SubmitOutcome::Answered { query, results } => {
            tracing::info!(
                session_id = %session.id(),
                query = %query,
                results,
                "Chat exchange completed"
            );
        }
        SubmitOutcome::Failed { notice } => {
            tracing::warn!(session_id = %session.id(), notice = %notice, "Chat exchange failed");
        }
    }

    Ok(outcome)
}

fn render(
    state: &AppState,
    session: &Session,
    notice: Option<&str>,
    full_page: bool,
) -> Result<Html<String>, AppError> {
    let snapshot = session.transcript().snapshot();
    let view = ChatView {
        session_id: session.id(),
        transcript: &snapshot,
        notice,
    };

    let html = if full_page {
        state.renderer.page(&view)?
    } else {
        state.renderer.chat(&view)?
    };
    Ok(Html(html))
}
