//! HTTP + SSE transport.
//!
//! - `GET /`: landing page
//! - `GET /health`: tshark availability check
//! - `GET /sse`: opens a session; the first event is `endpoint`, then each
//!   outbound frame is one `message` event
//! - `POST /messages/?session_id=<id>`: one inbound frame for that session
//!
//! The session lives as long as the event stream: when the client drops the
//! stream, its session closes and its id is forgotten.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::{stream, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch, RwLock};
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::tools::handlers::unix_time_secs;
use crate::tshark::Tshark;

use super::session::{ServerContext, Session};
use super::sink::ChannelSink;

/// Inbound frames queued per session before `POST` starts waiting.
const INBOUND_CAPACITY: usize = 64;
/// Outbound frames queued per session before the session starts waiting.
const OUTBOUND_CAPACITY: usize = 64;

type SessionMap = Arc<RwLock<HashMap<Uuid, mpsc::Sender<String>>>>;

/// Shared state of the HTTP transport.
#[derive(Clone)]
pub struct HttpState {
    ctx: Arc<ServerContext>,
    tshark: Tshark,
    sessions: SessionMap,
    shutdown: watch::Receiver<bool>,
}

impl HttpState {
    pub fn new(ctx: Arc<ServerContext>, tshark: Tshark, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            ctx,
            tshark,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            shutdown,
        }
    }

    #[cfg(test)]
    async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Build the router for the HTTP transport.
pub fn router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/health", get(handle_health))
        .route("/sse", get(handle_sse))
        .route("/sse/", get(handle_sse))
        .route("/messages", post(handle_message))
        .route("/messages/", post(handle_message))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the HTTP transport until `shutdown` flips.
///
/// Open sessions see the same signal, drain their in-flight calls, and end
/// their event streams, which lets the graceful shutdown complete.
pub async fn serve_http(listener: TcpListener, state: HttpState) -> std::io::Result<()> {
    let mut shutdown = state.shutdown.clone();
    let app = router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .await
}

// ─── Handlers ───────────────────────────────────────────────────────────────

const INDEX_HTML: &str = r#"<html>
    <head><title>Wireshark MCP Server</title></head>
    <body>
        <h1>Wireshark MCP Server</h1>
        <p>The Wireshark MCP server is running.</p>
        <p>Connection endpoint: <code>/sse/</code></p>
    </body>
</html>
"#;

async fn handle_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub wireshark_installed: bool,
    pub server_time: f64,
}

async fn handle_health(State(state): State<HttpState>) -> Json<HealthStatus> {
    let installed = state.tshark.check_installed().await;
    Json(HealthStatus {
        status: if installed { "healthy" } else { "unhealthy" }.to_string(),
        wireshark_installed: installed,
        server_time: unix_time_secs(),
    })
}

async fn handle_sse(
    State(state): State<HttpState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let id = Uuid::new_v4();
    let (in_tx, in_rx) = mpsc::channel(INBOUND_CAPACITY);
    let (out_tx, out_rx) = mpsc::channel::<String>(OUTBOUND_CAPACITY);

    state.sessions.write().await.insert(id, in_tx);

    let session = Session::new(
        id.simple().to_string(),
        state.ctx.clone(),
        Arc::new(ChannelSink::new(out_tx)),
    );
    let sessions = state.sessions.clone();
    let shutdown = state.shutdown.clone();
    tokio::spawn(async move {
        session.run(in_rx, shutdown).await;
        sessions.write().await.remove(&id);
    });

    let endpoint = Event::default()
        .event("endpoint")
        .data(format!("/messages/?session_id={}", id.simple()));

    let frames = stream::unfold(out_rx, |mut rx| async move {
        let frame = rx.recv().await?;
        let event = Event::default().event("message").data(frame);
        Some((Ok::<_, Infallible>(event), rx))
    });

    Sse::new(stream::once(async move { Ok::<_, Infallible>(endpoint) }).chain(frames))
        .keep_alive(KeepAlive::default())
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    session_id: Option<String>,
}

async fn handle_message(
    State(state): State<HttpState>,
    Query(query): Query<MessageQuery>,
    body: String,
) -> (StatusCode, &'static str) {
    let Some(raw_id) = query.session_id else {
        return (StatusCode::BAD_REQUEST, "session_id is required");
    };
    let Ok(id) = Uuid::parse_str(&raw_id) else {
        return (StatusCode::BAD_REQUEST, "Invalid session ID");
    };

    let tx = state.sessions.read().await.get(&id).cloned();
    let Some(tx) = tx else {
        tracing::debug!(session = %raw_id, "message for unknown session");
        return (StatusCode::NOT_FOUND, "Could not find session");
    };

    if tx.send(body).await.is_err() {
        return (StatusCode::NOT_FOUND, "Could not find session");
    }
    (StatusCode::ACCEPTED, "Accepted")
}

// ─── Tests ──────────────────────────────────────────────────────────────────
