//! One caller's MCP session: handshake, frame dispatch, and teardown.
//!
//! Lifecycle: `Connecting → Open → Closing → Closed`.
//!
//! - Connecting: only `initialize` and `ping` are served. Anything else, or a
//!   malformed first frame, fails the handshake and the session is discarded.
//! - Open: every request is answered; protocol errors are reported as error
//!   frames and the session stays open. `tools/call` runs as its own task and
//!   answers when it completes, so responses follow completion order.
//! - Closing: entered on inbound EOF, shutdown, peer loss, or a failed write.
//!   No further frames are read. In-flight calls run to completion, and their
//!   answers are written if the stream is still writable.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;

use crate::tools::{PromptStore, ToolRegistry};

use super::errors::SessionError;
use super::sink::FrameSink;
use super::types::{
    InitializeResult, JsonRpcRequest, JsonRpcResponse, PromptGetParams, ServerInfo,
    ToolCallParams, PROTOCOL_VERSION,
};

// ─── Shared Context ─────────────────────────────────────────────────────────

/// Read-only state shared by every session.
pub struct ServerContext {
    pub registry: ToolRegistry,
    pub prompts: Arc<PromptStore>,
    pub server_info: ServerInfo,
}

impl ServerContext {
    pub fn new(registry: ToolRegistry, prompts: Arc<PromptStore>) -> Self {
        Self {
            registry,
            prompts,
            server_info: ServerInfo {
                name: "wireshark".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        }
    }
}

// ─── Session ────────────────────────────────────────────────────────────────

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Open,
    Closing,
    Closed,
}

enum Event {
    Frame(Option<String>),
    Shutdown,
    PeerGone,
    CallDone(Result<Result<(), SessionError>, tokio::task::JoinError>),
}

/// A session, exclusively owned by its connection task.
pub struct Session {
    id: String,
    ctx: Arc<ServerContext>,
    sink: Arc<dyn FrameSink>,
    state: SessionState,
    in_flight: JoinSet<Result<(), SessionError>>,
}

impl Session {
    pub fn new(id: impl Into<String>, ctx: Arc<ServerContext>, sink: Arc<dyn FrameSink>) -> Self {
        Self {
            id: id.into(),
            ctx,
            sink,
            state: SessionState::Connecting,
            in_flight: JoinSet::new(),
        }
    }

    /// Serve frames from `inbound` until the session ends.
    ///
    /// Returns the final state, which is always [`SessionState::Closed`].
    pub async fn run(
        mut self,
        mut inbound: mpsc::Receiver<String>,
        mut shutdown: watch::Receiver<bool>,
    ) -> SessionState {
        tracing::info!(session = %self.id, "session connected");
        let sink = self.sink.clone();

        loop {
            let event = tokio::select! {
                frame = inbound.recv() => Event::Frame(frame),
                _ = shutdown.changed() => Event::Shutdown,
                _ = sink.closed() => Event::PeerGone,
                Some(joined) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
                    Event::CallDone(joined)
                }
            };

            match event {
                Event::Frame(None) => {
                    tracing::debug!(session = %self.id, "inbound stream ended");
                    break;
                }
                Event::Frame(Some(frame)) => match self.handle_frame(&frame).await {
                    Ok(()) => {}
                    Err(e) if e.is_fatal() => {
                        tracing::warn!(session = %self.id, error = %e, "session transport failed");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(session = %self.id, error = %e, "session handshake failed");
                        self.state = SessionState::Closed;
                        return self.state;
                    }
                },
                Event::Shutdown => {
                    tracing::info!(session = %self.id, "shutdown requested");
                    break;
                }
                Event::PeerGone => {
                    tracing::info!(session = %self.id, "peer disconnected");
                    break;
                }
                Event::CallDone(joined) => {
                    if let Some(e) = call_error(joined) {
                        if e.is_fatal() {
                            tracing::warn!(session = %self.id, error = %e, "failed to deliver tool result");
                            break;
                        }
                    }
                }
            }
        }

        // Senders see the session as gone from here on.
        inbound.close();
        self.close().await
    }

    async fn close(mut self) -> SessionState {
        self.state = SessionState::Closing;

        let pending = self.in_flight.len();
        if pending > 0 {
            tracing::info!(session = %self.id, pending, "waiting for in-flight calls");
        }
        while let Some(joined) = self.in_flight.join_next().await {
            if let Some(e) = call_error(joined) {
                tracing::debug!(session = %self.id, error = %e, "in-flight call result dropped");
            }
        }

        self.state = SessionState::Closed;
        tracing::info!(session = %self.id, "session closed");
        self.state
    }

    // ─── Frame Handling ──────────────────────────────────────────────────

    /// Handle one inbound frame.
    ///
    /// Returns `Err` only for fatal transport errors or a failed handshake.
    async fn handle_frame(&mut self, raw: &str) -> Result<(), SessionError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(());
        }

        let value: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(e) => {
                let err = SessionError::Parse {
                    reason: e.to_string(),
                };
                return self.protocol_error(Value::Null, err).await;
            }
        };

        let id = value.get("id").cloned().unwrap_or(Value::Null);

        let is_response = value.get("method").is_none()
            && (value.get("result").is_some() || value.get("error").is_some());
        if is_response {
            // Client answering a server request; we never send any.
            tracing::debug!(session = %self.id, "ignoring client response frame");
            return Ok(());
        }

        // `"id": null` still makes a request; serde would read it as absent.
        let has_id = value.get("id").is_some();

        let mut request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(req) => req,
            Err(e) => {
                let err = SessionError::InvalidRequest {
                    reason: e.to_string(),
                };
                return self.protocol_error(id, err).await;
            }
        };

        if has_id && request.id.is_none() {
            request.id = Some(id.clone());
        }

        if request.jsonrpc.as_deref().is_some_and(|v| v != "2.0") {
            let err = SessionError::InvalidRequest {
                reason: "jsonrpc must be \"2.0\"".into(),
            };
            return self.protocol_error(id, err).await;
        }

        match self.state {
            SessionState::Connecting => self.handle_handshake(request).await,
            _ => self.handle_request(request).await,
        }
    }

    async fn handle_handshake(&mut self, request: JsonRpcRequest) -> Result<(), SessionError> {
        let Some(id) = request.id.clone() else {
            tracing::debug!(session = %self.id, method = %request.method, "notification before initialize ignored");
            return Ok(());
        };

        match request.method.as_str() {
            "initialize" => {
                let result = InitializeResult {
                    protocol_version: PROTOCOL_VERSION.to_string(),
                    capabilities: json!({
                        "tools": { "listChanged": false },
                        "prompts": { "listChanged": false },
                    }),
                    server_info: self.ctx.server_info.clone(),
                };
                let result = serde_json::to_value(result).map_err(|e| SessionError::Transport {
                    reason: format!("failed to serialize initialize result: {e}"),
                })?;
                self.reply(JsonRpcResponse::success(id, result)).await?;
                self.state = SessionState::Open;
                tracing::info!(session = %self.id, "session open");
                Ok(())
            }
            "ping" => self.reply(JsonRpcResponse::success(id, json!({}))).await,
            other => {
                let err = SessionError::HandshakeFailed {
                    reason: format!("expected 'initialize', got '{other}'"),
                };
                self.protocol_error(id, err).await
            }
        }
    }

    async fn handle_request(&mut self, request: JsonRpcRequest) -> Result<(), SessionError> {
        let Some(id) = request.id.clone() else {
            match request.method.as_str() {
                "notifications/initialized" => {
                    tracing::debug!(session = %self.id, "client finished initialization")
                }
                other => {
                    tracing::debug!(session = %self.id, method = %other, "notification ignored")
                }
            }
            return Ok(());
        };

        let params = request.params.unwrap_or(Value::Null);

        match request.method.as_str() {
            "ping" => self.reply(JsonRpcResponse::success(id, json!({}))).await,
            "initialize" => {
                let err = SessionError::InvalidRequest {
                    reason: "session already initialized".into(),
                };
                self.protocol_error(id, err).await
            }
            "tools/list" => {
                let tools: Vec<Value> = self
                    .ctx
                    .registry
                    .list()
                    .iter()
                    .map(|d| d.to_wire())
                    .collect();
                self.reply(JsonRpcResponse::success(id, json!({ "tools": tools })))
                    .await
            }
            "tools/call" => match serde_json::from_value::<ToolCallParams>(params) {
                Ok(call) => {
                    self.spawn_call(id, call);
                    Ok(())
                }
                Err(e) => {
                    let err = SessionError::InvalidParams {
                        method: "tools/call".into(),
                        reason: e.to_string(),
                    };
                    self.protocol_error(id, err).await
                }
            },
            "prompts/list" => {
                let prompts: Vec<Value> = self
                    .ctx
                    .prompts
                    .guides()
                    .iter()
                    .map(|g| {
                        json!({
                            "name": g.name,
                            "description": g.description,
                            "arguments": [],
                        })
                    })
                    .collect();
                self.reply(JsonRpcResponse::success(id, json!({ "prompts": prompts })))
                    .await
            }
            "prompts/get" => {
                let guide = serde_json::from_value::<PromptGetParams>(params)
                    .map_err(|e| e.to_string())
                    .and_then(|p| {
                        self.ctx
                            .prompts
                            .guide(&p.name)
                            .ok_or_else(|| format!("unknown prompt: '{}'", p.name))
                    });
                match guide {
                    Ok(guide) => {
                        let result = json!({
                            "description": guide.description,
                            "messages": [{
                                "role": "user",
                                "content": { "type": "text", "text": guide.text },
                            }],
                        });
                        self.reply(JsonRpcResponse::success(id, result)).await
                    }
                    Err(reason) => {
                        let err = SessionError::InvalidParams {
                            method: "prompts/get".into(),
                            reason,
                        };
                        self.protocol_error(id, err).await
                    }
                }
            }
            other => {
                let err = SessionError::MethodNotFound {
                    method: other.to_string(),
                };
                self.protocol_error(id, err).await
            }
        }
    }

    /// Run a tool call on its own task; its answer is written on completion.
    fn spawn_call(&mut self, id: Value, call: ToolCallParams) {
        let ctx = self.ctx.clone();
        let sink = self.sink.clone();
        let session = self.id.clone();

        tracing::debug!(session = %session, tool = %call.name, "dispatching tool call");

        self.in_flight.spawn(async move {
            let result = ctx.registry.dispatch(&call.name, &call.arguments).await;
            let response = JsonRpcResponse::success(id, result.to_call_result());
            send_response(sink.as_ref(), &response).await
        });
    }

    // ─── Replies ─────────────────────────────────────────────────────────

    async fn reply(&self, response: JsonRpcResponse) -> Result<(), SessionError> {
        send_response(self.sink.as_ref(), &response).await
    }

    /// Report a non-fatal protocol error on the stream.
    ///
    /// While connecting, any protocol error fails the handshake.
    async fn protocol_error(&self, id: Value, err: SessionError) -> Result<(), SessionError> {
        tracing::debug!(session = %self.id, error = %err, "protocol error");
        let response = JsonRpcResponse::error(id, err.code(), err.to_string());

        if self.state == SessionState::Connecting {
            // Best-effort: the session is discarded either way.
            let _ = self.reply(response).await;
            return Err(match err {
                SessionError::HandshakeFailed { .. } => err,
                other => SessionError::HandshakeFailed {
                    reason: other.to_string(),
                },
            });
        }

        self.reply(response).await
    }
}

async fn send_response(sink: &dyn FrameSink, response: &JsonRpcResponse) -> Result<(), SessionError> {
    let frame = serde_json::to_string(response).map_err(|e| SessionError::Transport {
        reason: format!("failed to serialize response: {e}"),
    })?;
    sink.send(&frame).await
}

fn call_error(
    joined: Result<Result<(), SessionError>, tokio::task::JoinError>,
) -> Option<SessionError> {
    match joined {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(e),
        Err(e) => Some(SessionError::Transport {
            reason: format!("tool call task failed: {e}"),
        }),
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
