//! MCP Server: serves the tool registry to MCP clients.
//!
//! This module handles:
//! - JSON-RPC 2.0 framing and the MCP handshake
//! - Per-session dispatch with concurrent tool calls
//! - Serialized frame writes through a [`FrameSink`]
//! - Stdio and HTTP+SSE transports

pub mod errors;
pub mod http;
pub mod session;
pub mod sink;
pub mod stdio;
pub mod types;

pub use errors::SessionError;
pub use http::{serve_http, HttpState};
pub use session::{ServerContext, Session, SessionState};
pub use sink::{ChannelSink, FrameSink, WriterSink};
pub use stdio::{serve_stdio, serve_stream};
