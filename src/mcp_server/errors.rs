//! Session error types.

use thiserror::Error;

use super::types::error_codes;

/// Errors that can occur while serving a session.
///
/// Only [`SessionError::Transport`] ends an open session; every other kind is
/// reported back to the caller as a JSON-RPC error frame.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Inbound frame is not valid JSON.
    #[error("parse error: {reason}")]
    Parse { reason: String },

    /// Frame is JSON but not a valid request.
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// Method is not served.
    #[error("method not found: '{method}'")]
    MethodNotFound { method: String },

    /// Params did not match the method.
    #[error("invalid params for '{method}': {reason}")]
    InvalidParams { method: String, reason: String },

    /// A request arrived before `initialize` completed.
    #[error("handshake failed: {reason}")]
    HandshakeFailed { reason: String },

    /// The underlying stream failed; the session cannot continue.
    #[error("transport error: {reason}")]
    Transport { reason: String },
}

impl SessionError {
    /// JSON-RPC error code for this error.
    pub fn code(&self) -> i32 {
        match self {
            SessionError::Parse { .. } => error_codes::PARSE_ERROR,
            SessionError::InvalidRequest { .. } => error_codes::INVALID_REQUEST,
            SessionError::MethodNotFound { .. } => error_codes::METHOD_NOT_FOUND,
            SessionError::InvalidParams { .. } => error_codes::INVALID_PARAMS,
            SessionError::HandshakeFailed { .. } => error_codes::NOT_INITIALIZED,
            SessionError::Transport { .. } => error_codes::INTERNAL_ERROR,
        }
    }

    /// Whether this error terminates the session.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SessionError::Transport { .. })
    }
}

impl From<std::io::Error> for SessionError {
    fn from(e: std::io::Error) -> Self {
        SessionError::Transport {
            reason: e.to_string(),
        }
    }
}
