//! Errors raised while running the external `tshark` binary.

use thiserror::Error;

/// Errors that can occur when invoking `tshark`.
///
/// Capture, read, and statistics runs report a non-zero exit inside
/// [`super::types::ProcessOutput`]. [`TsharkError::NonZeroExit`] is raised only
/// where the output is unusable on failure, as with the interface listing.
#[derive(Debug, Error)]
pub enum TsharkError {
    /// The binary could not be located or spawned at all.
    #[error("'{binary}' is not available: {reason}")]
    Unavailable {
        binary: String,
        reason: String,
    },

    /// Analysis type outside the fixed table; rejected before any spawn.
    #[error("unsupported analysis type: '{name}'. Supported types: {}", supported.join(", "))]
    UnsupportedAnalysis {
        name: String,
        supported: Vec<String>,
    },

    /// The process ran but exited with failure.
    #[error("'{binary}' exited with {}: {stderr}", exit_label(*code))]
    NonZeroExit {
        binary: String,
        code: Option<i32>,
        stderr: String,
    },

    /// The process started but collecting its output failed.
    #[error("i/o error while running '{binary}': {reason}")]
    Io {
        binary: String,
        reason: String,
    },
}

fn exit_label(code: Option<i32>) -> String {
    match code {
        Some(c) => format!("code {c}"),
        None => "a signal".to_string(),
    }
}

impl TsharkError {
    /// Whether this error means the binary never ran.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, TsharkError::Unavailable { .. })
    }
}
