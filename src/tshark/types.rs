//! Value types produced by the `tshark` layer.

use serde::{Deserialize, Serialize};

// ─── Process Output ─────────────────────────────────────────────────────────

/// Captured result of one finished `tshark` process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// `true` iff the process exited with status 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

// ─── Interfaces ─────────────────────────────────────────────────────────────

/// One capture-capable interface as reported by `tshark -D`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceRecord {
    /// Identifier token (e.g. `"1"`), usable as a capture interface argument.
    pub index: String,
    /// Remainder of the line (e.g. `"en0 (Wi-Fi)"`).
    pub interface: String,
}

// ─── Outcomes ───────────────────────────────────────────────────────────────

/// Outcome of a live capture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureOutcome {
    /// Exactly `exit status == 0`.
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    /// Path passed to `-w`, if any.
    pub output_file: Option<String>,
    /// Whether the output file exists after the run.
    pub file_written: bool,
}

/// Outcome of a read or statistics run: opaque text plus the exit status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextOutcome {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl From<ProcessOutput> for TextOutcome {
    fn from(output: ProcessOutput) -> Self {
        Self {
            success: output.success(),
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }
}
