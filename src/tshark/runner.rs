//! Process runner: executes `tshark` and captures its output.
//!
//! Each call spawns one process with stdin closed and stdout/stderr piped.
//! The child is created with `kill_on_drop`, so if the awaiting future is
//! dropped (e.g. the session that issued the call goes away) the process is
//! terminated instead of being left behind.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::errors::TsharkError;
use super::types::ProcessOutput;

// ─── Trait ──────────────────────────────────────────────────────────────────

/// Seam between the command builders and the operating system.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the binary with `args` and wait for it to exit.
    ///
    /// A non-zero exit is reported in the returned [`ProcessOutput`]; only a
    /// failure to spawn or to collect output is an `Err`.
    async fn run(&self, args: &[String]) -> Result<ProcessOutput, TsharkError>;

    /// Start the binary with `args` and report only whether it could be spawned.
    async fn spawn_only(&self, args: &[String]) -> Result<(), TsharkError> {
        self.run(args).await.map(|_| ())
    }

    /// Name of the binary, for diagnostics.
    fn binary(&self) -> &str;
}

// ─── TokioRunner ────────────────────────────────────────────────────────────

/// Runs a real binary through `tokio::process`.
#[derive(Debug, Clone)]
pub struct TokioRunner {
    binary: String,
}

impl TokioRunner {
    /// Create a runner for the given binary name or path.
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        // Windows: prevent console window from appearing for child processes
        #[cfg(target_os = "windows")]
        {
            const CREATE_NO_WINDOW: u32 = 0x08000000;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        cmd
    }

    fn unavailable(&self, e: std::io::Error) -> TsharkError {
        TsharkError::Unavailable {
            binary: self.binary.clone(),
            reason: e.to_string(),
        }
    }
}

#[async_trait]
impl CommandRunner for TokioRunner {
    async fn run(&self, args: &[String]) -> Result<ProcessOutput, TsharkError> {
        tracing::debug!(binary = %self.binary, ?args, "spawning process");

        let child = self.command(args).spawn().map_err(|e| self.unavailable(e))?;

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| TsharkError::Io {
                binary: self.binary.clone(),
                reason: e.to_string(),
            })?;

        let result = ProcessOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        tracing::debug!(
            binary = %self.binary,
            exit_code = ?result.exit_code,
            stdout_len = result.stdout.len(),
            stderr_len = result.stderr.len(),
            "process exited"
        );

        Ok(result)
    }

    async fn spawn_only(&self, args: &[String]) -> Result<(), TsharkError> {
        let mut cmd = self.command(args);
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());

        let mut child = cmd.spawn().map_err(|e| self.unavailable(e))?;

        // Reap the child; its exit status is irrelevant to the caller.
        let _ = child.wait().await;
        Ok(())
    }

    fn binary(&self) -> &str {
        &self.binary
    }
}

// ─── Test Stub ──────────────────────────────────────────────────────────────


// ─── Tests ──────────────────────────────────────────────────────────────────
