//! tshark: the external packet-analysis utility, seen as a black box.
//!
//! This module handles:
//! - Spawning `tshark` with an argument vector and capturing its output
//! - Probing whether the binary is available and which interfaces it sees
//! - Building capture, read, and statistics argument vectors
//!
//! Every operation is an independent validate → build argv → run → wrap
//! pipeline; nothing is retained between calls.

pub mod analysis;
pub mod commands;
pub mod errors;
pub mod discovery;
pub mod runner;
pub mod types;

use std::path::Path;
use std::sync::Arc;

pub use analysis::AnalysisTable;
pub use commands::{CaptureRequest, ReadRequest};
pub use errors::TsharkError;
pub use runner::{CommandRunner, TokioRunner};
pub use types::{CaptureOutcome, InterfaceRecord, ProcessOutput, TextOutcome};

// ─── Tshark ─────────────────────────────────────────────────────────────────

/// Facade composing the process runner with the command builders.
///
/// Cheap to clone; shared read-only by every session.
#[derive(Clone)]
pub struct Tshark {
    runner: Arc<dyn CommandRunner>,
    analyses: Arc<AnalysisTable>,
}

impl Tshark {
    pub fn new(runner: Arc<dyn CommandRunner>, analyses: Arc<AnalysisTable>) -> Self {
        Self { runner, analyses }
    }

    /// Facade over the real binary at `binary` with the standard analysis table.
    pub fn with_binary(binary: &str) -> Self {
        Self::new(
            Arc::new(TokioRunner::new(binary)),
            Arc::new(AnalysisTable::standard()),
        )
    }

    pub fn analyses(&self) -> &AnalysisTable {
        &self.analyses
    }

    pub async fn check_installed(&self) -> bool {
        discovery::check_installed(self.runner.as_ref()).await
    }

    pub async fn query_interfaces(&self) -> Result<Vec<InterfaceRecord>, TsharkError> {
        discovery::query_interfaces(self.runner.as_ref()).await
    }

    pub async fn list_interfaces(&self) -> Vec<InterfaceRecord> {
        discovery::list_interfaces(self.runner.as_ref()).await
    }

    /// Run a bounded live capture.
    pub async fn capture(&self, req: &CaptureRequest) -> Result<CaptureOutcome, TsharkError> {
        let output = self.runner.run(&commands::capture_args(req)).await?;

        let file_written = match req.output_file.as_deref() {
            Some(path) if !path.is_empty() => tokio::fs::metadata(Path::new(path)).await.is_ok(),
            _ => false,
        };

        Ok(CaptureOutcome {
            success: output.success(),
            stdout: output.stdout,
            stderr: output.stderr,
            output_file: req.output_file.clone(),
            file_written,
        })
    }

    /// Print packets from a capture file. The file is not checked locally.
    pub async fn read(&self, req: &ReadRequest) -> Result<TextOutcome, TsharkError> {
        let output = self.runner.run(&commands::read_args(req)).await?;
        Ok(output.into())
    }

    /// Run a statistics report. Unknown analysis types fail before any spawn.
    pub async fn analyze(
        &self,
        file_path: &str,
        analysis_type: &str,
    ) -> Result<TextOutcome, TsharkError> {
        let selector = self.analyses.selector(analysis_type).ok_or_else(|| {
            TsharkError::UnsupportedAnalysis {
                name: analysis_type.to_string(),
                supported: self.analyses.names().iter().map(|n| n.to_string()).collect(),
            }
        })?;

        let output = self
            .runner
            .run(&commands::statistics_args(file_path, selector))
            .await?;
        Ok(output.into())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
