//! Outbound frame sinks.
//!
//! A session never touches its raw stream directly; every frame goes through
//! a [`FrameSink`], which guarantees that one frame is written completely
//! before the next one starts.

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, Mutex};

use super::errors::SessionError;

// ─── Trait ──────────────────────────────────────────────────────────────────

/// Destination for outbound frames of one session.
#[async_trait]
pub trait FrameSink: Send + Sync {
    /// Write one complete frame.
    async fn send(&self, frame: &str) -> Result<(), SessionError>;

    /// Resolves once the peer can no longer receive frames.
    ///
    /// Sinks that cannot detect this never resolve.
    async fn closed(&self) {
        std::future::pending::<()>().await
    }
}

// ─── WriterSink ─────────────────────────────────────────────────────────────

/// Line-delimited frames over a byte stream (one JSON object per line).
///
/// The writer is held under an async mutex for the whole
/// `write_all` + `flush` of a frame, so concurrent senders cannot interleave
/// bytes even when the stream accepts only partial writes.
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W> WriterSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

#[async_trait]
impl<W> FrameSink for WriterSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&self, frame: &str) -> Result<(), SessionError> {
        let mut line = String::with_capacity(frame.len() + 1);
        line.push_str(frame);
        line.push('\n');

        let mut writer = self.writer.lock().await;
        writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| SessionError::Transport {
                reason: format!("failed to write frame: {e}"),
            })?;
        writer.flush().await.map_err(|e| SessionError::Transport {
            reason: format!("failed to flush frame: {e}"),
        })?;
        Ok(())
    }
}

// ─── ChannelSink ────────────────────────────────────────────────────────────

/// Frames handed to an in-process channel (one message per frame), drained
/// by the HTTP event stream.
pub struct ChannelSink {
    tx: mpsc::Sender<String>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl FrameSink for ChannelSink {
    async fn send(&self, frame: &str) -> Result<(), SessionError> {
        self.tx
            .send(frame.to_string())
            .await
            .map_err(|_| SessionError::Transport {
                reason: "event stream closed".into(),
            })
    }

    async fn closed(&self) {
        self.tx.closed().await
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
