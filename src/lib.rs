//! Wireshark MCP server: exposes `tshark` capture and analysis as MCP tools.
//!
//! [`run`] loads [`config::ServerConfig`], installs logging, refuses to start
//! without a runnable `tshark`, and then serves sessions over HTTP+SSE or stdio
//! until Ctrl-C.

pub mod config;
pub mod mcp_server;
pub mod tools;
pub mod tshark;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use config::{ServerConfig, TransportMode};
use mcp_server::{HttpState, ServerContext};
use tools::{PromptStore, ToolContext};
use tshark::Tshark;

/// Initialize the tracing subscriber.
///
/// Logs go to stderr, since stdout carries frames in stdio mode. When
/// `log_file` is configured, existing logs are rotated first
/// (`server.log` → `.1` → `.2` → `.3`) and every line is flushed to disk.
fn init_tracing(config: &ServerConfig) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let writer = match &config.log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create log dir {}", parent.display()))?;
            }
            rotate_log_file(path, 3);

            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            BoxMakeWriter::new(FlushingWriter::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("wireshark_mcp=info,warn"));

    fmt::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

/// Rotate log files: `server.log` → `server.log.1` → … → `.{keep}`.
///
/// The oldest file beyond `keep` is deleted. Missing files in the chain are skipped.
fn rotate_log_file(base_path: &Path, keep: u32) {
    let oldest = format!("{}.{keep}", base_path.display());
    let _ = std::fs::remove_file(&oldest);

    for i in (1..keep).rev() {
        let from = format!("{}.{i}", base_path.display());
        let to = format!("{}.{}", base_path.display(), i + 1);
        let _ = std::fs::rename(&from, &to);
    }

    if base_path.exists() {
        let to = format!("{}.1", base_path.display());
        let _ = std::fs::rename(base_path, &to);
    }
}

/// A file writer that flushes after every write, so log lines survive a crash.
#[derive(Clone)]
struct FlushingWriter {
    file: Arc<std::sync::Mutex<std::fs::File>>,
}

impl FlushingWriter {
    fn new(file: std::fs::File) -> Self {
        Self {
            file: Arc::new(std::sync::Mutex::new(file)),
        }
    }
}

impl std::io::Write for FlushingWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut f = self
            .file
            .lock()
            .map_err(|e| std::io::Error::other(format!("lock poisoned: {e}")))?;
        let n = std::io::Write::write(&mut *f, buf)?;
        std::io::Write::flush(&mut *f)?;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let mut f = self
            .file
            .lock()
            .map_err(|e| std::io::Error::other(format!("lock poisoned: {e}")))?;
        std::io::Write::flush(&mut *f)
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for FlushingWriter {
    type Writer = FlushingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Flip the shutdown flag on Ctrl-C.
fn spawn_signal_handler(shutdown: watch::Sender<bool>) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("shutdown signal received");
                let _ = shutdown.send(true);
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for shutdown signal");
                // Dropping the sender would read as a shutdown.
                std::future::pending::<()>().await;
            }
        }
    });
}

/// Load configuration, verify tshark, and serve until shutdown.
///
/// Fails before accepting any session when tshark cannot be run.
pub async fn run() -> anyhow::Result<()> {
    let config = ServerConfig::load().context("failed to load configuration")?;
    init_tracing(&config)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = std::process::id(),
        transport = %config.transport,
        addr = %config.bind_addr(),
        tshark = %config.tshark_path,
        "=== wireshark-mcp starting ==="
    );

    let tshark = Tshark::with_binary(&config.tshark_path);
    if !tshark.check_installed().await {
        tracing::error!(
            tshark = %config.tshark_path,
            "tshark is not installed or cannot be run; install Wireshark and make sure tshark is on PATH"
        );
        anyhow::bail!("tshark not available at '{}'", config.tshark_path);
    }

    let interfaces = tshark.list_interfaces().await;
    tracing::info!(count = interfaces.len(), "detected capture interfaces");
    for iface in &interfaces {
        tracing::info!(index = %iface.index, interface = %iface.interface, "  interface");
    }

    if let Some(dir) = &config.capture_dir {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("failed to create capture dir {}", dir.display()))?;
    }

    let prompts = Arc::new(PromptStore::standard());
    let tool_ctx = ToolContext {
        tshark: tshark.clone(),
        prompts: prompts.clone(),
        capture_dir: config.capture_dir.clone(),
    };
    let registry = tools::build_registry(&tool_ctx).context("failed to build tool registry")?;
    tracing::info!(tools = registry.len(), "tool registry ready");
    let ctx = Arc::new(ServerContext::new(registry, prompts));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    spawn_signal_handler(shutdown_tx);

    match config.transport {
        TransportMode::Sse => {
            let addr = config.bind_addr();
            let listener = TcpListener::bind(&addr)
                .await
                .with_context(|| format!("failed to bind {addr}"))?;
            tracing::info!("server ready at http://{addr}/sse/");

            mcp_server::serve_http(listener, HttpState::new(ctx, tshark, shutdown_rx))
                .await
                .context("HTTP server failed")?;
        }
        TransportMode::Stdio => {
            tracing::info!("serving one session on stdio");
            mcp_server::serve_stdio(ctx, shutdown_rx).await;
        }
    }

    tracing::info!("=== wireshark-mcp stopped ===");
    Ok(())
}
