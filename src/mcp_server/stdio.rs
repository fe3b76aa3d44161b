//! Line-delimited stdio transport.
//!
//! One session per process: frames are read line by line from stdin and
//! answers go to stdout through a [`WriterSink`]. Logs must stay on stderr.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader};
use tokio::sync::{mpsc, watch};

use super::session::{ServerContext, Session, SessionState};
use super::sink::WriterSink;

/// Inbound frames buffered ahead of the session loop.
const INBOUND_CAPACITY: usize = 64;

/// Serve a single session over the process's stdin and stdout.
pub async fn serve_stdio(ctx: Arc<ServerContext>, shutdown: watch::Receiver<bool>) -> SessionState {
    serve_stream(tokio::io::stdin(), tokio::io::stdout(), ctx, shutdown).await
}

/// Serve a single session over any byte stream pair.
pub async fn serve_stream<R, W>(
    reader: R,
    writer: W,
    ctx: Arc<ServerContext>,
    shutdown: watch::Receiver<bool>,
) -> SessionState
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(INBOUND_CAPACITY);
    let pump = tokio::spawn(read_frames(reader, tx));

    let id = uuid::Uuid::new_v4().to_string();
    let session = Session::new(id, ctx, Arc::new(WriterSink::new(writer)));
    let state = session.run(rx, shutdown).await;

    // A blocked stdin read would otherwise outlive the session.
    pump.abort();
    state
}

/// Forward each non-empty line to the session until EOF or the session ends.
async fn read_frames<R>(reader: R, tx: mpsc::Sender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                tracing::debug!("stdin closed");
                break;
            }
            Ok(_) => {
                let frame = line.trim();
                if frame.is_empty() {
                    continue;
                }
                if tx.send(frame.to_string()).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to read from stdin");
                break;
            }
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use tokio::io::AsyncWriteExt;

    use super::*;
    use crate::tools::{build_registry, PromptStore, ToolContext};
    use crate::tshark::runner::stub::StubRunner;
    use crate::tshark::{AnalysisTable, Tshark};

    fn context(runner: Arc<StubRunner>) -> Arc<ServerContext> {
        let prompts = Arc::new(PromptStore::standard());
        let tools = ToolContext {
            tshark: Tshark::new(runner, Arc::new(AnalysisTable::standard())),
            prompts: prompts.clone(),
            capture_dir: None,
        };
        Arc::new(ServerContext::new(build_registry(&tools).unwrap(), prompts))
    }

    async fn exchange(runner: Arc<StubRunner>, input: &str) -> Vec<Value> {
        let (mut client_in, server_in) = tokio::io::duplex(4096);
        let (server_out, client_out) = tokio::io::duplex(64 * 1024);
        let (_shutdown, shutdown_rx) = watch::channel(false);

        client_in.write_all(input.as_bytes()).await.unwrap();
        drop(client_in);

        let state = serve_stream(server_in, server_out, context(runner), shutdown_rx).await;
        assert_eq!(state, SessionState::Closed);

        let mut lines = BufReader::new(client_out).lines();
        let mut frames = Vec::new();
        while let Some(line) = lines.next_line().await.unwrap() {
            frames.push(serde_json::from_str(&line).unwrap());
        }
        frames
    }

    #[tokio::test]
    async fn test_stdio_session_lists_tools() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n",
        );
        let frames = exchange(Arc::new(StubRunner::ok("")), input).await;

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0]["id"], 1);
        let tools = frames[1]["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 8);
        assert_eq!(tools[0]["name"], "wireshark_check_installation");
    }

    #[tokio::test]
    async fn test_stdio_validation_failure_spawns_nothing() {
        let runner = Arc::new(StubRunner::ok(""));
        let call = json!({
            "jsonrpc": "2.0", "id": 3, "method": "tools/call",
            "params": {"name": "wireshark_analyze", "arguments": {"file_path": "x.pcap", "analysis_type": "bogus"}}
        });
        let input = format!(
            "{}\n{}\n",
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#,
            call
        );
        let frames = exchange(runner.clone(), &input).await;

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1]["result"]["isError"], true);
        assert!(frames[1]["result"]["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("conversations, endpoints, protocols, http, dns"));
        assert_eq!(runner.spawn_count(), 0);
    }

    #[tokio::test]
    async fn test_stdio_eof_before_initialize_closes_quietly() {
        let frames = exchange(Arc::new(StubRunner::ok("")), "").await;
        assert!(frames.is_empty());
    }
}
