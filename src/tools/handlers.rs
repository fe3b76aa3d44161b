//! The `wireshark_*` tools.
//!
//! Each handler is a stateless pipeline over the shared [`Tshark`] facade:
//! read bound arguments → validate → run → wrap the outcome. Validation
//! failures never spawn a process.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;

use crate::tshark::commands::{self, DEFAULT_CAPTURE_DURATION, DEFAULT_READ_LIMIT};
use crate::tshark::{CaptureRequest, InterfaceRecord, ReadRequest, Tshark};

use super::args::ToolArgs;
use super::errors::ToolError;
use super::prompts::{PromptSnippet, PromptStore};
use super::registry::{ToolHandler, ToolRegistry};
use super::types::{ArgKind, ArgSpec, ToolDescriptor, ToolResult};

// ─── Context ────────────────────────────────────────────────────────────────

/// Shared, read-only dependencies of the tool handlers.
#[derive(Clone)]
pub struct ToolContext {
    pub tshark: Tshark,
    pub prompts: Arc<PromptStore>,
    /// Directory for synthesized capture file names (cwd when `None`).
    pub capture_dir: Option<PathBuf>,
}

/// Build the registry of every `wireshark_*` tool.
pub fn build_registry(ctx: &ToolContext) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();

    registry.register(
        ToolDescriptor::new(
            "wireshark_check_installation",
            "Check whether Wireshark (tshark) is installed and runnable",
        ),
        Arc::new(CheckInstallation {
            tshark: ctx.tshark.clone(),
        }),
    )?;

    registry.register(
        ToolDescriptor::new(
            "wireshark_get_interfaces",
            "List the network interfaces available for capture",
        ),
        Arc::new(GetInterfaces {
            tshark: ctx.tshark.clone(),
        }),
    )?;

    registry.register(
        ToolDescriptor::new("wireshark_capture_packets", "Capture live network packets")
            .arg(ArgSpec::required(
                "interface",
                ArgKind::String,
                "Interface to capture on (index or name)",
            ))
            .arg(
                ArgSpec::optional("duration", ArgKind::Integer, "Capture duration in seconds")
                    .with_default(json!(DEFAULT_CAPTURE_DURATION)),
            )
            .arg(ArgSpec::optional(
                "filter_str",
                ArgKind::String,
                "Optional capture filter (BPF syntax)",
            ))
            .arg(ArgSpec::optional(
                "output_file",
                ArgKind::String,
                "Optional output file path; defaults to capture_<timestamp>.pcap",
            )),
        Arc::new(CapturePackets {
            tshark: ctx.tshark.clone(),
            capture_dir: ctx.capture_dir.clone(),
        }),
    )?;

    registry.register(
        ToolDescriptor::new("wireshark_read_capture", "Read packets from a capture file")
            .arg(ArgSpec::required("file_path", ArgKind::String, "Capture file path"))
            .arg(ArgSpec::optional(
                "filter_str",
                ArgKind::String,
                "Optional display filter",
            ))
            .arg(
                ArgSpec::optional(
                    "limit",
                    ArgKind::Integer,
                    "Maximum number of packets to read (0 for no limit)",
                )
                .with_default(json!(DEFAULT_READ_LIMIT)),
            ),
        Arc::new(ReadCapture {
            tshark: ctx.tshark.clone(),
        }),
    )?;

    let analysis_names = ctx.tshark.analyses().names().join(", ");
    registry.register(
        ToolDescriptor::new(
            "wireshark_analyze",
            "Analyze a capture file and produce statistics",
        )
        .arg(ArgSpec::required("file_path", ArgKind::String, "Capture file path"))
        .arg(ArgSpec::required(
            "analysis_type",
            ArgKind::String,
            &format!("Analysis type ({analysis_names})"),
        )),
        Arc::new(Analyze {
            tshark: ctx.tshark.clone(),
        }),
    )?;

    registry.register(
        ToolDescriptor::new("wireshark_get_prompts", "List all Wireshark reference prompts"),
        Arc::new(GetPrompts {
            prompts: ctx.prompts.clone(),
        }),
    )?;

    registry.register(
        ToolDescriptor::new("wireshark_get_prompt", "Get one Wireshark reference prompt")
            .arg(ArgSpec::required("prompt_id", ArgKind::String, "Prompt id")),
        Arc::new(GetPrompt {
            prompts: ctx.prompts.clone(),
        }),
    )?;

    registry.register(
        ToolDescriptor::new(
            "wireshark_health_check",
            "Report installation status and the number of capture interfaces",
        ),
        Arc::new(HealthCheck {
            tshark: ctx.tshark.clone(),
        }),
    )?;

    Ok(registry)
}

// ─── Environment ────────────────────────────────────────────────────────────

struct CheckInstallation {
    tshark: Tshark,
}

#[async_trait]
impl ToolHandler for CheckInstallation {
    async fn call(&self, _args: ToolArgs) -> ToolResult {
        let installed = self.tshark.check_installed().await;
        ToolResult::from_serialize(&json!({ "installed": installed }))
    }
}

struct GetInterfaces {
    tshark: Tshark,
}

#[derive(Serialize)]
struct InterfacesResponse {
    interfaces: Vec<InterfaceRecord>,
}

#[async_trait]
impl ToolHandler for GetInterfaces {
    async fn call(&self, _args: ToolArgs) -> ToolResult {
        match self.tshark.query_interfaces().await {
            Ok(interfaces) => ToolResult::from_serialize(&InterfacesResponse { interfaces }),
            Err(e) => ToolError::from(e).into(),
        }
    }
}

// ─── Capture / Read / Analyze ───────────────────────────────────────────────

struct CapturePackets {
    tshark: Tshark,
    capture_dir: Option<PathBuf>,
}

impl CapturePackets {
    fn request(&self, args: &ToolArgs) -> Result<CaptureRequest, ToolError> {
        let output_file = match args.str("output_file").filter(|s| !s.is_empty()) {
            Some(path) => path.to_string(),
            None => commands::default_capture_file(
                self.capture_dir.as_deref(),
                chrono::Utc::now().timestamp(),
            ),
        };

        Ok(CaptureRequest {
            interface: args.require_str("interface")?.to_string(),
            duration_secs: args.positive_int("duration")?,
            filter: args.str("filter_str").map(String::from),
            output_file: Some(output_file),
        })
    }
}

#[async_trait]
impl ToolHandler for CapturePackets {
    async fn call(&self, args: ToolArgs) -> ToolResult {
        let req = match self.request(&args) {
            Ok(req) => req,
            Err(e) => return e.into(),
        };

        tracing::info!(
            interface = %req.interface,
            duration_secs = req.duration_secs,
            filter = ?req.filter,
            "starting packet capture"
        );

        match self.tshark.capture(&req).await {
            Ok(outcome) => {
                if outcome.success {
                    tracing::info!(output_file = ?outcome.output_file, "capture finished");
                } else {
                    tracing::warn!(stderr = %outcome.stderr.trim(), "capture exited with failure");
                }
                ToolResult::from_serialize(&outcome)
            }
            Err(e) => ToolError::from(e).into(),
        }
    }
}

struct ReadCapture {
    tshark: Tshark,
}

#[async_trait]
impl ToolHandler for ReadCapture {
    async fn call(&self, args: ToolArgs) -> ToolResult {
        let req = match read_request(&args) {
            Ok(req) => req,
            Err(e) => return e.into(),
        };

        match self.tshark.read(&req).await {
            Ok(outcome) => ToolResult::from_serialize(&outcome),
            Err(e) => ToolError::from(e).into(),
        }
    }
}

fn read_request(args: &ToolArgs) -> Result<ReadRequest, ToolError> {
    Ok(ReadRequest {
        file_path: args.require_str("file_path")?.to_string(),
        display_filter: args.str("filter_str").map(String::from),
        limit: args.non_negative_int("limit")?,
    })
}

struct Analyze {
    tshark: Tshark,
}

#[async_trait]
impl ToolHandler for Analyze {
    async fn call(&self, args: ToolArgs) -> ToolResult {
        let (file_path, analysis_type) =
            match (args.require_str("file_path"), args.require_str("analysis_type")) {
                (Ok(f), Ok(a)) => (f, a),
                (Err(e), _) | (_, Err(e)) => return e.into(),
            };

        match self.tshark.analyze(file_path, analysis_type).await {
            Ok(outcome) => {
                let mut result = ToolResult::from_serialize(&outcome);
                if let ToolResult::Success(map) = &mut result {
                    map.insert("analysis_type".into(), json!(analysis_type));
                }
                result
            }
            Err(e) => ToolError::from(e).into(),
        }
    }
}

// ─── Prompts ────────────────────────────────────────────────────────────────

struct GetPrompts {
    prompts: Arc<PromptStore>,
}

#[derive(Serialize)]
struct PromptsResponse<'a> {
    prompts: &'a [PromptSnippet],
}

#[async_trait]
impl ToolHandler for GetPrompts {
    async fn call(&self, _args: ToolArgs) -> ToolResult {
        ToolResult::from_serialize(&PromptsResponse {
            prompts: self.prompts.snippets(),
        })
    }
}

struct GetPrompt {
    prompts: Arc<PromptStore>,
}

#[async_trait]
impl ToolHandler for GetPrompt {
    async fn call(&self, args: ToolArgs) -> ToolResult {
        let id = match args.require_str("prompt_id") {
            Ok(id) => id,
            Err(e) => return e.into(),
        };

        match self.prompts.snippet(id) {
            Some(prompt) => ToolResult::from_serialize(&json!({ "prompt": prompt })),
            None => ToolError::UnknownPrompt { id: id.to_string() }.into(),
        }
    }
}

// ─── Health ─────────────────────────────────────────────────────────────────

struct HealthCheck {
    tshark: Tshark,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    wireshark_installed: bool,
    interface_count: usize,
    timestamp: f64,
}

#[async_trait]
impl ToolHandler for HealthCheck {
    async fn call(&self, _args: ToolArgs) -> ToolResult {
        let installed = self.tshark.check_installed().await;
        let interface_count = if installed {
            self.tshark.list_interfaces().await.len()
        } else {
            0
        };

        ToolResult::from_serialize(&HealthResponse {
            status: if installed { "ok" } else { "error" },
            wireshark_installed: installed,
            interface_count,
            timestamp: unix_time_secs(),
        })
    }
}

/// Current time as fractional Unix seconds.
pub fn unix_time_secs() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tshark::runner::stub::StubRunner;
    use crate::tshark::AnalysisTable;
    use serde_json::Value;

    fn registry_with(runner: Arc<StubRunner>) -> ToolRegistry {
        let ctx = ToolContext {
            tshark: Tshark::new(runner, Arc::new(AnalysisTable::standard())),
            prompts: Arc::new(PromptStore::standard()),
            capture_dir: None,
        };
        build_registry(&ctx).unwrap()
    }

    fn success(result: ToolResult) -> serde_json::Map<String, Value> {
        match result {
            ToolResult::Success(map) => map,
            ToolResult::Failure { message } => panic!("expected success, got failure: {message}"),
        }
    }

    fn failure(result: ToolResult) -> String {
        match result {
            ToolResult::Failure { message } => message,
            ToolResult::Success(map) => panic!("expected failure, got {map:?}"),
        }
    }

    #[test]
    fn test_registry_lists_all_tools() {
        let registry = registry_with(Arc::new(StubRunner::ok("")));
        let names: Vec<&str> = registry.list().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "wireshark_check_installation",
                "wireshark_get_interfaces",
                "wireshark_capture_packets",
                "wireshark_read_capture",
                "wireshark_analyze",
                "wireshark_get_prompts",
                "wireshark_get_prompt",
                "wireshark_health_check",
            ]
        );
    }

    #[tokio::test]
    async fn test_capture_synthesizes_output_file() {
        let runner = Arc::new(StubRunner::ok(""));
        let registry = registry_with(runner.clone());

        let map = success(
            registry
                .dispatch(
                    "wireshark_capture_packets",
                    &json!({"interface": "1", "duration": 5}),
                )
                .await,
        );

        let output_file = map["output_file"].as_str().unwrap();
        assert!(!output_file.is_empty());
        assert!(output_file.starts_with("capture_"));
        assert!(output_file.ends_with(".pcap"));
        assert_eq!(map["success"], true);
        assert_eq!(map["file_written"], false);

        let argv = &runner.calls()[0];
        assert!(argv.contains(&"duration:5".to_string()));
        assert!(argv.contains(&"1".to_string()));
        assert!(argv.contains(&output_file.to_string()));
    }

    #[tokio::test]
    async fn test_capture_rejects_non_positive_duration() {
        let runner = Arc::new(StubRunner::ok(""));
        let registry = registry_with(runner.clone());

        let msg = failure(
            registry
                .dispatch(
                    "wireshark_capture_packets",
                    &json!({"interface": "1", "duration": 0}),
                )
                .await,
        );
        assert!(msg.contains("'duration'"));
        assert_eq!(runner.spawn_count(), 0);
    }

    #[tokio::test]
    async fn test_capture_spawn_failure_is_failure() {
        let registry = registry_with(Arc::new(StubRunner::unavailable()));
        let msg = failure(
            registry
                .dispatch("wireshark_capture_packets", &json!({"interface": "1"}))
                .await,
        );
        assert!(msg.contains("not available"));
    }

    #[tokio::test]
    async fn test_read_non_zero_exit_is_success_false() {
        let runner = Arc::new(StubRunner::failing(2, "The file \"x.pcap\" doesn't exist."));
        let registry = registry_with(runner.clone());

        let map = success(
            registry
                .dispatch(
                    "wireshark_read_capture",
                    &json!({"file_path": "x.pcap", "filter_str": "dns"}),
                )
                .await,
        );
        assert_eq!(map["success"], false);
        assert!(map["stderr"].as_str().unwrap().contains("doesn't exist"));
        assert_eq!(
            runner.calls()[0],
            vec!["-r", "x.pcap", "-Y", "dns", "-c", "100"]
        );
    }

    #[tokio::test]
    async fn test_analyze_unknown_type_lists_valid_names() {
        let runner = Arc::new(StubRunner::ok(""));
        let registry = registry_with(runner.clone());

        let msg = failure(
            registry
                .dispatch(
                    "wireshark_analyze",
                    &json!({"file_path": "a.pcap", "analysis_type": "voip"}),
                )
                .await,
        );
        assert!(msg.contains("voip"));
        assert!(msg.contains("conversations, endpoints, protocols, http, dns"));
        assert_eq!(runner.spawn_count(), 0);
    }

    #[tokio::test]
    async fn test_analyze_success_reports_type() {
        let registry = registry_with(Arc::new(StubRunner::ok("=== DNS ===")));
        let map = success(
            registry
                .dispatch(
                    "wireshark_analyze",
                    &json!({"file_path": "a.pcap", "analysis_type": "dns"}),
                )
                .await,
        );
        assert_eq!(map["analysis_type"], "dns");
        assert_eq!(map["stdout"], "=== DNS ===");
    }

    #[tokio::test]
    async fn test_get_interfaces() {
        let registry = registry_with(Arc::new(StubRunner::ok("1. en0 (Wi-Fi)\n2. lo0 (Loopback)\n")));
        let map = success(registry.dispatch("wireshark_get_interfaces", &json!({})).await);
        assert_eq!(
            map["interfaces"],
            json!([
                {"index": "1", "interface": "en0 (Wi-Fi)"},
                {"index": "2", "interface": "lo0 (Loopback)"},
            ])
        );
    }

    #[tokio::test]
    async fn test_get_interfaces_query_failure_is_failure() {
        let registry = registry_with(Arc::new(StubRunner::unavailable()));
        let result = registry.dispatch("wireshark_get_interfaces", &Value::Null).await;
        assert!(!result.is_success());
    }

    #[tokio::test]
    async fn test_check_installation_and_health() {
        let registry = registry_with(Arc::new(StubRunner::unavailable()));
        let map = success(registry.dispatch("wireshark_check_installation", &json!({})).await);
        assert_eq!(map["installed"], false);

        let map = success(registry.dispatch("wireshark_health_check", &json!({})).await);
        assert_eq!(map["status"], "error");
        assert_eq!(map["interface_count"], 0);
        assert!(map["timestamp"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_prompts() {
        let registry = registry_with(Arc::new(StubRunner::ok("")));
        let map = success(registry.dispatch("wireshark_get_prompts", &json!({})).await);
        assert_eq!(map["prompts"].as_array().unwrap().len(), 3);

        let map = success(
            registry
                .dispatch("wireshark_get_prompt", &json!({"prompt_id": "wireshark_commands"}))
                .await,
        );
        assert_eq!(map["prompt"]["id"], "wireshark_commands");

        let msg = failure(
            registry
                .dispatch("wireshark_get_prompt", &json!({"prompt_id": "nope"}))
                .await,
        );
        assert!(msg.contains("nope"));
    }
}
