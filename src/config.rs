//! Server configuration.
//!
//! Resolution order, later layers winning:
//! 1. Built-in defaults
//! 2. YAML file: `$WIRESHARK_MCP_CONFIG`, else `<config_dir>/wireshark-mcp/config.yaml`
//!    when it exists. `${VAR}` and `${VAR:-default}` are expanded first.
//! 3. Environment: `MCP_HOST`, `MCP_PORT`, `TSHARK_PATH`, `MCP_TRANSPORT`,
//!    `MCP_CAPTURE_DIR`, `MCP_LOG_FILE`

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Env var naming an explicit config file.
pub const CONFIG_ENV: &str = "WIRESHARK_MCP_CONFIG";

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("failed to parse config {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

// ─── Types ───────────────────────────────────────────────────────────────────

/// How sessions reach the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// HTTP listener with one SSE stream per session.
    Sse,
    /// A single session over stdin/stdout.
    Stdio,
}

impl FromStr for TransportMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sse" | "http" => Ok(TransportMode::Sse),
            "stdio" => Ok(TransportMode::Stdio),
            _ => Err(ConfigError::InvalidValue {
                key: "transport".into(),
                value: s.to_string(),
                reason: "expected 'sse' or 'stdio'".into(),
            }),
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMode::Sse => f.write_str("sse"),
            TransportMode::Stdio => f.write_str("stdio"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address for the HTTP transport.
    pub host: String,
    pub port: u16,
    /// tshark executable, resolved through `PATH` when bare.
    pub tshark_path: String,
    pub transport: TransportMode,
    /// Where synthesized capture files go. Current directory when unset.
    pub capture_dir: Option<PathBuf>,
    /// Log to this file instead of stderr.
    pub log_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3001,
            tshark_path: "tshark".into(),
            transport: TransportMode::Sse,
            capture_dir: None,
            log_file: None,
        }
    }
}

// ─── Loading ─────────────────────────────────────────────────────────────────

impl ServerConfig {
    /// Resolve the configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let lookup = |key: &str| std::env::var(key).ok();

        let mut config = match config_path(&lookup) {
            Some(path) => Self::from_file(&path, &lookup)?,
            None => Self::default(),
        };
        config.apply_overrides(&lookup)?;
        Ok(config)
    }

    /// Parse a YAML config file, expanding `${VAR}` references through `lookup`.
    pub fn from_file(
        path: &Path,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let expanded = interpolate_vars(&raw, lookup);
        if expanded.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&expanded).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Apply environment overrides on top of the current values.
    pub fn apply_overrides(
        &mut self,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(host) = non_empty(lookup("MCP_HOST")) {
            self.host = host;
        }
        if let Some(port) = non_empty(lookup("MCP_PORT")) {
            self.port = port.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: "MCP_PORT".into(),
                value: port.clone(),
                reason: format!("{e}"),
            })?;
        }
        if let Some(path) = non_empty(lookup("TSHARK_PATH")) {
            self.tshark_path = path;
        }
        if let Some(mode) = non_empty(lookup("MCP_TRANSPORT")) {
            self.transport = mode.parse()?;
        }
        if let Some(dir) = non_empty(lookup("MCP_CAPTURE_DIR")) {
            self.capture_dir = Some(PathBuf::from(expand_tilde(&dir)));
        }
        if let Some(file) = non_empty(lookup("MCP_LOG_FILE")) {
            self.log_file = Some(PathBuf::from(expand_tilde(&file)));
        }
        Ok(())
    }

    /// `host:port` for the HTTP listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Explicit config path if set, else the per-user file when it exists.
fn config_path(lookup: &dyn Fn(&str) -> Option<String>) -> Option<PathBuf> {
    if let Some(explicit) = non_empty(lookup(CONFIG_ENV)) {
        return Some(PathBuf::from(expand_tilde(&explicit)));
    }

    let candidate = dirs::config_dir()?.join("wireshark-mcp").join("config.yaml");
    candidate.exists().then_some(candidate)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ─── Variable expansion ──────────────────────────────────────────────────────

/// Replace `${VAR}` and `${VAR:-default}` in `input`.
///
/// An unset variable without a default expands to the empty string.
fn interpolate_vars(input: &str, lookup: &dyn Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated: keep the text as written.
            out.push_str(&rest[start..]);
            return out;
        };

        let expr = &after[..end];
        let value = match expr.split_once(":-") {
            Some((name, default)) => lookup(name).unwrap_or_else(|| expand_tilde(default)),
            None => lookup(expr).unwrap_or_default(),
        };
        out.push_str(&value);
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

/// Expand a leading `~` to the home directory.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return format!("{}{rest}", home.display());
        }
    }
    path.to_string()
}

// ─── Tests ───────────────────────────────────────────────────────────────────
