//! Command builders: pure functions from typed requests to `tshark` argv.
//!
//! Nothing here spawns a process or touches the filesystem. Filter
//! expressions are passed through verbatim; `tshark` is the only judge of
//! their syntax.

use std::path::Path;

// ─── Constants ──────────────────────────────────────────────────────────────

/// Default capture length in seconds.
pub const DEFAULT_CAPTURE_DURATION: u64 = 10;

/// Default number of packets printed when reading a capture file.
pub const DEFAULT_READ_LIMIT: u64 = 100;

// ─── Requests ───────────────────────────────────────────────────────────────

/// Parameters for a live capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    /// Interface index or name, passed to `-i` as-is.
    pub interface: String,
    /// Autostop bound in seconds; callers guarantee it is positive.
    pub duration_secs: u64,
    /// Capture (BPF) filter for `-f`.
    pub filter: Option<String>,
    /// File for `-w`; without it `tshark` prints packets to stdout.
    pub output_file: Option<String>,
}

/// Parameters for reading a capture file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRequest {
    pub file_path: String,
    /// Display filter for `-Y`.
    pub display_filter: Option<String>,
    /// Packet count for `-c`; 0 disables the limit.
    pub limit: u64,
}

// ─── Builders ───────────────────────────────────────────────────────────────

/// `tshark --version`
pub fn version_args() -> Vec<String> {
    vec!["--version".into()]
}

/// `tshark -D`
pub fn list_interfaces_args() -> Vec<String> {
    vec!["-D".into()]
}

/// `tshark -i <iface> -a duration:<n> [-f <filter>] [-w <file>]`
pub fn capture_args(req: &CaptureRequest) -> Vec<String> {
    let mut args = vec![
        "-i".to_string(),
        req.interface.clone(),
        "-a".to_string(),
        format!("duration:{}", req.duration_secs),
    ];

    if let Some(filter) = non_empty(req.filter.as_deref()) {
        args.push("-f".into());
        args.push(filter.to_string());
    }

    if let Some(output) = non_empty(req.output_file.as_deref()) {
        args.push("-w".into());
        args.push(output.to_string());
    }

    args
}

/// `tshark -r <file> [-Y <filter>] [-c <limit>]`
pub fn read_args(req: &ReadRequest) -> Vec<String> {
    let mut args = vec!["-r".to_string(), req.file_path.clone()];

    if let Some(filter) = non_empty(req.display_filter.as_deref()) {
        args.push("-Y".into());
        args.push(filter.to_string());
    }

    if req.limit > 0 {
        args.push("-c".into());
        args.push(req.limit.to_string());
    }

    args
}

/// `tshark -r <file> -q -z <selector>`
pub fn statistics_args(file_path: &str, selector: &str) -> Vec<String> {
    vec![
        "-r".to_string(),
        file_path.to_string(),
        "-q".to_string(),
        "-z".to_string(),
        selector.to_string(),
    ]
}

/// Default capture file name for a capture started at `unix_secs`,
/// optionally placed inside `dir`.
pub fn default_capture_file(dir: Option<&Path>, unix_secs: i64) -> String {
    let name = format!("capture_{unix_secs}.pcap");
    match dir {
        Some(dir) => dir.join(name).to_string_lossy().into_owned(),
        None => name,
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn capture(filter: Option<&str>, output: Option<&str>) -> CaptureRequest {
        CaptureRequest {
            interface: "1".into(),
            duration_secs: 5,
            filter: filter.map(String::from),
            output_file: output.map(String::from),
        }
    }

    #[test]
    fn test_capture_args_minimal() {
        assert_eq!(
            capture_args(&capture(None, None)),
            vec!["-i", "1", "-a", "duration:5"]
        );
    }

    #[test]
    fn test_capture_args_with_filter_and_output() {
        let args = capture_args(&capture(Some("tcp port 80"), Some("/tmp/out.pcap")));
        assert_eq!(
            args,
            vec!["-i", "1", "-a", "duration:5", "-f", "tcp port 80", "-w", "/tmp/out.pcap"]
        );
    }

    #[test]
    fn test_capture_args_skip_empty_strings() {
        assert_eq!(capture_args(&capture(Some(""), Some(""))).len(), 4);
    }

    #[test]
    fn test_read_args_default_limit() {
        let req = ReadRequest {
            file_path: "a.pcap".into(),
            display_filter: None,
            limit: DEFAULT_READ_LIMIT,
        };
        assert_eq!(read_args(&req), vec!["-r", "a.pcap", "-c", "100"]);
    }

    #[test]
    fn test_read_args_filter_and_no_limit() {
        let req = ReadRequest {
            file_path: "a.pcap".into(),
            display_filter: Some("dns".into()),
            limit: 0,
        };
        assert_eq!(read_args(&req), vec!["-r", "a.pcap", "-Y", "dns"]);
    }

    #[test]
    fn test_statistics_args() {
        assert_eq!(
            statistics_args("a.pcap", "io,phs"),
            vec!["-r", "a.pcap", "-q", "-z", "io,phs"]
        );
    }

    #[test]
    fn test_default_capture_file() {
        assert_eq!(default_capture_file(None, 1700000000), "capture_1700000000.pcap");
        let in_dir = default_capture_file(Some(Path::new("/var/captures")), 42);
        assert!(in_dir.ends_with("capture_42.pcap"));
        assert!(in_dir.starts_with("/var/captures"));
    }

    #[test]
    fn test_version_and_interface_args() {
        assert_eq!(version_args(), vec!["--version"]);
        assert_eq!(list_interfaces_args(), vec!["-D"]);
    }
}
