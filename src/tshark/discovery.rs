//! Capability checks: is `tshark` runnable, and which interfaces can it capture on.

use super::commands;
use super::errors::TsharkError;
use super::runner::CommandRunner;
use super::types::InterfaceRecord;

/// Whether the binary can be spawned at all.
///
/// Runs `tshark --version`; the exit code is not inspected. A missing binary
/// is a normal `false`, never an error.
pub async fn check_installed(runner: &dyn CommandRunner) -> bool {
    match runner.spawn_only(&commands::version_args()).await {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(error = %e, "install check failed");
            false
        }
    }
}

/// Run `tshark -D` and parse its output.
///
/// Unlike [`list_interfaces`], a spawn failure or a non-zero exit is reported
/// as an error so callers can tell "query failed" from "no interfaces".
pub async fn query_interfaces(
    runner: &dyn CommandRunner,
) -> Result<Vec<InterfaceRecord>, TsharkError> {
    let output = runner.run(&commands::list_interfaces_args()).await?;

    if !output.success() {
        return Err(TsharkError::NonZeroExit {
            binary: runner.binary().to_string(),
            code: output.exit_code,
            stderr: output.stderr.trim().to_string(),
        });
    }

    Ok(parse_interfaces(&output.stdout))
}

/// Enumerate capture interfaces, returning an empty list on any failure.
pub async fn list_interfaces(runner: &dyn CommandRunner) -> Vec<InterfaceRecord> {
    match query_interfaces(runner).await {
        Ok(interfaces) => interfaces,
        Err(e) => {
            tracing::warn!(error = %e, "interface query failed");
            Vec::new()
        }
    }
}

/// Parse `tshark -D` output.
///
/// Each non-empty line has the shape `"<index>. <description>"`; it is split
/// on the first whitespace run, and the trailing `.` of the index token is
/// stripped. Lines that don't split into two parts are dropped.
pub fn parse_interfaces(stdout: &str) -> Vec<InterfaceRecord> {
    stdout
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            let (index, rest) = line.split_once(char::is_whitespace)?;
            let description = rest.trim_start();
            if description.is_empty() {
                return None;
            }
            Some(InterfaceRecord {
                index: index.trim_end_matches('.').to_string(),
                interface: description.to_string(),
            })
        })
        .collect()
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tshark::runner::stub::StubRunner;

    #[test]
    fn test_parse_interfaces_basic() {
        let parsed = parse_interfaces("1. en0 (Wi-Fi)\n2. lo0 (Loopback)\n");
        assert_eq!(
            parsed,
            vec![
                InterfaceRecord {
                    index: "1".into(),
                    interface: "en0 (Wi-Fi)".into(),
                },
                InterfaceRecord {
                    index: "2".into(),
                    interface: "lo0 (Loopback)".into(),
                },
            ]
        );
    }

    #[test]
    fn test_parse_interfaces_drops_blank_and_single_token_lines() {
        let parsed = parse_interfaces("\n1. eth0\n\ngarbage\n3.   any\n");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].index, "1");
        assert_eq!(parsed[0].interface, "eth0");
        assert_eq!(parsed[1].index, "3");
        assert_eq!(parsed[1].interface, "any");
    }

    #[test]
    fn test_parse_interfaces_keeps_reported_order() {
        let parsed = parse_interfaces("10. z\n2. a\n");
        let indices: Vec<&str> = parsed.iter().map(|i| i.index.as_str()).collect();
        assert_eq!(indices, vec!["10", "2"]);
    }

    #[test]
    fn test_parse_interfaces_windows_style() {
        let line = r"1. \Device\NPF_{5A3C} (Ethernet)";
        let parsed = parse_interfaces(line);
        assert_eq!(parsed[0].interface, r"\Device\NPF_{5A3C} (Ethernet)");
    }

    #[tokio::test]
    async fn test_unavailable_runner_checks_are_quiet() {
        let runner = StubRunner::unavailable();
        assert!(!check_installed(&runner).await);
        assert!(list_interfaces(&runner).await.is_empty());
    }

    #[tokio::test]
    async fn test_check_installed_ignores_exit_code() {
        let runner = StubRunner::failing(2, "bad flag");
        assert!(check_installed(&runner).await);
        assert_eq!(runner.calls(), vec![vec!["--version".to_string()]]);
    }

    #[tokio::test]
    async fn test_query_interfaces_distinguishes_failure() {
        let runner = StubRunner::failing(1, "permission denied");
        let err = query_interfaces(&runner).await.unwrap_err();
        assert!(matches!(
            err,
            TsharkError::NonZeroExit { code: Some(1), ref stderr, .. } if stderr == "permission denied"
        ));
        assert!(err.to_string().contains("exited with code 1: permission denied"));
        assert!(list_interfaces(&runner).await.is_empty());

        let empty = StubRunner::ok("");
        assert!(query_interfaces(&empty).await.unwrap().is_empty());
    }
}
