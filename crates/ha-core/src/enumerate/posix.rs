//! `ps -eo pid,args` enumerator for Linux and Solaris.

use super::ProcessEnumerator;
use crate::debugger::find_program;
use crate::runner;
use ha_common::{Error, ProcessRecord, Result};
use tracing::{debug, info};

/// Locations tried for `ps` after the executable search path.
const PS_FALLBACK_DIRS: &[&str] = &["/bin", "/usr/bin"];

/// Enumerator for platforms whose `ps` reports full command lines.
///
/// The second column is an argv; only the final path segment of its first
/// token is kept as the executable name.
#[derive(Debug, Clone, Copy)]
pub struct PosixEnumerator {
    probe_version: bool,
}

impl PosixEnumerator {
    /// Linux flavor; logs the `ps` version before listing.
    pub fn linux() -> Self {
        Self {
            probe_version: true,
        }
    }

    /// Solaris flavor.
    pub fn solaris() -> Self {
        Self {
            probe_version: false,
        }
    }
}

impl ProcessEnumerator for PosixEnumerator {
    fn snapshot(&self) -> Result<Vec<ProcessRecord>> {
        let ps = find_program("ps", PS_FALLBACK_DIRS).ok_or_else(|| Error::ToolNotFound {
            tool: "ps".to_string(),
        })?;
        info!(ps = %ps.display(), "listing processes");

        if self.probe_version {
            match runner::run_captured(&ps, &["--version".to_string()]) {
                Ok(version) => debug!(version = version.trim(), "ps version"),
                Err(e) => debug!(error = %e, "ps version probe failed"),
            }
        }

        let output = runner::run_captured(&ps, &["-eo".to_string(), "pid,args".to_string()])
            .map_err(|e| Error::Enumeration(e.to_string()))?;
        Ok(parse_listing(&output))
    }
}

/// Parse `pid,args` rows into records, skipping the header row and any
/// malformed row.
fn parse_listing(output: &str) -> Vec<ProcessRecord> {
    let mut records = Vec::new();
    for line in output.lines() {
        let mut fields = line.split_whitespace();
        let (Some(pid_field), Some(args_field)) = (fields.next(), fields.next()) else {
            continue;
        };
        if pid_field == "PID" {
            continue;
        }
        let Ok(pid) = pid_field.parse::<u32>() else {
            debug!(line, "skipping unparsable ps row");
            continue;
        };
        let name = args_field.rsplit('/').next().unwrap_or(args_field);
        records.push(ProcessRecord::new(pid, name));
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
  PID COMMAND
    1 /sbin/init splash
  942 /usr/bin/mongod --port 27017
 1000 python buildscripts/resmoke.py
 1001 dbtest
";

    #[test]
    fn parses_pids_and_basenames() {
        let records = parse_listing(SAMPLE);
        assert_eq!(records.len(), 4);
        assert_eq!(records[0], ProcessRecord::new(1, "init"));
        assert_eq!(records[1], ProcessRecord::new(942, "mongod"));
        assert_eq!(records[2], ProcessRecord::new(1000, "python"));
        assert_eq!(records[3], ProcessRecord::new(1001, "dbtest"));
    }

    #[test]
    fn skips_header_and_malformed_rows() {
        let records = parse_listing("  PID COMMAND\nnot-a-pid /bin/x\n\n  9 /bin/true\n");
        assert_eq!(records, vec![ProcessRecord::new(9, "true")]);
    }

    #[test]
    fn empty_output_parses_to_empty() {
        assert!(parse_listing("").is_empty());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn snapshot_includes_this_process() {
        let records = PosixEnumerator::linux().snapshot().expect("snapshot");
        let own = std::process::id();
        assert!(
            records.iter().any(|r| r.pid.0 == own),
            "own pid {own} missing from snapshot of {} processes",
            records.len()
        );
    }
}
