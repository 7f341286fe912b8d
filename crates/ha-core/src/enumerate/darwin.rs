//! `ps -axco pid,comm` enumerator for macOS.

use super::ProcessEnumerator;
use crate::debugger::find_program;
use crate::runner;
use ha_common::{Error, ProcessRecord, Result};
use tracing::{debug, info};

const PS_FALLBACK_DIRS: &[&str] = &["/bin"];

/// Enumerator for macOS, where `comm` is already a bare executable name
/// and no path reduction is needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct DarwinEnumerator;

impl ProcessEnumerator for DarwinEnumerator {
    fn snapshot(&self) -> Result<Vec<ProcessRecord>> {
        let ps = find_program("ps", PS_FALLBACK_DIRS).ok_or_else(|| Error::ToolNotFound {
            tool: "ps".to_string(),
        })?;
        info!(ps = %ps.display(), "listing processes");

        let output = runner::run_captured(&ps, &["-axco".to_string(), "pid,comm".to_string()])
            .map_err(|e| Error::Enumeration(e.to_string()))?;
        Ok(parse_listing(&output))
    }
}

/// Parse `pid,comm` rows, skipping the header row and any malformed row.
fn parse_listing(output: &str) -> Vec<ProcessRecord> {
    let mut records = Vec::new();
    for line in output.lines() {
        let mut fields = line.split_whitespace();
        let (Some(pid_field), Some(comm_field)) = (fields.next(), fields.next()) else {
            continue;
        };
        if pid_field == "PID" {
            continue;
        }
        let Ok(pid) = pid_field.parse::<u32>() else {
            debug!(line, "skipping unparsable ps row");
            continue;
        };
        records.push(ProcessRecord::new(pid, comm_field));
    }
    records
}
