//! `tasklist /FO CSV` enumerator for Windows.

use super::ProcessEnumerator;
use crate::runner;
use ha_common::{Error, ProcessRecord, Result};
use std::path::Path;
use tracing::{debug, info};

/// Enumerator for Windows. `tasklist` already reports a bare image name,
/// so no path reduction is applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsEnumerator;

impl ProcessEnumerator for WindowsEnumerator {
    fn snapshot(&self) -> Result<Vec<ProcessRecord>> {
        let windir = std::env::var("WINDIR").map_err(|_| Error::ToolNotFound {
            tool: "tasklist.exe".to_string(),
        })?;
        let tasklist = Path::new(&windir).join("system32").join("tasklist.exe");
        if !tasklist.is_file() {
            return Err(Error::ToolNotFound {
                tool: "tasklist.exe".to_string(),
            });
        }
        info!(tasklist = %tasklist.display(), "listing processes");

        let output = runner::run_captured(&tasklist, &["/FO".to_string(), "CSV".to_string()])
            .map_err(|e| Error::Enumeration(e.to_string()))?;
        Ok(parse_listing(&output))
    }
}

/// Parse CSV rows of `"Image Name","PID",...`, skipping the header row.
fn parse_listing(output: &str) -> Vec<ProcessRecord> {
    let mut records = Vec::new();
    for line in output.lines() {
        let fields = split_csv_row(line);
        if fields.len() < 2 || fields[1] == "PID" {
            continue;
        }
        let Ok(pid) = fields[1].parse::<u32>() else {
            debug!(line, "skipping unparsable tasklist row");
            continue;
        };
        records.push(ProcessRecord::new(pid, fields[0].as_str()));
    }
    records
}

/// Split one CSV row, honoring double-quoted fields with embedded commas
/// and doubled-quote escapes.
fn split_csv_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                chars.next();
                current.push('"');
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    if !current.is_empty() || !fields.is_empty() {
        fields.push(current);
    }
    fields
}
