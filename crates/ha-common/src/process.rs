//! Process snapshot records and executable-name helpers.

use crate::id::ProcessId;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One live process as reported by the platform listing tool.
///
/// Records are captured once per run and never refreshed mid-sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub pid: ProcessId,
    pub name: String,
}

impl ProcessRecord {
    pub fn new(pid: u32, name: impl Into<String>) -> Self {
        Self {
            pid: ProcessId(pid),
            name: name.into(),
        }
    }
}

/// Executable name with a trailing extension stripped
/// (`mongod.exe` becomes `mongod`); names without one pass through.
pub fn executable_stem(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stem_strips_extension() {
        assert_eq!(executable_stem("mongod.exe"), "mongod");
        assert_eq!(executable_stem("service.test.exe"), "service.test");
    }

    #[test]
    fn stem_passes_plain_names_through() {
        assert_eq!(executable_stem("mongod"), "mongod");
        assert_eq!(executable_stem(""), "");
    }

    #[test]
    fn record_new_wraps_pid() {
        let record = ProcessRecord::new(42, "mongod");
        assert_eq!(record.pid, ProcessId(42));
        assert_eq!(record.name, "mongod");
    }
}
