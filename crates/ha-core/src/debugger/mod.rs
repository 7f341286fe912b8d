//! Native debugger and JVM stack-dump drivers.
//!
//! One driver per platform family, selected once at startup. A driver
//! locates its tool, attaches to the live pid without stopping it for
//! good, always extracts the loaded-module list and an all-threads
//! backtrace, and optionally captures a full dump. A missing tool is a
//! warning, never an error: that target is skipped and the sweep goes on.

mod cdb;
mod gdb;
mod jstack;
mod lldb;

pub use cdb::CdbDriver;
pub use gdb::GdbDriver;
pub use jstack::{JstackDumper, JstackUnsupported};
pub use lldb::LldbDriver;

use crate::sink::ProcessSink;
use ha_common::{ProcessId, Result};
use std::path::{Path, PathBuf};

/// Platform debugger strategy for native targets.
pub trait NativeDebugger {
    /// Attach to `pid`, stream module and thread information into the
    /// sink, and capture a full dump when `take_dump` is set.
    fn dump_info(
        &self,
        sink: &mut ProcessSink,
        pid: ProcessId,
        name: &str,
        take_dump: bool,
    ) -> Result<()>;

    /// Extension of dump artifacts written by this driver.
    fn dump_ext(&self) -> &'static str;
}

/// JVM stack-dump strategy.
pub trait JvmDumper {
    /// Dump all Java thread stacks of `pid` into the sink.
    fn dump_info(&self, sink: &mut ProcessSink, pid: ProcessId, name: &str) -> Result<()>;
}

/// Locate `name` on the executable search path, then in `fallback_dirs`.
pub fn find_program(name: &str, fallback_dirs: &[&str]) -> Option<PathBuf> {
    if let Some(path_var) = std::env::var_os("PATH") {
        for dir in std::env::split_paths(&path_var) {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    for dir in fallback_dirs {
        let candidate = Path::new(dir).join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Dump artifact name: `dump_<name>_<pid>.<ext>`.
pub(crate) fn dump_file_name(name: &str, pid: ProcessId, ext: &str) -> String {
    format!("dump_{name}_{pid}.{ext}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_file_name_format() {
        assert_eq!(
            dump_file_name("mongod", ProcessId(942), "core"),
            "dump_mongod_942.core"
        );
        assert_eq!(
            dump_file_name("mongod", ProcessId(4532), "mdmp"),
            "dump_mongod_4532.mdmp"
        );
    }

    #[test]
    fn find_program_checks_fallback_dirs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let tool = dir.path().join("faketool");
        std::fs::write(&tool, b"#!/bin/sh\n").expect("write tool");

        let dir_str = dir.path().to_str().expect("utf-8 tempdir");
        assert_eq!(find_program("faketool", &[dir_str]), Some(tool));
    }

    #[test]
    fn find_program_misses_cleanly() {
        let dir = tempfile::tempdir().expect("tempdir");
        let dir_str = dir.path().to_str().expect("utf-8 tempdir");
        assert_eq!(find_program("no_such_tool_zz", &[dir_str]), None);
        assert_eq!(find_program("no_such_tool_zz", &[]), None);
    }
}
