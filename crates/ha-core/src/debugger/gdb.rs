//! gdb driver for Linux and Solaris.

use super::{dump_file_name, find_program, NativeDebugger};
use crate::runner;
use crate::sink::ProcessSink;
use ha_common::{ProcessId, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Install locations tried after the executable search path.
const GDB_FALLBACK_DIRS: &[&str] = &["/opt/bongodbtoolchain/gdb/bin", "/usr/bin"];

/// Pretty-printer and analysis extension script, relative to this
/// executable's directory.
const PRINTERS_SCRIPT: &str = "gdb/printers.py";

#[derive(Debug, Clone, Copy, Default)]
pub struct GdbDriver;

impl GdbDriver {
    fn printers_script() -> Option<PathBuf> {
        let exe = std::env::current_exe().ok()?;
        Some(exe.parent()?.join(PRINTERS_SCRIPT))
    }
}

/// gdb command sequence for one attach session.
fn session_commands(pid: ProcessId, printers: &Path, dump_file: Option<&str>) -> Vec<String> {
    let mut cmds = vec![
        "set pagination off".to_string(),
        format!("attach {pid}"),
        "info sharedlibrary".to_string(),
        "info threads".to_string(), // thread names, before the full backtrace
        "set python print-stack full".to_string(),
        format!("source {}", printers.display()),
        "thread apply all bt".to_string(),
    ];
    if let Some(dump_file) = dump_file {
        cmds.push(format!("gcore {dump_file}"));
    }
    cmds.extend([
        "bongodb-analyze".to_string(),
        "set confirm off".to_string(),
        "quit".to_string(),
    ]);
    cmds
}

impl NativeDebugger for GdbDriver {
    fn dump_info(
        &self,
        sink: &mut ProcessSink,
        pid: ProcessId,
        name: &str,
        take_dump: bool,
    ) -> Result<()> {
        let Some(gdb) = find_program("gdb", GDB_FALLBACK_DIRS) else {
            warn!(%pid, "debugger gdb not found, skipping dump of process");
            return Ok(());
        };
        info!(debugger = %gdb.display(), %pid, name, "analyzing native process");

        runner::run_logged(sink, &gdb, &["--version".to_string()])?;

        let printers = Self::printers_script().unwrap_or_else(|| PathBuf::from(PRINTERS_SCRIPT));
        info!(printers = %printers.display(), "loading analysis extensions");

        let dump_file = take_dump.then(|| dump_file_name(name, pid, self.dump_ext()));
        if let Some(dump_file) = dump_file.as_deref() {
            info!(dump_file, "dumping core");
        }

        let mut args = vec!["--quiet".to_string(), "--nx".to_string()];
        for cmd in session_commands(pid, &printers, dump_file.as_deref()) {
            args.push("-ex".to_string());
            args.push(cmd);
        }
        runner::run_logged(sink, &gdb, &args)?;

        info!(%pid, name, "done analyzing native process");
        Ok(())
    }

    fn dump_ext(&self) -> &'static str {
        "core"
    }
}
