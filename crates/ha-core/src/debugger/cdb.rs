//! cdb driver for Windows.

use super::{dump_file_name, find_program, NativeDebugger};
use crate::runner;
use crate::sink::ProcessSink;
use ha_common::{executable_stem, ProcessId, Result};
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct CdbDriver;

/// Debugger install roots tried after the search path: Windows Kits
/// 8.0 and 8.1 under Program Files (x86).
fn windows_kits_dirs() -> Vec<PathBuf> {
    let Ok(root) = std::env::var("ProgramFiles(x86)") else {
        return Vec::new();
    };
    (0..2)
        .map(|minor| {
            PathBuf::from(&root)
                .join("Windows Kits")
                .join(format!("8.{minor}"))
                .join("Debuggers")
                .join("x64")
        })
        .collect()
}

fn locate_cdb() -> Option<PathBuf> {
    if let Some(cdb) = find_program("cdb.exe", &[]) {
        return Some(cdb);
    }
    for dir in windows_kits_dirs() {
        debug!(dir = %dir.display(), "checking for debugger");
        let candidate = dir.join("cdb.exe");
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// cdb command string for one attach session, `;`-joined.
fn session_commands(dump_file: Option<&str>) -> String {
    let mut cmds = vec![
        ".symfix".to_string(),       // fix the symbol path
        ".symopt +0x10".to_string(), // line loading is off by default in cdb
        ".reload".to_string(),
        "!peb".to_string(), // current exe and environment
        "lm".to_string(),   // loaded modules
    ];
    if let Some(dump_file) = dump_file {
        cmds.push(format!(".dump /ma {dump_file}"));
    }
    cmds.extend([
        "!uniqstack -pn".to_string(), // unique thread stacks with arguments
        "!cs -l".to_string(),         // locked critical sections
        ".detach".to_string(),
        "q".to_string(),
    ]);
    cmds.join(";")
}

impl NativeDebugger for CdbDriver {
    fn dump_info(
        &self,
        sink: &mut ProcessSink,
        pid: ProcessId,
        name: &str,
        take_dump: bool,
    ) -> Result<()> {
        let Some(cdb) = locate_cdb() else {
            warn!(%pid, "debugger cdb.exe not found, skipping dump of process");
            return Ok(());
        };
        info!(debugger = %cdb.display(), %pid, name, "analyzing native process");

        let dump_file =
            take_dump.then(|| dump_file_name(executable_stem(name), pid, self.dump_ext()));
        if let Some(dump_file) = dump_file.as_deref() {
            info!(dump_file, "dumping core");
        }

        let args = vec![
            "-c".to_string(),
            session_commands(dump_file.as_deref()),
            "-p".to_string(),
            pid.to_string(),
        ];
        runner::run_logged(sink, &cdb, &args)?;

        info!(%pid, name, "done analyzing native process");
        Ok(())
    }

    fn dump_ext(&self) -> &'static str {
        "mdmp"
    }
}
