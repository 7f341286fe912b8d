//! lldb driver for macOS.

use super::{dump_file_name, find_program, NativeDebugger};
use crate::runner;
use crate::sink::ProcessSink;
use ha_common::{Error, ProcessId, Result};
use std::io::Write;
use tracing::{info, warn};

const LLDB_FALLBACK_DIRS: &[&str] = &["/usr/bin"];

/// Oldest XCode lldb whose scripted input works. XCode 7.2 ships
/// lldb-340.4.119; older builds mishandle command files.
const MIN_XCODE_LLDB_MAJOR: u32 = 340;

#[derive(Debug, Clone, Copy, Default)]
pub struct LldbDriver;

/// Major version of an XCode-style `lldb-NNN.N.N` version string.
///
/// LLVM builds report `lldb version N.N.N` instead and never reach this
/// parse.
fn xcode_lldb_major(version: &str) -> Option<u32> {
    let start = version.find("lldb-")? + "lldb-".len();
    let rest = version.get(start..)?;
    let major: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    major.parse().ok()
}

/// lldb command sequence for one attach session.
fn session_commands(pid: ProcessId, dump_file: Option<&str>) -> Vec<String> {
    let mut cmds = vec![
        format!("attach -p {pid}"),
        "target modules list".to_string(),
        "thread backtrace all".to_string(),
    ];
    if let Some(dump_file) = dump_file {
        cmds.push(format!("process save-core {dump_file}"));
    }
    cmds.extend([
        "settings set interpreter.prompt-on-quit false".to_string(),
        "quit".to_string(),
    ]);
    cmds
}

impl NativeDebugger for LldbDriver {
    fn dump_info(
        &self,
        sink: &mut ProcessSink,
        pid: ProcessId,
        name: &str,
        take_dump: bool,
    ) -> Result<()> {
        let Some(lldb) = find_program("lldb", LLDB_FALLBACK_DIRS) else {
            warn!(%pid, "debugger lldb not found, skipping dump of process");
            return Ok(());
        };
        info!(debugger = %lldb.display(), %pid, name, "analyzing native process");

        let version = runner::run_captured(&lldb, &["--version".to_string()])?;
        sink.log(version.trim());

        if !version.contains("version") {
            // XCode's lldb rather than LLVM's; gate on the build number.
            match xcode_lldb_major(&version) {
                Some(major) if major < MIN_XCODE_LLDB_MAJOR => {
                    warn!(
                        major,
                        "lldb is too old, upgrade to XCode 7.2 or later; skipping"
                    );
                    return Ok(());
                }
                Some(_) => {}
                None => {
                    warn!(
                        version = version.trim(),
                        "unrecognized lldb version string, skipping"
                    );
                    return Ok(());
                }
            }
        }

        let dump_file = take_dump.then(|| dump_file_name(name, pid, self.dump_ext()));
        if let Some(dump_file) = dump_file.as_deref() {
            info!(dump_file, "dumping core");
        }

        // lldb takes its commands from a file; old builds choke on -o chains.
        let mut script = tempfile::NamedTempFile::new().map_err(Error::Io)?;
        for cmd in session_commands(pid, dump_file.as_deref()) {
            sink.log(&cmd);
            writeln!(script, "{cmd}").map_err(Error::Io)?;
        }
        script.flush().map_err(Error::Io)?;

        let script_path = script.path().to_string_lossy().into_owned();
        runner::run_logged(sink, &lldb, &["--source".to_string(), script_path])?;

        info!(%pid, name, "done analyzing native process");
        Ok(())
    }

    fn dump_ext(&self) -> &'static str {
        "core"
    }
}
