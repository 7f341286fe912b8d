//! Per-process output routing.
//!
//! Each analyzed process gets its own sink so debugger output from
//! different targets never interleaves. A sink fans lines out to the
//! invoking console and/or a dedicated `debugger_<name>_<pid>.log` file.

use clap::ValueEnum;
use ha_common::{executable_stem, ProcessId};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Destination kinds for per-process debugger output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// The invoking process's stdout.
    Stdout,
    /// A dedicated per-process log file.
    File,
}

/// Log file name for one process: `debugger_<stem>_<pid>.log`.
pub fn log_file_name(name: &str, pid: ProcessId) -> String {
    format!("debugger_{}_{}.log", executable_stem(name), pid)
}

/// Fan-out sink for one target process.
#[derive(Debug)]
pub struct ProcessSink {
    console: bool,
    file: Option<BufWriter<File>>,
    path: Option<PathBuf>,
}

impl ProcessSink {
    /// Build the sink for one process from the configured destinations.
    ///
    /// The log file is created eagerly (truncating a previous run's file)
    /// so a failure surfaces before any debugger is launched.
    pub fn open(
        kinds: &[SinkKind],
        dir: &Path,
        name: &str,
        pid: ProcessId,
    ) -> io::Result<ProcessSink> {
        let console = kinds.contains(&SinkKind::Stdout);
        let (file, path) = if kinds.contains(&SinkKind::File) {
            let path = dir.join(log_file_name(name, pid));
            (Some(BufWriter::new(File::create(&path)?)), Some(path))
        } else {
            (None, None)
        };
        Ok(ProcessSink {
            console,
            file,
            path,
        })
    }

    /// Path of the file destination, if one was configured.
    pub fn file_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write one line to every destination.
    ///
    /// Write failures degrade to a warning; losing a sink must not abort
    /// the diagnostics of the target process.
    pub fn log(&mut self, line: &str) {
        if self.console {
            let mut stdout = io::stdout().lock();
            if let Err(e) = writeln!(stdout, "{line}") {
                warn!(error = %e, "failed to write to stdout sink");
            }
        }
        if let Some(file) = self.file.as_mut() {
            if let Err(e) = writeln!(file, "{line}") {
                warn!(error = %e, "failed to write to file sink");
            }
        }
    }

    /// Flush buffered output on every destination.
    pub fn flush(&mut self) {
        if let Some(file) = self.file.as_mut() {
            if let Err(e) = file.flush() {
                warn!(error = %e, "failed to flush file sink");
            }
        }
        if self.console {
            let _ = io::stdout().lock().flush();
        }
    }
}

impl Drop for ProcessSink {
    fn drop(&mut self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_name_strips_extension() {
        assert_eq!(
            log_file_name("mongod.exe", ProcessId(42)),
            "debugger_mongod_42.log"
        );
        assert_eq!(
            log_file_name("mongod", ProcessId(7)),
            "debugger_mongod_7.log"
        );
    }

    #[test]
    fn file_sink_writes_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        {
            let mut sink =
                ProcessSink::open(&[SinkKind::File], dir.path(), "mongod", ProcessId(99))
                    .expect("open sink");
            sink.log("first line");
            sink.log("second line");
        }

        let path = dir.path().join("debugger_mongod_99.log");
        let content = std::fs::read_to_string(path).expect("read log");
        assert_eq!(content, "first line\nsecond line\n");
    }

    #[test]
    fn console_only_sink_has_no_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut sink = ProcessSink::open(&[SinkKind::Stdout], dir.path(), "mongod", ProcessId(1))
            .expect("open sink");
        assert!(sink.file_path().is_none());
        sink.log("goes to stdout only");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn combined_sink_reports_file_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = ProcessSink::open(
            &[SinkKind::Stdout, SinkKind::File],
            dir.path(),
            "dbtest",
            ProcessId(5),
        )
        .expect("open sink");
        let path = sink.file_path().expect("file path");
        assert!(path.ends_with("debugger_dbtest_5.log"));
        assert!(path.exists());
    }
}
