//! External tool invocation.
//!
//! Every debugger, stack-dump, and process-listing call funnels through
//! here: the argv is logged before execution, stdout is streamed
//! line-by-line into a process sink or captured whole, and a non-zero exit
//! becomes a typed error the orchestrator can contain per process.
//! Execution is strictly sequential and blocking; the invoking harness owns
//! the wall clock, so there is no timeout and no cancellation.

use crate::sink::ProcessSink;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;
use tracing::debug;

/// Errors from one external tool invocation.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("{command} exited with status {code}")]
    NonZeroExit { command: String, code: i32 },

    #[error("{command} terminated by a signal")]
    Killed { command: String },

    #[error("I/O error reading {command} output: {source}")]
    Io {
        command: String,
        source: std::io::Error,
    },
}

impl From<RunError> for ha_common::Error {
    fn from(err: RunError) -> Self {
        match err {
            RunError::Spawn { command, source } => ha_common::Error::ToolLaunch {
                tool: command,
                reason: source.to_string(),
            },
            RunError::NonZeroExit { command, code } => ha_common::Error::ToolFailed {
                tool: command,
                code,
            },
            RunError::Killed { command } => ha_common::Error::ToolKilled { tool: command },
            RunError::Io { source, .. } => ha_common::Error::Io(source),
        }
    }
}

fn tool_name(program: &Path) -> String {
    program
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("tool")
        .to_string()
}

fn render(program: &Path, args: &[String]) -> String {
    let mut rendered = program.display().to_string();
    for arg in args {
        rendered.push(' ');
        rendered.push_str(arg);
    }
    rendered
}

fn check_status(command: &str, status: ExitStatus) -> Result<(), RunError> {
    match status.code() {
        Some(0) => Ok(()),
        Some(code) => Err(RunError::NonZeroExit {
            command: command.to_string(),
            code,
        }),
        None => Err(RunError::Killed {
            command: command.to_string(),
        }),
    }
}

fn stream_lines(sink: &mut ProcessSink, stdout: impl Read) -> std::io::Result<()> {
    let reader = BufReader::new(stdout);
    for line in reader.lines() {
        sink.log(&line?);
    }
    Ok(())
}

/// Run a tool, streaming its stdout line-by-line into the process sink.
///
/// The rendered command line is logged to the sink first. stderr stays
/// attached to the invoking console.
pub fn run_logged(
    sink: &mut ProcessSink,
    program: &Path,
    args: &[String],
) -> Result<(), RunError> {
    let command = tool_name(program);
    let rendered = render(program, args);
    debug!(command = %rendered, "running tool");
    sink.log(&rendered);

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .spawn()
        .map_err(|source| RunError::Spawn {
            command: command.clone(),
            source,
        })?;

    // Read to EOF before waiting so the child never blocks on a full pipe.
    let read_result = match child.stdout.take() {
        Some(stdout) => stream_lines(sink, stdout),
        None => Ok(()),
    };

    let status = child.wait().map_err(|source| RunError::Io {
        command: command.clone(),
        source,
    })?;

    read_result.map_err(|source| RunError::Io {
        command: command.clone(),
        source,
    })?;

    check_status(&command, status)
}

/// Run a tool and capture its stdout as UTF-8 text.
pub fn run_captured(program: &Path, args: &[String]) -> Result<String, RunError> {
    let command = tool_name(program);
    debug!(command = %render(program, args), "running tool");

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|source| RunError::Spawn {
            command: command.clone(),
            source,
        })?;

    check_status(&command, output.status)?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
