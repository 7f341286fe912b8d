//! Diagnostic signal dispatch.
//!
//! Signal-cooperative runtimes emit their own diagnostics when poked with
//! the right signal. The dispatcher delivers it and then always waits a
//! grace interval so the target can act before any later dump pass runs.

use ha_common::{Error, ProcessId, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

/// Signals understood by cooperative targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticSignal {
    /// Dump-and-terminate (SIGABRT); the target is expected to exit.
    Abort,
    /// Dump-and-continue (SIGUSR1); the target keeps running.
    UserReport,
}

impl DiagnosticSignal {
    #[cfg(unix)]
    fn raw(self) -> libc::c_int {
        match self {
            DiagnosticSignal::Abort => libc::SIGABRT,
            DiagnosticSignal::UserReport => libc::SIGUSR1,
        }
    }
}

impl std::fmt::Display for DiagnosticSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticSignal::Abort => write!(f, "SIGABRT"),
            DiagnosticSignal::UserReport => write!(f, "SIGUSR1"),
        }
    }
}

/// Delivery seam so the orchestrator can be driven without sending real
/// signals.
pub trait Signaler {
    /// Deliver `signal` to `pid` and give the target its grace interval.
    fn signal(&self, pid: ProcessId, signal: DiagnosticSignal) -> Result<()>;
}

/// Dispatcher delivering diagnostic signals with a fixed grace interval.
#[derive(Debug, Clone)]
pub struct SignalDispatcher {
    grace: Duration,
}

impl SignalDispatcher {
    pub fn new(grace: Duration) -> Self {
        Self { grace }
    }

    /// Deliver `signal` to `pid`, then wait the grace interval.
    ///
    /// Delivery failure is logged and returned but never aborts the sweep;
    /// the grace wait happens regardless so a partially delivered pass
    /// keeps its timing.
    pub fn signal(&self, pid: ProcessId, signal: DiagnosticSignal) -> Result<()> {
        let delivery = self.deliver(pid, signal);
        if delivery.is_ok() {
            info!(%pid, %signal, "waiting for process to report");
        }
        std::thread::sleep(self.grace);
        delivery
    }

    #[cfg(unix)]
    fn deliver(&self, pid: ProcessId, signal: DiagnosticSignal) -> Result<()> {
        let rc = unsafe { libc::kill(pid.0 as libc::pid_t, signal.raw()) };
        if rc == 0 {
            return Ok(());
        }
        let err = std::io::Error::last_os_error();
        tracing::error!(%pid, %signal, error = %err, "failed to signal process");
        Err(Error::SignalDelivery {
            pid: pid.0,
            reason: err.to_string(),
        })
    }

    // Signals cannot be delivered to an arbitrary pid here; the attempt is
    // reported as a capability gap and the run continues.
    #[cfg(not(unix))]
    fn deliver(&self, pid: ProcessId, signal: DiagnosticSignal) -> Result<()> {
        tracing::warn!(%pid, %signal, "signal delivery is not supported on this platform");
        Err(Error::Unsupported(format!(
            "cannot send {signal} on this platform"
        )))
    }
}

impl Signaler for SignalDispatcher {
    fn signal(&self, pid: ProcessId, signal: DiagnosticSignal) -> Result<()> {
        SignalDispatcher::signal(self, pid, signal)
    }
}
