//! Analyzer configuration.
//!
//! The orchestrator receives an explicit configuration value; the CLI
//! layer builds it from flags. The defaults match what CI harnesses have
//! always invoked, so existing invocations keep working unchanged.

use crate::sink::SinkKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Interest substrings applied when no explicit list is given.
pub const DEFAULT_INTEREST_NAMES: &[&str] = &[
    "bongo", "bongod", "bongos", "_test", "dbtest", "python", "java",
];

/// Default quota ceiling for dump artifacts, in megabytes.
pub const DEFAULT_MAX_DUMP_MB: u64 = 10_000;

/// Grace interval given to a signaled process before any later dump pass.
pub const DEFAULT_SIGNAL_GRACE: Duration = Duration::from_secs(5);

/// Configuration for one analyzer run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Substrings matched case-sensitively against executable names.
    pub interest_names: Vec<String>,

    /// Substrings whose matches are signal-cooperative and terminate after
    /// the diagnostic signal. Always part of the interest set too.
    pub go_names: Vec<String>,

    /// Explicit target pids; overrides name matching when non-empty.
    pub target_pids: Vec<u32>,

    /// Write a full core/minidump per native target, quota permitting.
    pub dump_core: bool,

    /// Quota ceiling for on-disk dump artifacts, in bytes.
    pub max_dump_bytes: u64,

    /// Destinations for per-process debugger output.
    pub sinks: Vec<SinkKind>,

    /// Grace interval after a diagnostic signal.
    pub grace: Duration,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            interest_names: DEFAULT_INTEREST_NAMES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            go_names: Vec::new(),
            target_pids: Vec::new(),
            dump_core: false,
            max_dump_bytes: DEFAULT_MAX_DUMP_MB * 1024 * 1024,
            sinks: vec![SinkKind::Stdout],
            grace: DEFAULT_SIGNAL_GRACE,
        }
    }
}

impl AnalyzerConfig {
    /// All interest substrings, go names included.
    pub fn all_interest_names(&self) -> impl Iterator<Item = &str> {
        self.interest_names
            .iter()
            .chain(self.go_names.iter())
            .map(String::as_str)
    }
}
