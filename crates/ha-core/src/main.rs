//! Hang analyzer CLI.
//!
//! Invoked by the CI harness when a test run appears hung. Discovers
//! interesting processes, captures thread and stack state with the
//! platform debugger, optionally writes core dumps under a disk quota,
//! and signals cooperative runtimes so they report on themselves.

use clap::Parser;
use ha_core::config::{AnalyzerConfig, DEFAULT_MAX_DUMP_MB};
use ha_core::exit_codes::ExitCode;
use ha_core::logging::{init_logging, LogConfig};
use ha_core::orchestrator::Orchestrator;
use ha_core::platform;
use ha_core::sink::SinkKind;
use tracing::{debug, error, info, warn};

/// Hang analyzer: dump or summarize every interesting process via the
/// platform debugger, jstack, or a diagnostic signal
#[derive(Parser, Debug)]
#[command(name = "ha-core")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Comma-separated list of process names to analyze
    #[arg(short = 'p', long, value_delimiter = ',')]
    process_names: Option<Vec<String>>,

    /// Comma-separated list of go process names to analyze
    #[arg(short = 'g', long, value_delimiter = ',')]
    go_process_names: Option<Vec<String>>,

    /// Comma-separated list of process ids (PID) to analyze, overrides -p & -g
    #[arg(short = 'd', long, value_delimiter = ',')]
    process_ids: Option<Vec<u32>>,

    /// Dump core file for each analyzed process
    #[arg(short = 'c', long)]
    dump_core: bool,

    /// Maximum total size of core dumps to keep in megabytes
    #[arg(short = 's', long, default_value_t = DEFAULT_MAX_DUMP_MB)]
    max_core_dumps_size: u64,

    /// Where debugger output goes: stdout and/or a
    /// debugger_<process>_<pid>.log file per analyzed process; may be
    /// given multiple times [default: stdout]
    #[arg(short = 'o', long, value_enum)]
    debugger_output: Vec<SinkKind>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn into_config(self) -> AnalyzerConfig {
        let mut config = AnalyzerConfig::default();
        if let Some(names) = self.process_names {
            config.interest_names = names;
        }
        if let Some(go_names) = self.go_process_names {
            config.go_names = go_names;
        }
        if let Some(pids) = self.process_ids {
            config.target_pids = pids;
        }
        config.dump_core = self.dump_core;
        config.max_dump_bytes = self.max_core_dumps_size * 1024 * 1024;
        if !self.debugger_output.is_empty() {
            config.sinks = self.debugger_output;
        }
        config
    }
}

fn main() {
    std::process::exit(run().as_i32());
}

fn run() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_env(cli.verbose, cli.quiet));

    info!(
        os = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        "host platform"
    );
    log_current_user();

    let Some(strategies) = platform::detect() else {
        warn!(os = std::env::consts::OS, "unsupported platform");
        return ExitCode::NoStrategy;
    };

    let config = cli.into_config();
    debug!(?config, "resolved configuration");

    let orchestrator = Orchestrator::new(config, strategies);
    match orchestrator.run() {
        Ok(report) => {
            match serde_json::to_string(&report) {
                Ok(json) => debug!(report = %json, "run report"),
                Err(e) => warn!(error = %e, "failed to serialize run report"),
            }
            if report.any_failed() {
                ExitCode::PartialFail
            } else {
                ExitCode::Clean
            }
        }
        Err(e) => {
            error!(error = %e, "hang analysis aborted");
            ExitCode::NoStrategy
        }
    }
}

#[cfg(unix)]
fn log_current_user() {
    let uid = unsafe { libc::getuid() };
    info!(uid, "current user");
}

#[cfg(not(unix))]
fn log_current_user() {}
