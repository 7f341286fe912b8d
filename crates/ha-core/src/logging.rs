//! Tracing bootstrap for the orchestration-level log.
//!
//! All orchestration diagnostics go to stderr. Per-process debugger output
//! does not pass through tracing; it goes through [`crate::sink::ProcessSink`]
//! so the text of different targets never interleaves.
//!
//! `HA_LOG` (or `RUST_LOG`) selects the filter, `HA_LOG_FORMAT` selects
//! human vs JSONL output, and the CLI verbosity flags set the default when
//! neither variable is present.

use std::io::IsTerminal;
use tracing_subscriber::{fmt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable console format (default).
    #[default]
    Human,
    /// Machine-parseable JSON lines.
    Jsonl,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "console" | "pretty" => Ok(LogFormat::Human),
            "jsonl" | "json" | "machine" => Ok(LogFormat::Jsonl),
            _ => Err(format!("unknown log format: {s}")),
        }
    }
}

/// Logging configuration resolved from the environment and CLI flags.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Output format.
    pub format: LogFormat,
    /// Filter directive used when `HA_LOG`/`RUST_LOG` are unset.
    pub default_filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            default_filter: "info".to_string(),
        }
    }
}

impl LogConfig {
    /// Resolve the config from the environment plus the CLI verbosity flags.
    pub fn from_env(verbose: u8, quiet: bool) -> Self {
        let default_filter = if quiet {
            "error"
        } else {
            match verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
        .to_string();

        let format = std::env::var("HA_LOG_FORMAT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();

        LogConfig {
            format,
            default_filter,
        }
    }
}

/// Initialize the logging subsystem. Call once at startup.
pub fn init_logging(config: &LogConfig) {
    let filter = EnvFilter::try_from_env("HA_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    match config.format {
        LogFormat::Human => {
            let use_ansi = std::io::stderr().is_terminal();
            fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(use_ansi)
                .init();
        }
        LogFormat::Jsonl => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
