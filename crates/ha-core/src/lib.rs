//! Hang analyzer core.
//!
//! Invoked by a CI harness when a test run appears hung: discovers live
//! processes of interest, attaches the platform debugger (or sends a
//! diagnostic signal) to capture thread and stack state, optionally writes
//! a full core/minidump under a disk quota, and routes each process's
//! diagnostic text to its own sink. No cooperation from the hung process
//! is assumed, and no single misbehaving target aborts the sweep.

pub mod config;
pub mod debugger;
pub mod enumerate;
pub mod exit_codes;
pub mod logging;
pub mod orchestrator;
pub mod platform;
pub mod quota;
pub mod runner;
pub mod signal;
pub mod sink;

pub use config::AnalyzerConfig;
pub use orchestrator::{Orchestrator, RunReport};
