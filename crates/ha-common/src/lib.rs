//! Hang analyzer shared types.
//!
//! This crate provides the foundational types shared across ha-core
//! modules:
//! - Process identity and snapshot records
//! - Executable-name helpers
//! - The unified error type with stable categories

pub mod error;
pub mod id;
pub mod process;

pub use error::{Error, ErrorCategory, Result};
pub use id::ProcessId;
pub use process::{executable_stem, ProcessRecord};
