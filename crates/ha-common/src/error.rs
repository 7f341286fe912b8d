//! Error types for the hang analyzer.
//!
//! A missing tool or an undeliverable signal is an expected condition on
//! some platforms, so every variant carries enough context for the caller
//! to warn and keep sweeping instead of aborting.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for hang analyzer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping and filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Process listing and snapshot errors.
    Enumeration,
    /// External tool errors (debugger, jstack, listing tool).
    Tool,
    /// Signal delivery errors.
    Signal,
    /// File and pipe I/O errors.
    Io,
    /// Platform capability gaps.
    Platform,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Enumeration => write!(f, "enumeration"),
            ErrorCategory::Tool => write!(f, "tool"),
            ErrorCategory::Signal => write!(f, "signal"),
            ErrorCategory::Io => write!(f, "io"),
            ErrorCategory::Platform => write!(f, "platform"),
        }
    }
}

/// Unified error type for the hang analyzer.
#[derive(Error, Debug)]
pub enum Error {
    #[error("required tool not found: {tool}")]
    ToolNotFound { tool: String },

    #[error("failed to launch {tool}: {reason}")]
    ToolLaunch { tool: String, reason: String },

    #[error("{tool} exited with status {code}")]
    ToolFailed { tool: String, code: i32 },

    #[error("{tool} terminated by a signal")]
    ToolKilled { tool: String },

    #[error("process listing failed: {0}")]
    Enumeration(String),

    #[error("failed to signal process {pid}: {reason}")]
    SignalDelivery { pid: u32, reason: String },

    #[error("not supported on this platform: {0}")]
    Unsupported(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::ToolNotFound { .. }
            | Error::ToolLaunch { .. }
            | Error::ToolFailed { .. }
            | Error::ToolKilled { .. } => ErrorCategory::Tool,

            Error::Enumeration(_) => ErrorCategory::Enumeration,
            Error::SignalDelivery { .. } => ErrorCategory::Signal,
            Error::Unsupported(_) => ErrorCategory::Platform,
            Error::Io(_) => ErrorCategory::Io,
        }
    }

    /// Whether the sweep can continue past this error.
    ///
    /// Everything is recoverable per target; only a failed snapshot ends
    /// the run, since there is nothing left to iterate.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::Enumeration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_mapping() {
        let err = Error::ToolNotFound {
            tool: "gdb".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Tool);

        let err = Error::SignalDelivery {
            pid: 42,
            reason: "no such process".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Signal);

        assert_eq!(
            Error::Unsupported("jstack".to_string()).category(),
            ErrorCategory::Platform
        );
        assert_eq!(
            Error::Enumeration("ps died".to_string()).category(),
            ErrorCategory::Enumeration
        );
    }

    #[test]
    fn enumeration_failure_is_not_recoverable() {
        assert!(!Error::Enumeration("ps died".to_string()).is_recoverable());
        assert!(Error::ToolFailed {
            tool: "gdb".to_string(),
            code: 1
        }
        .is_recoverable());
    }

    #[test]
    fn display_includes_context() {
        let err = Error::ToolFailed {
            tool: "gdb".to_string(),
            code: 127,
        };
        assert_eq!(err.to_string(), "gdb exited with status 127");

        let err = Error::ToolNotFound {
            tool: "jstack".to_string(),
        };
        assert!(err.to_string().contains("jstack"));
    }

    #[test]
    fn category_display() {
        assert_eq!(ErrorCategory::Tool.to_string(), "tool");
        assert_eq!(ErrorCategory::Enumeration.to_string(), "enumeration");
    }
}
