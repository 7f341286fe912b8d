//! Exit codes for the ha-core CLI.
//!
//! The code communicates the run outcome without output parsing:
//! individual per-process skips never change it, aggregate failures do.

/// Exit codes for analyzer runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Sweep completed; warnings and per-process skips allowed.
    Clean = 0,

    /// No usable process-enumeration or debugger strategy on this platform.
    NoStrategy = 1,

    /// Sweep completed but at least one per-process diagnostic failed.
    PartialFail = 2,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Clean)
    }

    /// Stable code name for machine-readable output.
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::NoStrategy => "ERR_NO_STRATEGY",
            ExitCode::PartialFail => "ERR_PARTIAL",
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ExitCode::Clean.as_i32(), 0);
        assert_eq!(ExitCode::NoStrategy.as_i32(), 1);
        assert_eq!(ExitCode::PartialFail.as_i32(), 2);
    }

    #[test]
    fn only_clean_is_success() {
        assert!(ExitCode::Clean.is_success());
        assert!(!ExitCode::NoStrategy.is_success());
        assert!(!ExitCode::PartialFail.is_success());
    }

    #[test]
    fn display_includes_name_and_code() {
        assert_eq!(ExitCode::PartialFail.to_string(), "ERR_PARTIAL (2)");
    }
}
