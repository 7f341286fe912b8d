//! Platform strategy selection.
//!
//! One concrete strategy bundle per supported operating system, chosen
//! once at startup. There is no re-selection at runtime.

use crate::debugger::{
    CdbDriver, GdbDriver, JstackDumper, JstackUnsupported, JvmDumper, LldbDriver, NativeDebugger,
};
use crate::enumerate::{
    DarwinEnumerator, PosixEnumerator, ProcessEnumerator, WindowsEnumerator,
};

/// Strategy bundle for the running platform.
pub struct PlatformStrategies {
    /// Platform label for logs and reports.
    pub label: &'static str,
    pub enumerator: Box<dyn ProcessEnumerator>,
    pub debugger: Box<dyn NativeDebugger>,
    pub jvm: Box<dyn JvmDumper>,
}

/// Select the strategies for the running OS. `None` means the platform
/// has no usable enumeration or debugger strategy at all.
pub fn detect() -> Option<PlatformStrategies> {
    detect_for(std::env::consts::OS)
}

/// Strategy table keyed by `std::env::consts::OS` values.
pub fn detect_for(os: &str) -> Option<PlatformStrategies> {
    match os {
        "linux" => Some(PlatformStrategies {
            label: "linux",
            enumerator: Box::new(PosixEnumerator::linux()),
            debugger: Box::new(GdbDriver),
            jvm: Box::new(JstackDumper),
        }),
        "solaris" | "illumos" => Some(PlatformStrategies {
            label: "solaris",
            enumerator: Box::new(PosixEnumerator::solaris()),
            debugger: Box::new(GdbDriver),
            jvm: Box::new(JstackDumper),
        }),
        "windows" => Some(PlatformStrategies {
            label: "windows",
            enumerator: Box::new(WindowsEnumerator),
            debugger: Box::new(CdbDriver),
            jvm: Box::new(JstackUnsupported),
        }),
        "macos" => Some(PlatformStrategies {
            label: "macos",
            enumerator: Box::new(DarwinEnumerator),
            debugger: Box::new(LldbDriver),
            jvm: Box::new(JstackDumper),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_platforms_have_strategies() {
        for os in ["linux", "solaris", "illumos", "windows", "macos"] {
            let strategies = detect_for(os);
            assert!(strategies.is_some(), "no strategies for {os}");
        }
    }

    #[test]
    fn unknown_platform_has_none() {
        assert!(detect_for("freebsd").is_none());
        assert!(detect_for("plan9").is_none());
    }

    #[test]
    fn dump_extensions_match_platform_convention() {
        assert_eq!(detect_for("linux").unwrap().debugger.dump_ext(), "core");
        assert_eq!(detect_for("macos").unwrap().debugger.dump_ext(), "core");
        assert_eq!(detect_for("windows").unwrap().debugger.dump_ext(), "mdmp");
    }

    #[test]
    fn running_platform_is_supported() {
        // Test hosts are always one of the supported platforms.
        assert!(detect().is_some());
    }
}
