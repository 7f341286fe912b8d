//! jstack drivers for JVM targets.

use super::{find_program, JvmDumper};
use crate::runner;
use crate::sink::ProcessSink;
use ha_common::{ProcessId, Result};
use tracing::{info, warn};

const JSTACK_FALLBACK_DIRS: &[&str] = &["/usr/bin"];

/// JDK `jstack` dumper for platforms where it can attach.
#[derive(Debug, Clone, Copy, Default)]
pub struct JstackDumper;

impl JvmDumper for JstackDumper {
    fn dump_info(&self, sink: &mut ProcessSink, pid: ProcessId, name: &str) -> Result<()> {
        let Some(jstack) = find_program("jstack", JSTACK_FALLBACK_DIRS) else {
            warn!(%pid, "jstack not found, skipping dump of process");
            return Ok(());
        };
        info!(jstack = %jstack.display(), %pid, name, "analyzing JVM process");

        runner::run_logged(sink, &jstack, &["-l".to_string(), pid.to_string()])?;

        info!(%pid, name, "done analyzing JVM process");
        Ok(())
    }
}

/// Stand-in for platforms where jstack cannot introspect a JVM's threads.
///
/// This is a documented capability gap, not an error: the pass logs the
/// gap for the pid and moves on.
#[derive(Debug, Clone, Copy, Default)]
pub struct JstackUnsupported;

impl JvmDumper for JstackUnsupported {
    fn dump_info(&self, _sink: &mut ProcessSink, pid: ProcessId, _name: &str) -> Result<()> {
        warn!(%pid, "jstack is not supported on this platform, skipping dump of process");
        Ok(())
    }
}
