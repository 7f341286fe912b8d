//! Process snapshot strategies.
//!
//! One enumerator per platform family, each invoking the native listing
//! tool and parsing its text output into uniform [`ProcessRecord`]s. A
//! snapshot is taken once per run; no record is ever refreshed mid-sweep.

mod darwin;
mod posix;
mod windows;

pub use darwin::DarwinEnumerator;
pub use posix::PosixEnumerator;
pub use windows::WindowsEnumerator;

use ha_common::{ProcessRecord, Result};

/// Platform strategy producing a one-shot snapshot of live processes.
pub trait ProcessEnumerator {
    /// Snapshot all live processes as (pid, executable name) records.
    ///
    /// Fails with [`ha_common::Error::ToolNotFound`] when the listing tool
    /// cannot be located; otherwise returns the full parse (possibly
    /// empty), never a partial result.
    fn snapshot(&self) -> Result<Vec<ProcessRecord>>;
}
