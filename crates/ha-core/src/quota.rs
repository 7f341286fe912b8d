//! Dump quota guard.
//!
//! Authorizes a new dump against the cumulative size of dump artifacts
//! already on disk. The total is recomputed from the directory on every
//! call; callers must not cache the decision across dumps.

use std::io;
use std::path::Path;
use tracing::debug;

/// Total bytes of regular files in `dir` whose extension equals `ext`.
///
/// The extension match is case-sensitive.
pub fn dump_usage_bytes(dir: &Path, ext: &str) -> io::Result<u64> {
    let mut total = 0u64;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(ext) {
            continue;
        }
        let meta = entry.metadata()?;
        if meta.is_file() {
            total += meta.len();
        }
    }
    Ok(total)
}

/// Whether a new `.<ext>` dump may be written under `ceiling_bytes`.
///
/// The boundary is inclusive: usage exactly at the ceiling still allows the
/// next dump.
pub fn within_quota(dir: &Path, ceiling_bytes: u64, ext: &str) -> io::Result<bool> {
    let used = dump_usage_bytes(dir, ext)?;
    debug!(used, ceiling_bytes, ext, "dump quota check");
    Ok(used <= ceiling_bytes)
}
