//! Point-in-time process memory footprint.
//!
//! One public contract over platform-specific queries: a sample carries the
//! process's virtual address-space size and resident set size in bytes. On
//! Linux both come from `/proc/self/statm` scaled by the page size. When the
//! query is unavailable the probe degrades to zero samples and warns once; it
//! never fails the caller.

use serde::{Deserialize, Serialize};
use std::sync::Once;

/// Process memory footprint at the instant of a [`sample`] call, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemorySample {
    pub virtual_bytes: u64,
    pub resident_bytes: u64,
}

/// Signed change between two samples. Negative values are a valid outcome;
/// memory released between samples is not clamped to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryDelta {
    pub virtual_bytes: i64,
    pub resident_bytes: i64,
}

/// Samples the current process footprint. Returns zeros when the platform
/// query cannot be performed.
pub fn sample() -> MemorySample {
    match read_usage() {
        Some(sample) => sample,
        None => {
            warn_unavailable();
            MemorySample::default()
        }
    }
}

/// `after` minus `before`, per field.
pub fn delta(before: MemorySample, after: MemorySample) -> MemoryDelta {
    MemoryDelta {
        virtual_bytes: after.virtual_bytes as i64 - before.virtual_bytes as i64,
        resident_bytes: after.resident_bytes as i64 - before.resident_bytes as i64,
    }
}

static WARN_ONCE: Once = Once::new();

fn warn_unavailable() {
    WARN_ONCE.call_once(|| {
        tracing::warn!("process memory query unavailable; reporting zero footprint");
    });
}

#[cfg(target_os = "linux")]
fn read_usage() -> Option<MemorySample> {
    // statm reports pages: total program size first, resident set second.
    let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
    let mut fields = statm.split_whitespace();
    let size: u64 = fields.next()?.parse().ok()?;
    let rss: u64 = fields.next()?.parse().ok()?;

    let page = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if page <= 0 {
        return None;
    }

    Some(MemorySample {
        virtual_bytes: size * page as u64,
        resident_bytes: rss * page as u64,
    })
}

#[cfg(not(target_os = "linux"))]
fn read_usage() -> Option<MemorySample> {
    None
}
