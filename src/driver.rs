//! The throttled repeat loop.
//!
//! [`run`] calls [`EnginePool::compress`] back to back.  Every
//! [`Throttle::every`] successful iterations it hands freed heap pages back to
//! the OS ([`reclaim_memory`]) and sleeps for [`Throttle::cooldown`], which
//! keeps the resident set of a process that never exits from creeping up.
//!
//! The first failure ends the loop.  Nothing is retried: an engine or
//! resource fault that happened once is expected to happen again.

use std::error::Error;
use std::fmt;
use std::path::Path;
use std::thread;
use std::time::Duration;

use crate::config::{COOLDOWN, THROTTLE_EVERY};
use crate::displaylevel;
use crate::io::{CompressError, EnginePool};

// ---------------------------------------------------------------------------
// Throttle policy
// ---------------------------------------------------------------------------

/// When and how long the loop pauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    /// Pause after every `every` successful iterations.  Zero never pauses.
    pub every: u64,
    /// Length of each pause.
    pub cooldown: Duration,
}

impl Default for Throttle {
    fn default() -> Self {
        Throttle {
            every: THROTTLE_EVERY,
            cooldown: COOLDOWN,
        }
    }
}

impl Throttle {
    /// Whether the loop pauses after its `iteration`-th success (1-based).
    pub fn should_pause(&self, iteration: u64) -> bool {
        self.every != 0 && iteration != 0 && iteration % self.every == 0
    }
}

// ---------------------------------------------------------------------------
// Loop result types
// ---------------------------------------------------------------------------

/// Counters of a finished loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Successful compressions.
    pub iterations: u64,
    /// Throttle pauses taken.
    pub pauses: u64,
}

/// The loop stopped on a failed compression.
#[derive(Debug)]
pub struct LoopFailure {
    /// Counters up to, not including, the failed iteration.
    pub stats: LoopStats,
    pub error: CompressError,
}

impl fmt::Display for LoopFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "iteration {} failed: {}",
            self.stats.iterations + 1,
            self.error
        )
    }
}

impl Error for LoopFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.error)
    }
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

/// Compress `input` into `output` repeatedly through `pool`.
///
/// Runs until a compression fails or, when `limit` is set, until `limit`
/// iterations have succeeded.
pub fn run(
    pool: &EnginePool,
    input: &Path,
    output: &Path,
    throttle: &Throttle,
    limit: Option<u64>,
) -> Result<LoopStats, LoopFailure> {
    let mut stats = LoopStats::default();
    loop {
        if limit.is_some_and(|max| stats.iterations >= max) {
            return Ok(stats);
        }
        if let Err(error) = pool.compress(input, output) {
            return Err(LoopFailure { stats, error });
        }
        stats.iterations += 1;
        displaylevel!(4, "iteration {} done\n", stats.iterations);

        if throttle.should_pause(stats.iterations) {
            pause(throttle.cooldown);
            stats.pauses += 1;
        }
    }
}

fn pause(cooldown: Duration) {
    reclaim_memory();
    if let Some(kib) = peak_rss_kib() {
        displaylevel!(3, "peak resident set: {} KiB\n", kib);
    }
    displaylevel!(2, "sleeping for {}\n", format_duration(cooldown));
    thread::sleep(cooldown);
    displaylevel!(2, "resuming\n");
}

// ---------------------------------------------------------------------------
// Memory helpers
// ---------------------------------------------------------------------------

/// Best-effort hint to return freed heap memory to the OS.
///
/// Only glibc exposes such a hook; on other targets this does nothing.
pub fn reclaim_memory() {
    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    // SAFETY: malloc_trim only releases unused pages at the top of the heap
    // and arenas; it does not touch live allocations.
    unsafe {
        libc::malloc_trim(0);
    }
}

/// Peak resident set size of this process in KiB.
#[cfg(unix)]
pub fn peak_rss_kib() -> Option<u64> {
    use nix::sys::resource::{getrusage, UsageWho};

    let usage = getrusage(UsageWho::RUSAGE_SELF).ok()?;
    let max_rss = u64::try_from(usage.max_rss()).ok()?;
    // Darwin reports bytes, everyone else kilobytes.
    if cfg!(target_vendor = "apple") {
        Some(max_rss / 1024)
    } else {
        Some(max_rss)
    }
}

#[cfg(not(unix))]
pub fn peak_rss_kib() -> Option<u64> {
    None
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        let minutes = secs / 60;
        format!("{} minute{}", minutes, if minutes == 1 { "" } else { "s" })
    } else if secs > 0 {
        format!("{} second{}", secs, if secs == 1 { "" } else { "s" })
    } else {
        format!("{} ms", d.as_millis())
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
