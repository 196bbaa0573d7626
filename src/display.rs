//! Verbosity-gated diagnostics on stderr.
//!
//! A single process-wide [`DISPLAY_LEVEL`] selects how chatty the program is:
//!
//! | Level | Output |
//! |-------|--------|
//! | 0     | nothing |
//! | 1     | errors only |
//! | 2     | normal: loop pauses and final status (default) |
//! | 3     | per-pause memory figures |
//! | 4     | verbose: engine lifecycle and per-iteration traces |
//!
//! Library code only ever emits level-4 traces.  Failures are returned to the
//! caller as values; printing them is the binary's job.

use std::sync::atomic::{AtomicU32, Ordering};

pub static DISPLAY_LEVEL: AtomicU32 = AtomicU32::new(2);

/// Returns the current display level.
#[inline]
pub fn display_level() -> u32 {
    DISPLAY_LEVEL.load(Ordering::Relaxed)
}

/// Sets the display level.
#[inline]
pub fn set_display_level(level: u32) {
    DISPLAY_LEVEL.store(level, Ordering::Relaxed);
}

/// Print to stdout unconditionally.
#[macro_export]
macro_rules! displayout {
    ($($arg:tt)*) => {{
        use std::io::Write as _;
        print!($($arg)*);
        let _ = std::io::stdout().flush();
    }};
}

/// Print to stderr when the display level is at or above `level`.
#[macro_export]
macro_rules! displaylevel {
    ($level:expr, $($arg:tt)*) => {
        if $crate::display::display_level() >= $level {
            eprint!($($arg)*);
        }
    };
}
