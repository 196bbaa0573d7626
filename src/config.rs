// config.rs — Compile-time configuration constants.
//
// Every value here is a default; the binary exposes command-line flags for the
// throttle settings and the paths.  The compression level is a fixed profile
// and is deliberately not exposed.

use std::time::Duration;

// zstd level of the compression profile.  Level 7 favours ratio over speed
// while keeping the encoder context small enough to hold for the whole run.
pub const COMPRESSION_LEVEL: i32 = 7;

// Number of successful iterations between two throttle pauses.
pub const THROTTLE_EVERY: u64 = 1000;

// Length of each throttle pause.
pub const COOLDOWN: Duration = Duration::from_secs(5 * 60);

// Input used when none is given on the command line.
pub const DEFAULT_INPUT: &str = "sample.txt";

// Suffix appended to the input path when no output path is given.
pub const ZSTD_EXTENSION: &str = ".zst";
