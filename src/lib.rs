// recompress — repeated file compression through one reusable zstd engine

pub mod display;
pub mod config;
pub mod io;
pub mod driver;
pub mod cli;

// ── Top-level re-exports ──────────────────────────────────────────────────────
pub use driver::{LoopFailure, LoopStats, Throttle};
pub use io::{CompressError, EnginePool, Failure, TeardownStep};
