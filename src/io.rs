//! Compression core: the engine pool, the resource layer, and the
//! compression operation with its aggregated error.
//!
//! | Submodule     | Responsibility |
//! |---------------|----------------|
//! | [`engine`]    | `Engine`, `BoundEngine`, and the `EnginePool` singleton holder with its exclusivity lock. |
//! | [`file_io`]   | `Opener` / `Source` / `Sink` traits, the filesystem `FsOpener`, explicit `close_file`. |
//! | [`compress`]  | `EnginePool::compress` and `EnginePool::compress_with`. |
//! | [`error`]     | `Failure`, `TeardownStep`, and the aggregate `CompressError`. |

pub mod compress;
pub mod engine;
pub mod error;
pub mod file_io;

pub use engine::{BoundEngine, Engine, EnginePool};
pub use error::{CompressError, Failure, TeardownStep};
pub use file_io::{close_file, same_file, FsOpener, Opener, Sink, Source};
