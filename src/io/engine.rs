//! The reusable compression engine and the pool that owns it.
//!
//! An [`Engine`] wraps a zstd compression context.  Building one allocates
//! the match-finder tables for the configured level, which costs far more
//! than compressing a small file, so the context is built once and reused.
//! Between operations the engine is unbound.  [`Engine::bind`] attaches it
//! to an output for one operation and [`BoundEngine::finish`] ends the frame,
//! detaches it, and resets it for the next one.
//!
//! [`EnginePool`] owns at most one engine.  Its mutex is both the singleton
//! slot and the exclusivity lock.  An operation holds the guard from engine
//! acquisition until its teardown has finished, so two operations can never
//! share a binding.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use zstd::stream::raw::{self, Operation};
use zstd::stream::zio;

use crate::config::COMPRESSION_LEVEL;
use crate::displaylevel;

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// An unbound zstd compression context with a fixed level.
///
/// An `Engine` held by a pool is always freshly reset: no frame in progress,
/// no buffered input.
pub struct Engine {
    level: i32,
    encoder: raw::Encoder<'static>,
}

impl Engine {
    /// Build a compression context for `level`.
    ///
    /// Fails with [`io::ErrorKind::InvalidInput`] when `level` is outside
    /// [`zstd::compression_level_range`], or with the allocator's error when
    /// the context cannot be created.
    pub fn new(level: i32) -> io::Result<Self> {
        let range = zstd::compression_level_range();
        if !range.contains(&level) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "compression level {} outside {}..={}",
                    level,
                    range.start(),
                    range.end()
                ),
            ));
        }
        let encoder = raw::Encoder::new(level)?;
        Ok(Engine { level, encoder })
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    /// Attach the engine to `sink` for one frame.
    pub fn bind<W: Write>(self, sink: W) -> BoundEngine<W> {
        BoundEngine {
            level: self.level,
            writer: zio::Writer::new(sink, self.encoder),
        }
    }
}

// ---------------------------------------------------------------------------
// BoundEngine
// ---------------------------------------------------------------------------

/// An engine attached to an output.  Bytes written to it are compressed into
/// the sink.
pub struct BoundEngine<W: Write> {
    level: i32,
    writer: zio::Writer<W, raw::Encoder<'static>>,
}

impl<W: Write> BoundEngine<W> {
    /// End the frame, detach from the sink, and reset the context.
    ///
    /// Finishing is attempted even after a failed write.  The engine comes back
    /// only when the reset succeeded; otherwise it is dropped and the pool
    /// builds a new one next time.  The returned result is the first error of
    /// finishing or resetting.
    pub fn finish(mut self) -> (Option<Engine>, io::Result<()>) {
        let finished = self.writer.finish();
        let (_sink, mut encoder) = self.writer.into_inner();
        match encoder.reinit() {
            Ok(()) => (
                Some(Engine {
                    level: self.level,
                    encoder,
                }),
                finished,
            ),
            Err(e) => (None, finished.and(Err(e))),
        }
    }
}

impl<W: Write> Write for BoundEngine<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

// ---------------------------------------------------------------------------
// EnginePool
// ---------------------------------------------------------------------------

/// Owner of the single engine shared by every compression operation.
pub struct EnginePool {
    level: i32,
    slot: Mutex<Option<Engine>>,
    constructions: AtomicU64,
}

impl EnginePool {
    /// A pool using the default compression profile.
    pub fn new() -> Self {
        Self::with_level(COMPRESSION_LEVEL)
    }

    /// A pool whose engine will be built for `level`.  The level is only
    /// validated when the engine is first needed.
    pub fn with_level(level: i32) -> Self {
        EnginePool {
            level,
            slot: Mutex::new(None),
            constructions: AtomicU64::new(0),
        }
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    /// Number of engines this pool has built so far.
    pub fn constructions(&self) -> u64 {
        self.constructions.load(Ordering::Relaxed)
    }

    /// Take the exclusivity lock.
    ///
    /// A panic inside a previous operation poisons the mutex.  Its engine was
    /// out of the slot at the time and is gone, so the slot is empty and safe
    /// to hand out again.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Option<Engine>> {
        match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                let mut guard = poisoned.into_inner();
                *guard = None;
                self.slot.clear_poison();
                guard
            }
        }
    }

    /// Take the engine out of `slot`, building it first if the slot is empty.
    ///
    /// Must be called with the guard from [`EnginePool::lock`].  A failed
    /// build leaves the slot empty, so the next call tries again.
    pub(crate) fn acquire(&self, slot: &mut Option<Engine>) -> io::Result<Engine> {
        if let Some(engine) = slot.take() {
            return Ok(engine);
        }
        let engine = Engine::new(self.level)?;
        let n = self.constructions.fetch_add(1, Ordering::Relaxed) + 1;
        displaylevel!(4, "created compression engine #{} (level {})\n", n, self.level);
        Ok(engine)
    }
}

impl Default for EnginePool {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
