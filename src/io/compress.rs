//! File-to-file compression through the pool's shared engine.
//!
//! [`EnginePool::compress`] is the one operation of the crate.  It:
//!
//! 1. takes the pool's exclusivity lock and acquires the engine;
//! 2. opens the input and reads its permissions;
//! 3. creates the output with the same permissions, refusing to write over
//!    the input itself;
//! 4. binds the engine to the output and streams the input through it;
//! 5. tears down: finishes the engine's frame, closes the output, closes
//!    the input.
//!
//! Teardown never stops early.  Every step that has something to release
//! runs, and every failure, primary or teardown, ends up in the returned
//! [`CompressError`].

use std::io::{self, Read, Write};
use std::path::Path;

use crate::displaylevel;
use crate::io::engine::{Engine, EnginePool};
use crate::io::error::{CompressError, Failure, TeardownStep};
use crate::io::file_io::{same_file, FsOpener, Opener, Sink, Source};

impl EnginePool {
    /// Compress the file at `input` into a zstd frame at `output`.
    ///
    /// The output is created or truncated and given the input's permission
    /// bits.  Blocks while another operation holds the pool.
    pub fn compress(&self, input: &Path, output: &Path) -> Result<(), CompressError> {
        self.compress_with(input, output, &FsOpener)
    }

    /// [`compress`](EnginePool::compress) over resources opened by `opener`.
    pub fn compress_with<O: Opener>(
        &self,
        input: &Path,
        output: &Path,
        opener: &O,
    ) -> Result<(), CompressError> {
        let mut slot = self.lock();
        let engine = self.acquire(&mut slot).map_err(Failure::EngineInit)?;

        let mut failures = Vec::new();
        *slot = run(engine, input, output, opener, &mut failures);
        drop(slot);

        match CompressError::from_failures(failures) {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }
}

/// Open, stream, and tear down one operation, recording failures.
///
/// Returns the engine when it is fit for reuse.
fn run<O: Opener>(
    engine: Engine,
    input: &Path,
    output: &Path,
    opener: &O,
    failures: &mut Vec<Failure>,
) -> Option<Engine> {
    let mut source = match opener.open_source(input) {
        Ok(source) => source,
        Err(e) => {
            failures.push(Failure::input_open(input, e));
            return Some(engine);
        }
    };

    let engine = match source.permissions() {
        Err(e) => {
            failures.push(Failure::input_stat(input, e));
            Some(engine)
        }
        // Opening the output would truncate the input before it is read.
        Ok(_) if same_file(input, output) => {
            let e = io::Error::new(io::ErrorKind::InvalidInput, "output is the input file");
            failures.push(Failure::output_open(output, e));
            Some(engine)
        }
        Ok(perms) => match opener.open_sink(output, &perms) {
            Err(e) => {
                failures.push(Failure::output_open(output, e));
                Some(engine)
            }
            Ok(mut sink) => {
                let engine = match sink.set_permissions(&perms) {
                    Err(e) => {
                        failures.push(Failure::output_open(output, e));
                        Some(engine)
                    }
                    Ok(()) => stream(engine, &mut source, &mut sink, failures),
                };
                if let Err(e) = sink.close() {
                    failures.push(Failure::Teardown {
                        step: TeardownStep::Output,
                        source: e,
                    });
                }
                engine
            }
        },
    };

    if let Err(e) = source.close() {
        failures.push(Failure::Teardown {
            step: TeardownStep::Input,
            source: e,
        });
    }
    engine
}

/// Copy `source` through the engine into `sink`, then finish the frame.
fn stream<R: Read, W: Write>(
    engine: Engine,
    source: &mut R,
    sink: &mut W,
    failures: &mut Vec<Failure>,
) -> Option<Engine> {
    let mut bound = engine.bind(sink);
    match io::copy(source, &mut bound) {
        Ok(n) => displaylevel!(4, "compressed {} bytes\n", n),
        Err(e) => failures.push(Failure::Stream(e)),
    }

    let (engine, finished) = bound.finish();
    if let Err(e) = finished {
        failures.push(Failure::Teardown {
            step: TeardownStep::Engine,
            source: e,
        });
    }
    engine
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
