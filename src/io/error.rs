//! Failure taxonomy for one compression operation.
//!
//! A single [`compress`](crate::io::EnginePool::compress) call can fail at
//! several independent points: the primary step (engine construction, opening
//! a file, streaming) and any of the three teardown steps that always run
//! afterwards.  Each of those is a [`Failure`]; a [`CompressError`] collects
//! every failure of one operation, in the order they were encountered.

use std::error::Error;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// TeardownStep
// ---------------------------------------------------------------------------

/// The release step of an operation's teardown sequence.
///
/// Teardown always runs in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownStep {
    /// Finishing the compressed frame and resetting the engine.
    Engine,
    /// Closing the output file.
    Output,
    /// Closing the input file.
    Input,
}

impl fmt::Display for TeardownStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TeardownStep::Engine => "engine",
            TeardownStep::Output => "output",
            TeardownStep::Input => "input",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Failure
// ---------------------------------------------------------------------------

/// One failure discovered while running a compression operation.
#[derive(Debug)]
pub enum Failure {
    /// The compression engine could not be constructed.
    EngineInit(io::Error),
    /// The input file could not be opened for reading.
    InputOpen { path: PathBuf, source: io::Error },
    /// The input file's permissions could not be read.
    InputStat { path: PathBuf, source: io::Error },
    /// The output file could not be created, truncated, or given the input's
    /// permissions.
    OutputOpen { path: PathBuf, source: io::Error },
    /// Reading the input or writing compressed data failed mid-transfer.  The
    /// output is truncated and must not be used.
    Stream(io::Error),
    /// A teardown step failed.
    Teardown { step: TeardownStep, source: io::Error },
}

impl Failure {
    pub(crate) fn input_open(path: &Path, source: io::Error) -> Self {
        Failure::InputOpen { path: path.to_path_buf(), source }
    }

    pub(crate) fn input_stat(path: &Path, source: io::Error) -> Self {
        Failure::InputStat { path: path.to_path_buf(), source }
    }

    pub(crate) fn output_open(path: &Path, source: io::Error) -> Self {
        Failure::OutputOpen { path: path.to_path_buf(), source }
    }

    /// The underlying I/O error.
    pub fn io_error(&self) -> &io::Error {
        match self {
            Failure::EngineInit(e) | Failure::Stream(e) => e,
            Failure::InputOpen { source, .. }
            | Failure::InputStat { source, .. }
            | Failure::OutputOpen { source, .. }
            | Failure::Teardown { source, .. } => source,
        }
    }

    /// The teardown step that produced this failure, if any.
    pub fn teardown_step(&self) -> Option<TeardownStep> {
        match self {
            Failure::Teardown { step, .. } => Some(*step),
            _ => None,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::EngineInit(e) => write!(f, "cannot create compression engine: {}", e),
            Failure::InputOpen { path, source } => {
                write!(f, "cannot open input {}: {}", path.display(), source)
            }
            Failure::InputStat { path, source } => {
                write!(f, "cannot read permissions of {}: {}", path.display(), source)
            }
            Failure::OutputOpen { path, source } => {
                write!(f, "cannot open output {}: {}", path.display(), source)
            }
            Failure::Stream(e) => write!(f, "compression stream failed: {}", e),
            Failure::Teardown { step, source } => write!(f, "closing {} failed: {}", step, source),
        }
    }
}

impl Error for Failure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.io_error())
    }
}

// ---------------------------------------------------------------------------
// CompressError
// ---------------------------------------------------------------------------

/// Every failure of one compression operation.
///
/// Never empty: an operation with no failures returns `Ok(())`.  The primary
/// failure, if there was one, comes first; teardown failures follow in
/// [`TeardownStep`] order.
#[derive(Debug)]
pub struct CompressError {
    failures: Vec<Failure>,
}

impl CompressError {
    /// Builds an aggregate from collected failures, or `None` when there are
    /// none.
    pub(crate) fn from_failures(failures: Vec<Failure>) -> Option<Self> {
        if failures.is_empty() {
            None
        } else {
            Some(CompressError { failures })
        }
    }

    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<Failure> {
        self.failures
    }

    /// The failure that aborted the operation's main sequence, if any.
    pub fn primary(&self) -> Option<&Failure> {
        self.failures.first().filter(|f| f.teardown_step().is_none())
    }

    /// The failure reported by the given teardown step, if it failed.
    pub fn teardown(&self, step: TeardownStep) -> Option<&Failure> {
        self.failures.iter().find(|f| f.teardown_step() == Some(step))
    }

    pub fn is_engine_init(&self) -> bool {
        matches!(self.primary(), Some(Failure::EngineInit(_)))
    }

    pub fn is_input_open(&self) -> bool {
        matches!(self.primary(), Some(Failure::InputOpen { .. }))
    }
}

impl From<Failure> for CompressError {
    fn from(failure: Failure) -> Self {
        CompressError { failures: vec![failure] }
    }
}

impl fmt::Display for CompressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}

impl Error for CompressError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.failures.first().map(|f| f as &(dyn Error + 'static))
    }
}
