//! File resources used by the compression operation.
//!
//! The operation never touches `std::fs` directly.  It goes through an
//! [`Opener`], which hands out a [`Source`] (the input) and a [`Sink`] (the
//! output).  Both carry an explicit, fallible `close`: dropping a `File`
//! swallows the result of `close(2)`, so each handle is released through
//! [`close_file`] instead and the outcome reaches the caller.
//!
//! [`FsOpener`] is the real filesystem implementation.  Tests provide their
//! own openers to inject failures at individual steps.

use std::fs::{File, OpenOptions, Permissions};
use std::io::{self, Read, Write};
use std::path::Path;

use crate::displaylevel;

// ---------------------------------------------------------------------------
// Resource traits
// ---------------------------------------------------------------------------

/// An opened input resource.
pub trait Source: Read {
    /// Permission bits to reproduce on the output.
    fn permissions(&self) -> io::Result<Permissions>;

    /// Release the handle, reporting any error from the release itself.
    fn close(self) -> io::Result<()>;
}

/// An opened output resource.
pub trait Sink: Write {
    /// Apply `perms` to the already-opened output.
    fn set_permissions(&self, perms: &Permissions) -> io::Result<()>;

    /// Release the handle, reporting any error from the release itself.
    fn close(self) -> io::Result<()>;
}

/// Opens the input and output of one compression operation.
pub trait Opener {
    type Source: Source;
    type Sink: Sink;

    /// Open `path` for reading.
    fn open_source(&self, path: &Path) -> io::Result<Self::Source>;

    /// Create or truncate `path` for writing, creating it with `perms`.
    ///
    /// An existing output must be replaceable even when an earlier run gave
    /// it a read-only mode.
    fn open_sink(&self, path: &Path, perms: &Permissions) -> io::Result<Self::Sink>;
}

// ---------------------------------------------------------------------------
// Filesystem implementation
// ---------------------------------------------------------------------------

/// [`Opener`] over regular files.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsOpener;

impl Opener for FsOpener {
    type Source = File;
    type Sink = File;

    fn open_source(&self, path: &Path) -> io::Result<File> {
        if path.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{}: is a directory", path.display()),
            ));
        }
        let file = File::open(path)?;
        displaylevel!(4, "opened input {}\n", path.display());
        Ok(file)
    }

    fn open_sink(&self, path: &Path, perms: &Permissions) -> io::Result<File> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
            options.mode(perms.mode() & 0o7777);
        }
        #[cfg(not(unix))]
        let _ = perms;
        let file = match options.open(path) {
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied && path.is_file() => {
                // A read-only output cannot be truncated in place; replace it.
                displaylevel!(4, "replacing read-only output {}\n", path.display());
                std::fs::remove_file(path).map_err(|_| e)?;
                options.open(path)?
            }
            result => result?,
        };
        displaylevel!(4, "opened output {}\n", path.display());
        Ok(file)
    }
}

impl Source for File {
    fn permissions(&self) -> io::Result<Permissions> {
        Ok(self.metadata()?.permissions())
    }

    fn close(self) -> io::Result<()> {
        close_file(self)
    }
}

impl Sink for File {
    fn set_permissions(&self, perms: &Permissions) -> io::Result<()> {
        // The mode passed at creation is narrowed by the umask and ignored
        // for files that already exist.
        File::set_permissions(self, perms.clone())
    }

    fn close(self) -> io::Result<()> {
        close_file(self)
    }
}

/// Whether `a` and `b` name the same existing file, links included.
#[cfg(unix)]
pub fn same_file(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (std::fs::metadata(a), std::fs::metadata(b)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
pub fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Close `file`, returning the error reported by `close(2)`.
///
/// The descriptor is released whatever the outcome.
#[cfg(unix)]
pub fn close_file(file: File) -> io::Result<()> {
    use std::os::unix::io::IntoRawFd;

    let fd = file.into_raw_fd();
    // SAFETY: `fd` was just detached from an owned `File`; nothing else
    // refers to it and it is closed exactly once here.
    if unsafe { libc::close(fd) } == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// Close `file`.  Without `close(2)` there is no close status to report.
#[cfg(not(unix))]
pub fn close_file(file: File) -> io::Result<()> {
    drop(file);
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
