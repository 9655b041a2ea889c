//! The byte-source abstraction the stream splitter pulls from.
//!
//! A source either exposes a raw file descriptor (so the buffer manager
//! can read directly into its buffer and the page-cache advisor can
//! manage it) or only a generic `read`. This is expressed as a trait
//! with a default "no fd" method rather than a tagged `{Fd, Callable}`
//! variant: a trait keeps both capabilities on one object without
//! forcing every non-fd source to be boxed behind an enum arm, and
//! (unlike subclassing) adds no coupling between implementations.
#[cfg(unix)]
use std::os::unix::io::RawFd;
use std::io;

/// An openable byte source the stream splitter can read from.
pub trait OpenSource: Send {
    /// The underlying raw file descriptor, if this source is backed by
    /// one. Returning `None` disables the page-cache advisor for this
    /// source and routes reads through [`OpenSource::read`] only.
    #[cfg(unix)]
    fn as_raw_fd(&self) -> Option<RawFd> {
        None
    }

    /// Read up to `buf.len()` bytes into `buf`, returning the number of
    /// bytes placed. Returns `Ok(0)` at end of source.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Adapts any [`std::io::Read`] (plus [`std::os::unix::io::AsRawFd`] on
/// Unix) into an [`OpenSource`]. Covers the common case of a `File` or
/// an in-memory cursor.
pub struct FromReader<R>(pub R);

impl<R: io::Read + Send> OpenSource for FromReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

/// Like [`FromReader`], but also surfaces [`OpenSource::as_raw_fd`] for
/// readers that implement [`std::os::unix::io::AsRawFd`].
#[cfg(unix)]
pub struct FdReader<R>(pub R);

#[cfg(unix)]
impl<R: io::Read + Send + std::os::unix::io::AsRawFd> FdReader<R> {
    /// Wrap a reader that is also fd-backed, exposing its descriptor to
    /// the page-cache advisor.
    pub fn new(reader: R) -> Self {
        FdReader(reader)
    }
}

#[cfg(unix)]
impl<R: io::Read + Send + std::os::unix::io::AsRawFd> OpenSource for FdReader<R> {
    fn as_raw_fd(&self) -> Option<RawFd> {
        Some(std::os::unix::io::AsRawFd::as_raw_fd(&self.0))
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

#[cfg(unix)]
impl OpenSource for std::fs::File {
    fn as_raw_fd(&self) -> Option<RawFd> {
        Some(std::os::unix::io::AsRawFd::as_raw_fd(self))
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::Read::read(self, buf)
    }
}

impl OpenSource for std::io::Cursor<Vec<u8>> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::Read::read(self, buf)
    }
}

impl OpenSource for &[u8] {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::Read::read(self, buf)
    }
}
