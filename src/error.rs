//! Error kinds returned by the splitters.
//!
//! One variant per failure mode the splitters can hit: argument
//! validation happens at construction time, everything else is fatal to
//! the iteration in progress.

use std::fmt;

/// Errors produced by [`crate::HashSplitter`], [`crate::RecordHashSplitter`]
/// and the page-cache advisor.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A construction parameter was out of range (`bits`, `fanbits`, `mode`).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A read from a source, or a page-cache advisory syscall, failed.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A counter that must fit the platform word overflowed
    /// (`file_index`, mincore offsets, `read`/`uncached`, record
    /// `split_size`).
    #[error("counter overflow: {0}")]
    Overflow(&'static str),

    /// Allocating the read buffer or the mincore page map failed.
    #[error("out of memory: {0}")]
    OutOfMemory(&'static str),

    /// A source's `read` returned more bytes than it was asked for.
    #[error("source read() returned more bytes than requested")]
    InvalidRead,

    /// An impossible internal state was reached (assertion-class).
    #[error("internal error: {0}")]
    Internal(&'static str),
}

impl Error {
    pub(crate) fn invalid_argument(msg: impl fmt::Display) -> Self {
        Error::InvalidArgument(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
