//! Single owned read buffer with `start`/`end` cursors.
//!
//! The teacher's `memory.rs` centralizes buffer handling for the
//! chunking pipeline, but its static pool of shared buffers assumes many
//! chunkers running concurrently under tokio. This engine is
//! single-threaded per instance, so each [`crate::HashSplitter`] simply
//! owns one `Vec<u8>` of fixed size `bufsz`, keeping the invariant
//! `0 <= start <= end <= bufsz`.

use crate::error::{Error, Result};
use crate::source::OpenSource;

/// Owned read buffer plus live-region cursors.
pub(crate) struct Buffer {
    data: Vec<u8>,
    start: usize,
    end: usize,
}

impl Buffer {
    pub(crate) fn new(bufsz: usize) -> Result<Self> {
        let mut data = Vec::new();
        data.try_reserve_exact(bufsz)
            .map_err(|_| Error::OutOfMemory("failed to allocate hashsplitter read buffer"))?;
        data.resize(bufsz, 0);
        Ok(Buffer {
            data,
            start: 0,
            end: 0,
        })
    }

    #[inline]
    pub(crate) fn bufsz(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub(crate) fn start(&self) -> usize {
        self.start
    }

    #[inline]
    pub(crate) fn end(&self) -> usize {
        self.end
    }

    #[inline]
    pub(crate) fn live(&self) -> &[u8] {
        debug_assert!(self.start <= self.end && self.end <= self.data.len());
        &self.data[self.start..self.end]
    }

    /// Advance `start` by `n` bytes after a chunk has been emitted.
    pub(crate) fn consume(&mut self, n: usize) {
        debug_assert!(self.start + n <= self.end);
        self.start += n;
    }

    /// Copy a chunk out of the live region so it survives past the next
    /// `compact_or_realloc` (Design Notes option (b): copy at the
    /// emission boundary rather than trying to thread a borrow through
    /// the iterator).
    pub(crate) fn copy_out(&self, len: usize) -> Vec<u8> {
        self.live()[..len].to_vec()
    }

    /// Allocate a fresh `bufsz`-byte buffer and compact the live region
    /// to its front.
    pub(crate) fn compact_or_realloc(&mut self) -> Result<()> {
        let bufsz = self.data.len();
        let live_len = self.end - self.start;
        let mut fresh = Vec::new();
        fresh
            .try_reserve_exact(bufsz)
            .map_err(|_| Error::OutOfMemory("failed to reallocate hashsplitter read buffer"))?;
        fresh.resize(bufsz, 0);
        fresh[..live_len].copy_from_slice(&self.data[self.start..self.end]);
        self.data = fresh;
        self.start = 0;
        self.end = live_len;
        Ok(())
    }

    /// Read from `source` into `data[end..bufsz]` until either the
    /// buffer is full or the source reports EOF. Returns the total
    /// number of bytes gained this pass (0 means EOF was reached
    /// immediately).
    pub(crate) fn fill(&mut self, source: &mut dyn OpenSource) -> Result<usize> {
        debug_assert!(self.start <= self.end && self.end <= self.data.len());
        let mut gained = 0usize;
        loop {
            if self.end >= self.data.len() {
                break;
            }
            let n = source.read(&mut self.data[self.end..])?;
            if n == 0 {
                break;
            }
            if n > self.data.len() - self.end {
                return Err(Error::InvalidRead);
            }
            self.end += n;
            gained += n;
        }
        Ok(gained)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::FromReader;

    #[test]
    fn fill_reads_until_buffer_full_or_eof() {
        let mut buf = Buffer::new(16).unwrap();
        let mut src = FromReader(&b"hello world!!!!!extra"[..]);
        let gained = buf.fill(&mut src).unwrap();
        assert_eq!(gained, 16);
        assert_eq!(buf.end(), 16);
        assert_eq!(buf.live(), b"hello world!!!!!");
    }

    #[test]
    fn fill_stops_at_source_eof() {
        let mut buf = Buffer::new(64).unwrap();
        let mut src = FromReader(&b"short"[..]);
        let gained = buf.fill(&mut src).unwrap();
        assert_eq!(gained, 5);
        assert_eq!(buf.live(), b"short");
    }

    #[test]
    fn compact_or_realloc_preserves_live_region_and_resets_start() {
        let mut buf = Buffer::new(16).unwrap();
        let mut src = FromReader(&b"0123456789abcdef"[..]);
        buf.fill(&mut src).unwrap();
        buf.consume(10);
        assert_eq!(buf.live(), b"abcdef");
        buf.compact_or_realloc().unwrap();
        assert_eq!(buf.start(), 0);
        assert_eq!(buf.end(), 6);
        assert_eq!(buf.live(), b"abcdef");
        assert_eq!(buf.bufsz(), 16);
    }

    #[test]
    fn invariant_holds_after_fill_and_consume() {
        let mut buf = Buffer::new(32).unwrap();
        let mut src = FromReader(&[7u8; 40][..]);
        buf.fill(&mut src).unwrap();
        buf.consume(5);
        assert!(buf.start() <= buf.end());
        assert!(buf.end() <= buf.bufsz());
    }
}
