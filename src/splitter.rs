//! Stream hashsplitter: the public iterator over content-defined chunks
//! of a sequence of byte sources.

use crate::advisor::PageAdvisor;
use crate::buffer::Buffer;
use crate::error::{Error, Result};
use crate::fastcdc::find_fastcdc;
use crate::legacy::find_legacy;
use crate::source::OpenSource;
use crate::tunables::Tunables;

#[cfg(unix)]
use std::os::unix::io::RawFd;

/// Which boundary scanner a [`HashSplitter`] uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Rolling-sum scanner; the default, and the only mode supported by
    /// [`crate::record::RecordHashSplitter`].
    Legacy,
    /// Gear-hash scanner, compatible with existing FastCDC-chunked
    /// repositories.
    FastCdc,
}

impl Mode {
    fn parse(s: Option<&str>) -> Result<Mode> {
        match s {
            None | Some("legacy") => Ok(Mode::Legacy),
            Some("fastcdc") => Ok(Mode::FastCdc),
            Some(other) => Err(Error::invalid_argument(format!(
                "unknown mode {other:?}, expected \"legacy\" or \"fastcdc\""
            ))),
        }
    }
}

/// One emitted chunk: its bytes, copied out of the live buffer, and the
/// fan-out level this split was found at (`0` for every forced split).
pub type Chunk = (Vec<u8>, u32);

/// Builder for [`HashSplitter`]. All fields but `sources` and `bits`
/// have documented defaults.
pub struct HashSplitterBuilder<S> {
    sources: S,
    bits: u32,
    progress: Option<Box<dyn FnMut(u64, usize)>>,
    keep_boundaries: bool,
    fanbits: u32,
    mode: Option<String>,
}

impl<S> HashSplitterBuilder<S>
where
    S: Iterator<Item = Box<dyn OpenSource>>,
{
    pub fn new(sources: S, bits: u32) -> Self {
        HashSplitterBuilder {
            sources,
            bits,
            progress: None,
            keep_boundaries: true,
            fanbits: 4,
            mode: None,
        }
    }

    pub fn progress(mut self, f: impl FnMut(u64, usize) + 'static) -> Self {
        self.progress = Some(Box::new(f));
        self
    }

    pub fn keep_boundaries(mut self, keep: bool) -> Self {
        self.keep_boundaries = keep;
        self
    }

    pub fn fanbits(mut self, fanbits: u32) -> Self {
        self.fanbits = fanbits;
        self
    }

    pub fn mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn build(self) -> Result<HashSplitter<S>> {
        HashSplitter::create(
            self.sources,
            self.bits,
            self.progress,
            self.keep_boundaries,
            self.fanbits,
            self.mode.as_deref(),
        )
    }
}

/// Pulls content-defined chunks out of a sequence of byte sources.
///
/// Not restartable: once a source yields EOF and is dropped it is gone.
/// Construct with [`HashSplitterBuilder`] or [`HashSplitter::create`].
pub struct HashSplitter<S> {
    sources: S,
    bits: u32,
    max_blob: usize,
    fanbits: u32,
    mode: Mode,
    keep_boundaries: bool,
    progress: Option<Box<dyn FnMut(u64, usize)>>,
    buf: Option<Buffer>,
    file_index: u64,
    eof: bool,
    current: Option<Box<dyn OpenSource>>,
    #[cfg(unix)]
    current_fd: Option<RawFd>,
    advisor: Option<PageAdvisor>,
}

impl<S> HashSplitter<S>
where
    S: Iterator<Item = Box<dyn OpenSource>>,
{
    /// Validates construction parameters and opens the first source.
    ///
    /// `bits` must fall in `[13, Tunables::get().max_bits]`, `fanbits`
    /// must be nonzero, and `mode` (if given) must be `"legacy"` or
    /// `"fastcdc"`; any violation is `Error::InvalidArgument`.
    pub fn create(
        sources: S,
        bits: u32,
        progress: Option<Box<dyn FnMut(u64, usize)>>,
        keep_boundaries: bool,
        fanbits: u32,
        mode: Option<&str>,
    ) -> Result<Self> {
        let max_bits = Tunables::get().max_bits;
        if !(13..=max_bits).contains(&bits) {
            return Err(Error::invalid_argument(format!(
                "bits must be within [13, {max_bits}], got {bits}"
            )));
        }
        if fanbits == 0 {
            return Err(Error::invalid_argument("fanbits must be > 0"));
        }
        let mode = Mode::parse(mode)?;
        let max_blob = 1usize
            .checked_shl(bits + 2)
            .ok_or(Error::Overflow("max_blob shift overflowed"))?;

        let mut splitter = HashSplitter {
            sources,
            bits,
            max_blob,
            fanbits,
            mode,
            keep_boundaries,
            progress,
            buf: Some(Buffer::new(Tunables::get().advise_chunk)?),
            file_index: 0,
            eof: false,
            current: None,
            #[cfg(unix)]
            current_fd: None,
            advisor: None,
        };
        splitter.open_next()?;
        Ok(splitter)
    }

    /// Pull the next chunk, or `Ok(None)` once every source is exhausted
    /// and the buffer is drained. A plain method rather than
    /// [`Iterator`] since advancing can fail.
    pub fn next_chunk(&mut self) -> Result<Option<Chunk>> {
        loop {
            let bufsz = self.buf.as_ref().map(Buffer::bufsz).unwrap_or(0);
            let end = self.buf.as_ref().map(Buffer::end).unwrap_or(0);

            if self.buf.is_some() && end < bufsz && self.current.is_some() {
                let start = self.buf.as_ref().unwrap().start();
                if self.eof && (!self.keep_boundaries || start == end) {
                    self.open_next()?;
                }
                if self.current.is_some() {
                    self.fill_current()?;
                }
            }

            let (start, end) = match self.buf.as_ref() {
                Some(b) => (b.start(), b.end()),
                None => (0, 0),
            };
            if start == end && self.current.is_none() {
                self.buf = None;
                return Ok(None);
            }

            let maxlen = (end - start).min(self.max_blob);
            let slice = &self.buf.as_ref().unwrap().live()[..maxlen];
            let (ofs, extrabits) = match self.mode {
                Mode::Legacy => find_legacy(self.bits, slice),
                Mode::FastCdc => find_fastcdc(self.bits, slice),
            };

            if ofs > 0 {
                let level = extrabits / self.fanbits;
                return Ok(Some(self.emit(ofs, level)));
            }
            if end - start >= self.max_blob {
                return Ok(Some(self.emit(self.max_blob, 0)));
            }
            if start < end && self.eof && (self.keep_boundaries || self.current.is_none()) {
                return Ok(Some(self.emit(end - start, 0)));
            }
            self.buf.as_mut().unwrap().compact_or_realloc()?;
        }
    }

    fn emit(&mut self, ofs: usize, level: u32) -> Chunk {
        let buf = self.buf.as_mut().expect("buffer present while emitting");
        let chunk = buf.copy_out(ofs);
        buf.consume(ofs);
        (chunk, level)
    }

    fn open_next(&mut self) -> Result<()> {
        self.current = self.sources.next();
        // No more sources behaves like a source that immediately read 0
        // bytes: eof is set right away instead of waiting for a fill
        // pass that will never happen once `current` is `None`.
        self.eof = self.current.is_none();
        if self.current.is_some() {
            self.file_index = self
                .file_index
                .checked_add(1)
                .ok_or(Error::Overflow("file_index overflowed"))?;
            if let Some(cb) = self.progress.as_mut() {
                cb(self.file_index, 0);
            }
        }

        #[cfg(unix)]
        {
            self.current_fd = self.current.as_ref().and_then(|s| s.as_raw_fd());
            self.advisor = match self.current_fd {
                Some(fd) => PageAdvisor::for_fd(fd)?,
                None => None,
            };
        }
        Ok(())
    }

    fn fill_current(&mut self) -> Result<()> {
        let source = match self.current.as_mut() {
            Some(s) => s.as_mut(),
            None => return Ok(()),
        };
        let gained = self.buf.as_mut().unwrap().fill(source)?;
        if gained > 0 {
            if let Some(cb) = self.progress.as_mut() {
                cb(self.file_index, gained);
            }
            #[cfg(unix)]
            if let (Some(fd), Some(advisor)) = (self.current_fd, self.advisor.as_mut()) {
                advisor.note_read(fd, gained)?;
            }
        } else {
            self.eof = true;
            #[cfg(unix)]
            if let (Some(fd), Some(advisor)) = (self.current_fd, self.advisor.as_mut()) {
                advisor.finish(fd)?;
            }
        }
        Ok(())
    }
}
