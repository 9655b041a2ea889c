//! Page-cache advisor.
//!
//! For seekable, fd-backed sources, builds a one-shot in-core page map
//! via `mmap`+`mincore`, then periodically tells the kernel to drop
//! pages the splitter has already consumed and that weren't resident
//! before the splitter touched them. Silently disables itself for
//! pipe-like sources, matching `HashSplitter_nextfile`'s `EINVAL`/
//! `ENODEV` handling in the original.

#[cfg(unix)]
mod imp {
    use std::os::unix::io::RawFd;

    use itertools::Itertools;

    use crate::error::{Error, Result};
    use crate::tunables::Tunables;

    /// Per-source page residency map and advisory bookkeeping.
    pub(crate) struct PageAdvisor {
        mincore: Vec<u8>,
        page_size: usize,
        advise_chunk: usize,
        uncached: u64,
        read: u64,
    }

    impl PageAdvisor {
        /// Build a page map for `fd`, or return `Ok(None)` if the fd
        /// turned out to be pipe-like (not mappable).
        pub(crate) fn for_fd(fd: RawFd) -> Result<Option<Self>> {
            let t = Tunables::get();
            let size = fstat_size(fd)?;
            let pages = ceil_div(size, t.page_size as u64);
            let pages = usize::try_from(pages)
                .map_err(|_| Error::Overflow("mincore page count too large for this platform"))?;

            let mut mincore = vec![0u8; pages];
            let mut pos: u64 = 0;
            let mut out_off: usize = 0;
            while pos < size {
                let len = std::cmp::min(size - pos, t.fmincore_chunk_size as u64) as usize;
                let addr = unsafe {
                    libc::mmap(
                        std::ptr::null_mut(),
                        len,
                        libc::PROT_NONE,
                        libc::MAP_PRIVATE,
                        fd,
                        pos as libc::off_t,
                    )
                };
                if addr == libc::MAP_FAILED {
                    let err = std::io::Error::last_os_error();
                    return match err.raw_os_error() {
                        Some(libc::EINVAL) | Some(libc::ENODEV) => {
                            log::debug!("hashsplit: advisor disabled, source is pipe-like");
                            Ok(None)
                        }
                        _ => Err(Error::IoError(err)),
                    };
                }

                let pages_in_chunk = ceil_div(len as u64, t.page_size as u64) as usize;
                let rc = unsafe {
                    libc::mincore(
                        addr,
                        len,
                        mincore[out_off..out_off + pages_in_chunk].as_mut_ptr().cast(),
                    )
                };
                if rc < 0 {
                    let mc_err = std::io::Error::last_os_error();
                    unsafe {
                        libc::munmap(addr, len);
                    }
                    return if mc_err.raw_os_error() == Some(libc::ENOSYS) {
                        Ok(None)
                    } else {
                        Err(Error::IoError(mc_err))
                    };
                }
                if unsafe { libc::munmap(addr, len) } != 0 {
                    return Err(Error::IoError(std::io::Error::last_os_error()));
                }

                pos = pos
                    .checked_add(t.fmincore_chunk_size as u64)
                    .ok_or(Error::Overflow("mincore scan position overflowed"))?;
                out_off = out_off
                    .checked_add(t.fmincore_chunk_size / t.page_size)
                    .ok_or(Error::Overflow("mincore output offset overflowed"))?;
            }

            Ok(Some(PageAdvisor {
                mincore,
                page_size: t.page_size,
                advise_chunk: t.advise_chunk,
                uncached: 0,
                read: 0,
            }))
        }

        /// Record that `n` more bytes were read from the source, and
        /// advise the kernel if enough unadvised bytes have piled up.
        pub(crate) fn note_read(&mut self, fd: RawFd, n: usize) -> Result<()> {
            self.read = self
                .read
                .checked_add(n as u64)
                .ok_or(Error::Overflow("advisor read counter overflowed"))?;
            if self.read - self.uncached >= self.advise_chunk as u64 {
                self.advise(fd, false)?;
            }
            Ok(())
        }

        /// Flush any remaining unadvised bytes once the source has hit
        /// EOF, regardless of whether a full `advise_chunk` accumulated.
        pub(crate) fn finish(&mut self, fd: RawFd) -> Result<()> {
            if self.read > self.uncached {
                self.advise(fd, true)?;
            }
            Ok(())
        }

        fn advise(&mut self, fd: RawFd, last: bool) -> Result<()> {
            debug_assert!(self.uncached <= self.read);
            let mut len = self.read - self.uncached;
            if !last {
                len = (len / self.advise_chunk as u64) * self.advise_chunk as u64;
            }
            let pages = (len / self.page_size as u64) as usize;

            let pgstart = (self.uncached / self.page_size as u64) as usize;
            pgstart
                .checked_add(pages)
                .ok_or(Error::Overflow("mincore offset too large for this platform"))?;

            let mut start = self.uncached as libc::off_t;
            let mut run_len: u64 = 0;

            for (in_core, group) in &self.mincore[pgstart..pgstart + pages]
                .iter()
                .group_by(|&&flag| flag & 1 != 0)
            {
                let count = group.count() as u64;
                if in_core {
                    if run_len > 0 {
                        fadvise_dontneed(fd, start, run_len as libc::off_t)?;
                    }
                    start += (run_len + count * self.page_size as u64) as libc::off_t;
                    run_len = 0;
                } else {
                    run_len += count * self.page_size as u64;
                }
            }
            if run_len > 0 {
                fadvise_dontneed(fd, start, run_len as libc::off_t)?;
            }

            self.uncached = start as u64 + run_len;
            Ok(())
        }
    }

    fn fadvise_dontneed(fd: RawFd, offset: libc::off_t, len: libc::off_t) -> Result<()> {
        let rc = unsafe { libc::posix_fadvise(fd, offset, len, libc::POSIX_FADV_DONTNEED) };
        match rc {
            0 | libc::ESPIPE => Ok(()),
            libc::EBADF => Err(Error::IoError(std::io::Error::from_raw_os_error(libc::EBADF))),
            libc::EINVAL => Err(Error::invalid_argument("posix_fadvise rejected the given range")),
            other => Err(Error::IoError(std::io::Error::from_raw_os_error(other))),
        }
    }

    fn fstat_size(fd: RawFd) -> Result<u64> {
        let mut st: libc::stat = unsafe { std::mem::zeroed() };
        if unsafe { libc::fstat(fd, &mut st) } < 0 {
            return Err(Error::IoError(std::io::Error::last_os_error()));
        }
        Ok(st.st_size as u64)
    }

    fn ceil_div(a: u64, b: u64) -> u64 {
        (a + b - 1) / b
    }

}

#[cfg(not(unix))]
mod imp {
    use crate::error::Result;

    pub(crate) struct PageAdvisor;

    impl PageAdvisor {
        pub(crate) fn for_fd(_fd: i32) -> Result<Option<Self>> {
            Ok(None)
        }

        pub(crate) fn note_read(&mut self, _fd: i32, _n: usize) -> Result<()> {
            Ok(())
        }

        pub(crate) fn finish(&mut self, _fd: i32) -> Result<()> {
            Ok(())
        }
    }
}

pub(crate) use imp::PageAdvisor;
