//! Module-wide constants derived once from the host OS.
//!
//! Mirrors the teacher's `Config::load()`: a value computed once behind
//! a `OnceCell` and treated as read-only for the rest of the process.

use once_cell::sync::OnceCell;

use crate::error::{Error, Result};

const EIGHT_MIB: usize = 8 * 1024 * 1024;
const SIXTY_FOUR_MIB: usize = 64 * 1024 * 1024;

/// Host-derived sizing constants shared by every splitter in the process.
#[derive(Debug, Clone, Copy)]
pub struct Tunables {
    /// OS page size in bytes.
    pub page_size: usize,
    /// Largest multiple of `page_size` not exceeding 64 MiB; the chunk
    /// size used when mapping a file to build the mincore page map.
    pub fmincore_chunk_size: usize,
    /// `max(8 MiB, page_size)`; also the fixed size of the splitter's
    /// read buffer.
    pub advise_chunk: usize,
    /// `floor(log2(advise_chunk)) - 2`; the upper bound allowed for
    /// `bits` at construction.
    pub max_bits: u32,
}

static TUNABLES: OnceCell<Tunables> = OnceCell::new();

impl Tunables {
    /// Return the process-wide tunables, computing them on first call.
    pub fn get() -> &'static Tunables {
        TUNABLES.get_or_init(|| Self::compute().expect("failed to derive hashsplit tunables"))
    }

    fn compute() -> Result<Tunables> {
        let page_size = host_page_size()?;
        if page_size == 0 {
            return Err(Error::Internal("host page size was reported as zero"));
        }

        let fmincore_chunk_size = if page_size >= SIXTY_FOUR_MIB {
            page_size
        } else {
            page_size * (SIXTY_FOUR_MIB / page_size)
        };

        let advise_chunk = EIGHT_MIB.max(page_size);
        let max_bits = (advise_chunk as f64).log2().floor() as u32 - 2;

        Ok(Tunables {
            page_size,
            fmincore_chunk_size,
            advise_chunk,
            max_bits,
        })
    }
}

#[cfg(unix)]
fn host_page_size() -> Result<usize> {
    let n = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if n <= 0 {
        return Err(Error::IoError(std::io::Error::last_os_error()));
    }
    Ok(n as usize)
}

#[cfg(not(unix))]
fn host_page_size() -> Result<usize> {
    // No portable sysconf equivalent; 4 KiB matches every mainstream
    // platform this crate is expected to run on.
    Ok(4096)
}
