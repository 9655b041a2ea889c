//! Legacy (rolling-sum) boundary scanner.

use crate::rolling::{scan, RollingChecksum};

/// Find the first content-defined split in `buf`, scanning with a
/// freshly-initialized rolling checksum.
///
/// Returns `(0, _)` if no split was found in `buf`. Otherwise returns
/// `(ofs, extrabits)` with `ofs` the smallest offset in `[1, buf.len()]`
/// such that the low `nbits` of the digest are all set after consuming
/// `buf[..ofs]`.
///
/// Callers MUST NOT carry the rolling state across calls to this
/// function: the window is re-seeded fresh every time, which is what
/// keeps split positions stable near the front of each scanned range.
/// The record splitter threads its own [`RollingChecksum`] by hand
/// instead of calling through here; see [`crate::record`].
pub fn find_legacy(nbits: u32, buf: &[u8]) -> (usize, u32) {
    let mut state = RollingChecksum::new();
    match scan(&mut state, nbits, buf) {
        Some((ofs, extrabits)) => (ofs, extrabits),
        None => (0, 0),
    }
}
