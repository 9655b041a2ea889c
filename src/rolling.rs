//! 32-bit windowed rolling checksum.
//!
//! An Adler-style add/drop checksum over a fixed `W`-byte window. Used on
//! its own by [`crate::record`] (state threaded across many `feed` calls)
//! and re-initialized fresh on every call by [`crate::legacy`].

/// Window size in bytes.
pub const WINDOW_SIZE: usize = 64;
/// Per-byte offset added into the checksum; keeps all-zero windows from
/// producing a degenerate all-zero digest.
pub const CHAR_OFFSET: u32 = 31;

/// Rolling checksum state: two 16-bit-wide accumulators and a ring buffer
/// of the last `WINDOW_SIZE` bytes fed in.
#[derive(Debug, Clone)]
pub struct RollingChecksum {
    s1: u32,
    s2: u32,
    window: [u8; WINDOW_SIZE],
    wofs: usize,
    filled: usize,
}

impl Default for RollingChecksum {
    fn default() -> Self {
        RollingChecksum {
            s1: (WINDOW_SIZE as u32) * CHAR_OFFSET,
            s2: (WINDOW_SIZE as u32) * (WINDOW_SIZE as u32 - 1) * CHAR_OFFSET,
            window: [0; WINDOW_SIZE],
            wofs: 0,
            filled: 0,
        }
    }
}

impl RollingChecksum {
    /// A freshly-initialized checksum, window zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the window by one byte.
    ///
    /// The byte dropped out of the window is whatever occupied this slot
    /// `WINDOW_SIZE` bytes ago; for the first `WINDOW_SIZE` calls after
    /// `new()`/`reset()` that slot still holds its zero-initialized
    /// value, which is exactly the "use `drop = 0` while the window is
    /// filling" rule the scanners rely on.
    #[inline]
    pub fn roll_byte(&mut self, add: u8) {
        let drop = self.window[self.wofs];
        self.s1 = self.s1.wrapping_add(add as u32).wrapping_sub(drop as u32);
        self.s2 = self
            .s2
            .wrapping_add(self.s1)
            .wrapping_sub((WINDOW_SIZE as u32).wrapping_mul(drop as u32 + CHAR_OFFSET));
        self.window[self.wofs] = add;
        self.wofs = (self.wofs + 1) % WINDOW_SIZE;
        self.filled = (self.filled + 1).min(WINDOW_SIZE);
    }

    /// Combined 32-bit digest: `(s1 << 16) | (s2 & 0xffff)`.
    #[inline]
    pub fn digest(&self) -> u32 {
        (self.s1 << 16) | (self.s2 & 0xffff)
    }

    #[inline]
    pub fn s1(&self) -> u32 {
        self.s1
    }

    #[inline]
    pub fn s2(&self) -> u32 {
        self.s2
    }

    /// Re-initialize to a fresh, empty window.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Mask used to test for a split: low `nbits` of the digest all set.
///
/// Split independently on `s1`/`s2` rather than on the combined digest,
/// which is bitwise equivalent and cheaper, and matches `split_found()`
/// in the original C. `s2_mask` is capped at 16 bits because `s2` only
/// ever contributes its low 16 bits to the digest (`s2 & 0xffff`); bits
/// above that are not part of what's being tested.
#[inline]
pub(crate) fn split_found(r: &RollingChecksum, nbits: u32) -> Option<u32> {
    debug_assert!(nbits <= 32);
    let s2_mask: u32 = (1u32 << nbits.min(16)) - 1;
    let s1_mask: u32 = if nbits <= 16 {
        0
    } else {
        (1u32 << (nbits - 16).min(31)) - 1
    };
    if (r.s2() & s2_mask) == s2_mask && (r.s1() & s1_mask) == s1_mask {
        let mut v = r.digest() >> nbits;
        // The bit immediately above the mask is deliberately ignored,
        // matching the reference implementation's off-by-one shift.
        v >>= 1;
        Some(v.trailing_ones())
    } else {
        None
    }
}

/// Scan `buf`, rolling `state` forward one byte at a time, and return the
/// offset one past the first split (and its extra-bits count), or `None`
/// if the buffer was exhausted without a hit. `state` is advanced in
/// place regardless of outcome; callers decide whether to keep or reset
/// it afterwards.
pub(crate) fn scan(state: &mut RollingChecksum, nbits: u32, buf: &[u8]) -> Option<(usize, u32)> {
    for (i, &b) in buf.iter().enumerate() {
        state.roll_byte(b);
        if let Some(extrabits) = split_found(state, nbits) {
            return Some((i + 1, extrabits));
        }
    }
    None
}
