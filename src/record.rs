//! Record-mode splitter: content-defined boundaries over a stream of
//! caller-delimited records rather than raw bytes.
//!
//! Unlike [`crate::legacy::find_legacy`], the rolling checksum here is
//! threaded across calls instead of reset each time. A record's bytes
//! extend whatever window state the previous record left behind, so a
//! boundary can fall inside a record that started before the digest hit
//! its split condition. FastCDC has no equivalent streaming form (its
//! jump-skip scan assumes random access into a contiguous buffer), so
//! record mode is legacy-only.

use crate::error::{Error, Result};
use crate::rolling::{scan, RollingChecksum};

/// Splits a stream of whole records, submitted one at a time via
/// [`Self::feed`], on content-defined boundaries, with `max_split_size`
/// forcing a boundary if the rolling checksum goes too long without one.
pub struct RecordHashSplitter {
    bits: u32,
    state: RollingChecksum,
    split_size: u64,
    max_split_size: u64,
}

impl RecordHashSplitter {
    /// `bits` must be in `[13, Tunables::get().max_bits]`, matching the
    /// stream splitter's construction rule. `max_split_size` is derived
    /// as `1 << (bits + 2)`, the same band-ceiling formula as the stream
    /// splitter's `max_blob`.
    pub fn new(bits: u32) -> Result<Self> {
        let max_bits = crate::tunables::Tunables::get().max_bits;
        if !(13..=max_bits).contains(&bits) {
            return Err(Error::invalid_argument(format!(
                "bits must be within [13, {max_bits}], got {bits}"
            )));
        }
        let max_split_size = 1u64
            .checked_shl(bits + 2)
            .ok_or(Error::Overflow("max_split_size shift overflowed"))?;
        Ok(RecordHashSplitter {
            bits,
            state: RollingChecksum::new(),
            split_size: 0,
            max_split_size,
        })
    }

    /// Feed one whole record's bytes into the splitter.
    ///
    /// Returns `(is_boundary, bits_out)`. `bits_out` is `Some(bits +
    /// extrabits)` when the rolling checksum found a content-defined cut
    /// somewhere inside this record; `None` when a boundary is instead
    /// forced by `max_split_size`, or when there is no boundary at all.
    pub fn feed(&mut self, record: &[u8]) -> Result<(bool, Option<u32>)> {
        let found = scan(&mut self.state, self.bits, record);
        let bits_out = found.map(|(_, extrabits)| self.bits + extrabits);
        if found.is_some() {
            self.state.reset();
            self.split_size = 0;
        }

        self.split_size = self
            .split_size
            .checked_add(record.len() as u64)
            .ok_or(Error::Overflow("record split size overflowed"))?;

        if self.split_size > self.max_split_size {
            self.state.reset();
            self.split_size = 0;
            return Ok((true, bits_out));
        }

        Ok((found.is_some(), bits_out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pseudo_random_record(i: usize, len: usize) -> Vec<u8> {
        (0..len)
            .map(|j| ((i * 7919 + j) as u32).wrapping_mul(2654435761).to_le_bytes()[0])
            .collect()
    }

    #[test]
    fn construction_rejects_bits_out_of_range() {
        assert!(RecordHashSplitter::new(12).is_err());
        let max_bits = crate::tunables::Tunables::get().max_bits;
        assert!(RecordHashSplitter::new(max_bits + 1).is_err());
        assert!(RecordHashSplitter::new(13).is_ok());
    }

    #[test]
    fn rolling_state_persists_across_feeds() {
        let mut splitter = RecordHashSplitter::new(13).unwrap();
        let mut boundaries = 0;
        for i in 0..2000 {
            let record = pseudo_random_record(i, 17);
            let (is_boundary, bits_out) = splitter.feed(&record).unwrap();
            if is_boundary {
                boundaries += 1;
                if let Some(b) = bits_out {
                    assert!(b >= 13);
                }
            }
        }
        assert!(boundaries > 0);
    }

    #[test]
    fn max_split_size_forces_a_boundary_with_no_bits_reported() {
        let mut splitter = RecordHashSplitter::new(21).unwrap();
        let record = vec![0u8; 1 << 10];
        let mut forced = None;
        for _ in 0..16 {
            let (is_boundary, bits_out) = splitter.feed(&record).unwrap();
            if is_boundary {
                forced = Some(bits_out);
                break;
            }
        }
        assert_eq!(forced.expect("max_split_size must eventually force a boundary"), None);
    }

    #[test]
    fn a_forced_boundary_resets_state_for_the_next_record() {
        let mut splitter = RecordHashSplitter::new(21).unwrap();
        let big = vec![0u8; 1 << 12];
        loop {
            let (is_boundary, _) = splitter.feed(&big).unwrap();
            if is_boundary {
                break;
            }
        }
        let (is_boundary, _) = splitter.feed(&[0u8; 4]).unwrap();
        assert!(!is_boundary);
    }
}
