//! Crate-level testable properties and concrete scenarios.
//!
//! Unit tests beside each module cover the scanner-level contracts; this
//! file exercises [`hashsplit::HashSplitter`] end to end, the way a
//! caller actually drives it.

use std::io::Cursor;

use hashsplit::{Error, FromReader, HashSplitter, HashSplitterBuilder, Mode, OpenSource};

fn source(bytes: Vec<u8>) -> Box<dyn OpenSource> {
    Box::new(FromReader(Cursor::new(bytes)))
}

fn pseudo_random(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u32).wrapping_mul(2654435761).to_le_bytes()[0])
        .collect()
}

fn drain(mut splitter: HashSplitter<std::vec::IntoIter<Box<dyn OpenSource>>>) -> Vec<(Vec<u8>, u32)> {
    let mut chunks = Vec::new();
    while let Some(chunk) = splitter.next_chunk().unwrap() {
        chunks.push(chunk);
    }
    chunks
}

#[test]
fn empty_input_sequence_ends_with_no_chunks() {
    let sources: Vec<Box<dyn OpenSource>> = vec![];
    let splitter = HashSplitterBuilder::new(sources.into_iter(), 13).build().unwrap();
    assert!(drain(splitter).is_empty());
}

#[test]
fn repeated_byte_single_source_yields_max_blob_chunks() {
    let bits = 13;
    let max_blob = 1usize << (bits + 2);
    let data = vec![0xffu8; 1 << 20];
    let total = data.len();

    let sources = vec![source(data)];
    let splitter = HashSplitterBuilder::new(sources.into_iter(), bits).build().unwrap();
    let chunks = drain(splitter);

    assert!(!chunks.is_empty());
    let mut covered = 0usize;
    for (i, (chunk, level)) in chunks.iter().enumerate() {
        assert_eq!(*level, 0);
        covered += chunk.len();
        if i + 1 < chunks.len() {
            assert_eq!(chunk.len(), max_blob);
        } else {
            assert!(chunk.len() <= max_blob);
        }
    }
    assert_eq!(covered, total);
}

#[test]
fn two_sources_with_boundaries_split_at_the_seam() {
    let sources = vec![source(vec![1u8; 100]), source(vec![2u8; 100])];
    let splitter = HashSplitterBuilder::new(sources.into_iter(), 13)
        .keep_boundaries(true)
        .build()
        .unwrap();
    let chunks = drain(splitter);

    assert!(chunks.len() >= 2);
    let mut prefix = 0usize;
    let mut hit_seam = false;
    for (chunk, _) in &chunks {
        prefix += chunk.len();
        if prefix == 100 {
            hit_seam = true;
        }
    }
    assert!(hit_seam, "no chunk boundary fell exactly on the source seam");
}

#[test]
fn two_sources_without_boundaries_may_merge_into_one_chunk() {
    let sources = vec![source(vec![1u8; 100]), source(vec![2u8; 100])];
    let splitter = HashSplitterBuilder::new(sources.into_iter(), 13)
        .keep_boundaries(false)
        .build()
        .unwrap();
    let chunks = drain(splitter);
    let total: usize = chunks.iter().map(|(c, _)| c.len()).sum();
    assert_eq!(total, 200);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].0.len(), 200);
}

#[test]
fn bits_too_large_is_rejected_at_construction() {
    let max_bits = hashsplit::Tunables::get().max_bits;
    let sources: Vec<Box<dyn OpenSource>> = vec![];
    let err = HashSplitterBuilder::new(sources.into_iter(), max_bits + 1)
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[test]
fn fanbits_zero_is_rejected_at_construction() {
    let sources: Vec<Box<dyn OpenSource>> = vec![];
    let err = HashSplitterBuilder::new(sources.into_iter(), 13)
        .fanbits(0)
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[test]
fn progress_callback_observes_every_source_open_and_read() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let calls: Rc<RefCell<Vec<(u64, usize)>>> = Rc::new(RefCell::new(Vec::new()));
    let calls_clone = calls.clone();

    let sources = vec![source(vec![7u8; 1000]), source(vec![8u8; 1000])];
    let mut splitter = HashSplitterBuilder::new(sources.into_iter(), 13)
        .progress(move |file_index, delta| calls_clone.borrow_mut().push((file_index, delta)))
        .build()
        .unwrap();

    while splitter.next_chunk().unwrap().is_some() {}

    let recorded = calls.borrow();
    assert!(recorded.iter().any(|(idx, delta)| *idx == 1 && *delta == 0));
    assert!(recorded.iter().any(|(idx, delta)| *idx == 2 && *delta == 0));
    assert!(recorded.iter().any(|(_, delta)| *delta > 0));
}

#[test]
fn split_set_is_deterministic_across_runs() {
    let data = pseudo_random(1 << 18);

    let run = || {
        let sources = vec![source(data.clone())];
        let splitter = HashSplitterBuilder::new(sources.into_iter(), 13).build().unwrap();
        drain(splitter)
            .into_iter()
            .map(|(chunk, level)| (chunk.len(), level))
            .collect::<Vec<_>>()
    };

    assert_eq!(run(), run());
}

#[test]
fn fastcdc_mode_produces_chunks_within_the_expected_band() {
    let bits = 13;
    let min_size = 1usize << (bits - 2);
    let max_blob = 1usize << (bits + 2);
    let data = pseudo_random(1 << 20);
    let total = data.len();

    let sources = vec![source(data)];
    let splitter = HashSplitterBuilder::new(sources.into_iter(), bits)
        .mode("fastcdc")
        .build()
        .unwrap();
    let chunks = drain(splitter);

    let mut covered = 0usize;
    for (chunk, _) in &chunks {
        assert!(chunk.len() >= 1 && chunk.len() <= max_blob);
        covered += chunk.len();
    }
    assert_eq!(covered, total);

    // Every non-forced (content-defined) chunk must be at least
    // min_size, except possibly the very last: a short trailing tail
    // below min_size is returned whole rather than buffered further.
    let last = chunks.len() - 1;
    for (i, (chunk, _)) in chunks.iter().enumerate() {
        assert!(chunk.len() >= min_size || chunk.len() == max_blob || i == last);
    }
}

#[test]
fn unknown_mode_string_is_rejected() {
    let sources: Vec<Box<dyn OpenSource>> = vec![];
    let err = HashSplitterBuilder::new(sources.into_iter(), 13)
        .mode("rabin")
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[test]
fn omitting_mode_is_equivalent_to_legacy() {
    let implicit: Vec<Box<dyn OpenSource>> = vec![];
    let explicit: Vec<Box<dyn OpenSource>> = vec![];
    assert!(HashSplitterBuilder::new(implicit.into_iter(), 13).build().is_ok());
    assert!(HashSplitterBuilder::new(explicit.into_iter(), 13)
        .mode("legacy")
        .build()
        .is_ok());
    let _ = Mode::Legacy;
}
