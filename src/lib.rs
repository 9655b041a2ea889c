//! Content-defined chunking for a deduplicating backup system.
//!
//! Splits one or more byte sources into variable-length chunks at
//! positions the data itself determines, so that inserting or deleting
//! bytes near the front of a file only perturbs the chunks adjacent to
//! the change. Two boundary scanners are available: a rolling-sum
//! scanner compatible with the legacy on-disk chunk layout ([`legacy`]),
//! and a gear-hash scanner compatible with FastCDC-chunked repositories
//! ([`fastcdc`]).
//!
//! The primary entry point is [`HashSplitter`], a pull-driven, single
//! threaded iterator over one or more [`source::OpenSource`]s. A
//! record-oriented variant, [`record::RecordHashSplitter`], reports
//! boundaries across a caller-delimited stream of whole records instead
//! of raw bytes.

mod advisor;
mod buffer;
pub mod config;
pub mod error;
pub mod fastcdc;
pub mod legacy;
pub mod record;
pub mod rolling;
pub mod source;
pub mod splitter;
pub mod tunables;

pub use config::SplitterDefaults;
pub use error::{Error, Result};
pub use record::RecordHashSplitter;
pub use source::{FromReader, OpenSource};
pub use splitter::{Chunk, HashSplitter, HashSplitterBuilder, Mode};
pub use tunables::Tunables;

#[cfg(unix)]
pub use source::FdReader;
