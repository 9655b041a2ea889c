//! Optional TOML-backed defaults for [`crate::HashSplitter`] construction
//! parameters.
//!
//! Grounded in the teacher's `Config::load()`: a `serde`-deserialized
//! struct with `#[serde(default)]` fields. Unlike the teacher's, this one
//! is not a process-wide `OnceCell` singleton: a host application may
//! want different defaults per splitter instance (e.g. one profile for
//! large blobs, another for small records), so `load_from` just returns
//! an owned value.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

fn default_bits() -> u32 {
    13
}

fn default_fanbits() -> u32 {
    4
}

fn default_keep_boundaries() -> bool {
    true
}

/// Defaults for [`crate::HashSplitterBuilder`], loadable from a TOML
/// file. Every field matches a construction parameter of
/// [`crate::HashSplitter`].
#[derive(Debug, Clone, Deserialize)]
pub struct SplitterDefaults {
    #[serde(default = "default_bits")]
    pub bits: u32,
    #[serde(default = "default_fanbits")]
    pub fanbits: u32,
    #[serde(default = "default_keep_boundaries")]
    pub keep_boundaries: bool,
    #[serde(default)]
    pub mode: Option<String>,
}

impl Default for SplitterDefaults {
    fn default() -> Self {
        SplitterDefaults {
            bits: default_bits(),
            fanbits: default_fanbits(),
            keep_boundaries: default_keep_boundaries(),
            mode: None,
        }
    }
}

impl SplitterDefaults {
    /// Parse defaults out of a TOML file, e.g. a `[splitter]` table in a
    /// host application's own config.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| Error::invalid_argument(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_documented_defaults() {
        let defaults: SplitterDefaults = toml::from_str("").unwrap();
        assert_eq!(defaults.bits, 13);
        assert_eq!(defaults.fanbits, 4);
        assert!(defaults.keep_boundaries);
        assert_eq!(defaults.mode, None);
    }

    #[test]
    fn explicit_fields_override_defaults() {
        let defaults: SplitterDefaults = toml::from_str(
            r#"
            bits = 18
            fanbits = 2
            keep_boundaries = false
            mode = "fastcdc"
            "#,
        )
        .unwrap();
        assert_eq!(defaults.bits, 18);
        assert_eq!(defaults.fanbits, 2);
        assert!(!defaults.keep_boundaries);
        assert_eq!(defaults.mode.as_deref(), Some("fastcdc"));
    }

    #[test]
    fn load_from_missing_file_is_an_io_error() {
        let err = SplitterDefaults::load_from("/nonexistent/path/config.toml").unwrap_err();
        assert!(matches!(err, Error::IoError(_)));
    }
}
