//! Error types for the feature-extraction and sensitivity engine.
//!
//! Pure transforms (segmenting, perturbing, extracting, serialising) return
//! [`XaiError`].  Anything that crosses the classifier seam is reported as
//! `anyhow::Error`; an `XaiError` raised underneath can be recovered with
//! `err.downcast_ref::<XaiError>()`.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the engine.
#[derive(Error, Debug)]
pub enum XaiError {
    /// A parameter cannot produce a meaningful result
    /// (e.g. zero segments, a zero feature budget).
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// What was wrong with the parameters
        reason: String,
    },

    /// Two inputs disagree on an axis, or a target index is out of range.
    #[error("shape mismatch in {what}: expected {expected}, got {got}")]
    ShapeMismatch {
        /// Which quantity was checked
        what: &'static str,
        /// Expected value (or exclusive upper bound)
        expected: usize,
        /// Value that was supplied
        got: usize,
    },

    /// A destination could not be opened or written.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File being read or written
        path: PathBuf,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },
}

impl XaiError {
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration { reason: reason.into() }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, XaiError>;
