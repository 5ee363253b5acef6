//! Error types for MARC identifier extraction.
//!
//! This module provides the [`MarcError`] type for all decoding and loading
//! operations and the [`Result`] convenience type.
//!
//! End of stream is not an error: readers return `Ok(None)` when the input is
//! exhausted cleanly.

use thiserror::Error;

/// Error type for all record decoding and loading operations.
#[derive(Error, Debug)]
pub enum MarcError {
    /// Malformed length header, unrecoverable missing record terminator, or a
    /// directory/field that cannot be parsed or located.
    #[error("Bad MARC record: {0}")]
    BadFraming(String),

    /// An operation was attempted on a loader with no open stream.
    #[error("File is not open")]
    StreamNotOpen,

    /// IO error from the underlying byte source.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl MarcError {
    /// Shorthand for building a [`MarcError::BadFraming`].
    pub(crate) fn framing(message: impl Into<String>) -> Self {
        MarcError::BadFraming(message.into())
    }

    /// Returns `true` for structural failures in the record bytes.
    #[must_use]
    pub fn is_bad_framing(&self) -> bool {
        matches!(self, MarcError::BadFraming(_))
    }
}

/// Convenience type alias for [`std::result::Result`] with [`MarcError`].
pub type Result<T> = std::result::Result<T, MarcError>;
