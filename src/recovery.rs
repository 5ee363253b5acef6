//! Recovery strategies for records whose declared length is wrong.
//!
//! Files aggregating many catalog records sometimes misreport the length of
//! unusually large records. When a record read at its declared length does
//! not end with the field terminator / record terminator pair, the reader
//! looks for the true end of the record instead of aborting the pass:
//!
//! 1. the terminator pair may appear earlier, inside the bytes already read
//!    ([`find_terminator_pair`]);
//! 2. otherwise the record terminator is searched for forward in the stream
//!    ([`scan_for_record_terminator`]).

use std::io::{ErrorKind, Read};

use crate::error::Result;
use crate::{FIELD_TERMINATOR, RECORD_TERMINATOR};

/// Strategy for handling records with an unreliable length header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecoveryMode {
    /// Any record not ending with the terminator pair is a framing error.
    Strict,
    /// Search for the real end of the record (default)
    #[default]
    Lenient,
}

/// Counts of records recovered by each strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryStats {
    /// Records cut short at an earlier terminator pair.
    pub truncated: usize,
    /// Records extended forward to a later record terminator.
    pub extended: usize,
}

impl RecoveryStats {
    /// Total number of recovered records.
    #[must_use]
    pub fn total(&self) -> usize {
        self.truncated + self.extended
    }
}

/// Result of scanning forward for a record terminator.
#[derive(Debug, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The terminator was found.
    Found {
        /// Bytes consumed up to and including the terminator.
        bytes: Vec<u8>,
        /// Bytes read past the terminator that the caller must give back.
        overshoot: usize,
    },
    /// The stream ended before a terminator appeared.
    Exhausted {
        /// Number of bytes scanned.
        scanned: usize,
    },
}

/// Index of the first field terminator / record terminator pair in `buffer`.
#[must_use]
pub fn find_terminator_pair(buffer: &[u8]) -> Option<usize> {
    memchr::memmem::find(buffer, &[FIELD_TERMINATOR, RECORD_TERMINATOR])
}

/// Read forward in chunks until the first record terminator.
///
/// The first occurrence wins. Because the reader is consumed in chunks, the
/// bytes read after the terminator are reported as `overshoot` so the caller
/// can reposition the stream right after it.
///
/// # Errors
///
/// Returns an I/O error if the underlying reader fails.
pub fn scan_for_record_terminator<R: Read>(
    reader: &mut R,
    chunk_size: usize,
) -> Result<ScanOutcome> {
    let mut scanned = Vec::new();
    let mut chunk = vec![0u8; chunk_size.max(1)];

    loop {
        let n = match reader.read(&mut chunk) {
            Ok(0) => {
                return Ok(ScanOutcome::Exhausted {
                    scanned: scanned.len(),
                })
            },
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };

        if let Some(ix) = memchr::memchr(RECORD_TERMINATOR, &chunk[..n]) {
            scanned.extend_from_slice(&chunk[..=ix]);
            return Ok(ScanOutcome::Found {
                bytes: scanned,
                overshoot: n - ix - 1,
            });
        }
        scanned.extend_from_slice(&chunk[..n]);
    }
}
