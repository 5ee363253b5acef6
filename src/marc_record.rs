//! Core trait for MARC records handed out by a loader.
//!
//! This module defines the [`MarcRecord`] trait: the capabilities a consumer
//! of the loader relies on, independent of how the record is stored.

use crate::error::Result;
use crate::record::Record;

/// Common interface for loaded MARC records.
///
/// # Examples
///
/// ```
/// use marcid::{MarcRecord, Record};
///
/// fn describe<T: MarcRecord>(record: &T) -> String {
///     format!("{} bytes from {}", record.raw().len(), record.source())
/// }
///
/// let record = Record::new(vec![0; 10], "sirsi");
/// assert_eq!(describe(&record), "10 bytes from sirsi");
/// ```
pub trait MarcRecord {
    /// The raw framed bytes, including any folded continuation records.
    fn raw(&self) -> &[u8];

    /// The record's unique identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier cannot be extracted.
    fn identifier(&self) -> Result<&str>;

    /// Informational tag naming the data source the record came from.
    fn source(&self) -> &str;
}

impl MarcRecord for Record {
    fn raw(&self) -> &[u8] {
        Record::raw(self)
    }

    fn identifier(&self) -> Result<&str> {
        Record::identifier(self)
    }

    fn source(&self) -> &str {
        Record::source(self)
    }
}
