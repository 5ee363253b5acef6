//! Raw MARC record bytes with a lazily computed identifier.

use std::cell::OnceCell;

use crate::directory::extract_identifier;
use crate::error::Result;

/// One logical MARC record as read from a file.
///
/// The raw bytes are exclusively owned by the record. They only change when
/// the loader folds a continuation record in, which always happens after the
/// identifier has been cached, so the identifier never changes once computed.
///
/// # Examples
///
/// ```
/// use marcid::Record;
///
/// let raw = b"00041nam a2200037   4500001000300000\x1eu1\x1e\x1d".to_vec();
/// let record = Record::new(raw, "sirsi");
///
/// assert_eq!(record.identifier()?, "u1");
/// assert_eq!(record.source(), "sirsi");
/// # Ok::<(), marcid::MarcError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Record {
    raw: Vec<u8>,
    source: String,
    identifier: OnceCell<String>,
}

impl Record {
    /// Wrap raw record bytes read from the data source `source`.
    #[must_use]
    pub fn new(raw: Vec<u8>, source: impl Into<String>) -> Self {
        Record {
            raw,
            source: source.into(),
            identifier: OnceCell::new(),
        }
    }

    /// The raw record bytes.
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Length of the raw bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Whether the record has no bytes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// The data source tag.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Replace the data source tag.
    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
    }

    /// The record identifier, from field 001 or else field 035.
    ///
    /// Computed on first use and cached.
    ///
    /// # Errors
    ///
    /// Returns [`crate::MarcError::BadFraming`] if neither field can be
    /// located. Failures are not cached.
    pub fn identifier(&self) -> Result<&str> {
        if let Some(id) = self.identifier.get() {
            return Ok(id);
        }
        let id = extract_identifier(&self.raw)?;
        Ok(self.identifier.get_or_init(|| id))
    }

    /// Append the raw bytes of a continuation record.
    pub(crate) fn append_raw(&mut self, continuation: &[u8]) {
        let mut combined = Vec::with_capacity(self.raw.len() + continuation.len());
        combined.extend_from_slice(&self.raw);
        combined.extend_from_slice(continuation);
        self.raw = combined;
    }

    /// Consume the record, returning its raw bytes.
    #[must_use]
    pub fn into_raw(self) -> Vec<u8> {
        self.raw
    }
}

// The identifier cache is derived from `raw`, so it takes no part in equality.
impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw && self.source == other.source
    }
}

impl Eq for Record {}
