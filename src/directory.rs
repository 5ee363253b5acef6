//! Leader/directory decoding and identifier extraction.
//!
//! A record's directory starts at byte 24 and is a run of 12-byte entries:
//!
//! - field tag (3 bytes)
//! - field length (4 ASCII digits)
//! - field offset (5 ASCII digits), relative to the end of the directory
//!
//! The end of the directory is declared in bytes 12-16 of the record. Field
//! values follow the directory and each ends with a field terminator.
//!
//! # Examples
//!
//! ```
//! use marcid::directory::extract_identifier;
//!
//! let raw = b"00041nam a2200037   4500001000300000\x1eu1\x1e\x1d";
//! assert_eq!(extract_identifier(raw)?, "u1");
//! # Ok::<(), marcid::MarcError>(())
//! ```

use std::borrow::Cow;
use std::ops::Range;

use log::{debug, error, info};

use crate::error::{MarcError, Result};
use crate::{parse_ascii_number, FIELD_TERMINATOR};

/// Byte offset of the first directory entry.
pub const DIRECTORY_START: usize = 24;

/// Size of one directory entry.
pub const DIRECTORY_ENTRY_LEN: usize = 12;

/// Tag holding the record's control number.
pub const ID_TAG: &str = "001";

/// Tag consulted when a record has no usable control number.
pub const FALLBACK_ID_TAG: &str = "035";

const END_OF_DIRECTORY_START: usize = 12;
const END_OF_DIRECTORY_END: usize = 17;

// Written by some exporters when the real value is not known.
const UNKNOWN_END_OF_DIRECTORY: usize = 99999;

/// One decoded directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Field tag bytes, e.g. `b"001"`.
    pub tag: [u8; 3],
    /// Field length including its trailing terminator.
    pub length: usize,
    /// Field offset relative to the end of the directory.
    pub offset: usize,
}

impl DirectoryEntry {
    /// Decode a 12-byte directory entry.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::BadFraming`] if the slice is not 12 bytes or the
    /// length/offset columns are not decimal digits.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != DIRECTORY_ENTRY_LEN {
            return Err(MarcError::framing(format!(
                "directory entry must be {DIRECTORY_ENTRY_LEN} bytes, got {}",
                bytes.len()
            )));
        }

        let tag = [bytes[0], bytes[1], bytes[2]];
        let length = parse_ascii_number(&bytes[3..7]).ok_or_else(|| {
            let raw = String::from_utf8_lossy(&bytes[3..7]);
            error!("marc record field length invalid ({raw})");
            MarcError::framing(format!("field length invalid ({raw})"))
        })?;
        let offset = parse_ascii_number(&bytes[7..12]).ok_or_else(|| {
            let raw = String::from_utf8_lossy(&bytes[7..12]);
            error!("marc record field offset invalid ({raw})");
            MarcError::framing(format!("field offset invalid ({raw})"))
        })?;

        Ok(DirectoryEntry {
            tag,
            length,
            offset,
        })
    }

    /// The tag as text.
    #[must_use]
    pub fn tag_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.tag)
    }

    /// Whether this entry describes `tag`.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag[..] == *tag.as_bytes()
    }

    /// Byte range of the field value, excluding its final terminator byte.
    ///
    /// A zero-length entry yields an empty range.
    #[must_use]
    pub fn value_range(&self, end_of_directory: usize) -> Range<usize> {
        let start = end_of_directory + self.offset;
        start..start + self.length.saturating_sub(1)
    }
}

/// Locate the end of the directory, correcting an untrusted declared value.
///
/// The declared value in bytes 12-16 is accepted only when the byte just
/// before it is a field terminator. Otherwise (including the `99999`
/// "unknown" sentinel) the directory is taken to end one past the first field
/// terminator in the record.
///
/// # Errors
///
/// Returns [`MarcError::BadFraming`] if the record is too short to hold the
/// declared value, the value is not numeric, or no field terminator exists.
pub fn end_of_directory(raw: &[u8]) -> Result<usize> {
    let declared_bytes = raw
        .get(END_OF_DIRECTORY_START..END_OF_DIRECTORY_END)
        .ok_or_else(|| {
            MarcError::framing(format!(
                "record of {} bytes is too short for a leader",
                raw.len()
            ))
        })?;

    let declared = parse_ascii_number(declared_bytes).ok_or_else(|| {
        let text = String::from_utf8_lossy(declared_bytes);
        error!("marc record end of directory offset invalid ({text})");
        MarcError::framing(format!("end of directory offset invalid ({text})"))
    })?;

    if declared != UNKNOWN_END_OF_DIRECTORY
        && declared > 0
        && raw.get(declared - 1) == Some(&FIELD_TERMINATOR)
    {
        return Ok(declared);
    }

    let found = memchr::memchr(FIELD_TERMINATOR, raw).ok_or_else(|| {
        error!("cannot locate end of directory marker");
        MarcError::framing("cannot locate end of directory marker")
    })? + 1;
    info!("resetting directory terminator. was {declared}, now {found}");
    Ok(found)
}

/// Walks the directory entries of one record.
///
/// Iteration stops at the end of the directory, at the directory's own
/// terminator, or after the first entry that fails to decode.
#[derive(Debug, Clone)]
pub struct Directory<'a> {
    raw: &'a [u8],
    end: usize,
    pos: usize,
}

impl<'a> Directory<'a> {
    /// Prepare to walk the directory of `raw`.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::BadFraming`] if the end of the directory cannot be
    /// determined.
    pub fn parse(raw: &'a [u8]) -> Result<Self> {
        let end = end_of_directory(raw)?;
        Ok(Directory {
            raw,
            end,
            pos: DIRECTORY_START,
        })
    }

    /// Offset one past the directory; field offsets are relative to it.
    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Find the byte range of the field tagged `tag`.
    ///
    /// Returns `Ok(None)` when the directory has no such entry.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::BadFraming`] if an entry before the match cannot be
    /// decoded, or the matching field lies outside the record.
    pub fn find(self, tag: &str) -> Result<Option<Range<usize>>> {
        let end = self.end;
        let len = self.raw.len();
        for entry in self {
            let entry = entry?;
            if entry.has_tag(tag) {
                let range = entry.value_range(end);
                if range.end > len {
                    return Err(MarcError::framing(format!(
                        "field {tag} at {range:?} lies outside a record of {len} bytes"
                    )));
                }
                return Ok(Some(range));
            }
        }
        Ok(None)
    }
}

impl Iterator for Directory<'_> {
    type Item = Result<DirectoryEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.end || self.raw.get(self.pos) == Some(&FIELD_TERMINATOR) {
            return None;
        }

        let start = self.pos;
        let Some(bytes) = self.raw.get(start..start + DIRECTORY_ENTRY_LEN) else {
            self.pos = self.end;
            return Some(Err(MarcError::framing(format!(
                "directory entry at {start} runs past the end of the record"
            ))));
        };

        let entry = DirectoryEntry::parse(bytes);
        self.pos = if entry.is_ok() {
            start + DIRECTORY_ENTRY_LEN
        } else {
            self.end
        };
        Some(entry)
    }
}

/// Find the byte range of the field tagged `tag` in a raw record.
///
/// # Errors
///
/// Returns [`MarcError::BadFraming`] when the leader or directory cannot be
/// decoded. A missing tag is `Ok(None)`.
pub fn lookup_field(raw: &[u8], tag: &str) -> Result<Option<Range<usize>>> {
    let range = Directory::parse(raw)?.find(tag)?;
    if range.is_none() {
        debug!("could not locate field {tag} in marc record");
    }
    Ok(range)
}

/// Extract the record identifier: field 001, falling back to field 035.
///
/// The fallback is used whenever field 001 is missing or cannot be decoded.
///
/// # Errors
///
/// Returns [`MarcError::BadFraming`] when neither field can be located.
pub fn extract_identifier(raw: &[u8]) -> Result<String> {
    let range = match lookup_field(raw, ID_TAG) {
        Ok(Some(range)) => range,
        primary => {
            if let Err(e) = primary {
                debug!("field {ID_TAG} unreadable ({e}), trying {FALLBACK_ID_TAG}");
            }
            lookup_field(raw, FALLBACK_ID_TAG)?.ok_or_else(|| {
                error!("could not locate field {ID_TAG} or {FALLBACK_ID_TAG} in marc record");
                MarcError::framing(format!(
                    "no {ID_TAG} or {FALLBACK_ID_TAG} field in record"
                ))
            })?
        },
    };
    Ok(String::from_utf8_lossy(&raw[range]).into_owned())
}
