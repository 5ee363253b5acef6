#![warn(missing_docs)]

//! # marcid: MARC record identifier extraction
//!
//! Reads a sequential file of ISO 2709 (MARC) binary records and yields the
//! unique identifier of every logical record, in file order.
//!
//! Records are framed by a 5-digit length header and end with a field
//! terminator / record terminator pair. Files that aggregate many catalog
//! records sometimes misreport the length of very large records, so the
//! reader recovers by searching for the terminators instead. Catalog records
//! too large for a single frame are split into several consecutive frames
//! sharing one identifier; the loader folds those back together.
//!
//! ## Quick Start
//!
//! ```no_run
//! use marcid::Loader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut loader = Loader::open("records.mrc", "catalog/sirsi/2024/records.mrc")?;
//!
//! let mut next = loader.first(true)?;
//! while let Some(record) = next {
//!     println!("{}", record.identifier()?);
//!     next = loader.next(true)?;
//! }
//! loader.done();
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`reader`]: Length-prefixed framing over a seekable byte source
//! - [`recovery`]: Terminator search when a declared length is wrong
//! - [`directory`]: Leader/directory decoding and identifier extraction
//! - [`record`]: Raw record bytes with a cached identifier
//! - [`merger`]: Folding of continuation records
//! - [`loader`]: First/next iteration, validation, and listing
//! - [`source`]: Data source tags and input locations
//! - [`config`]: Configuration for a listing run
//! - [`error`]: Error types and result type

pub mod config;
pub mod directory;
pub mod error;
pub mod loader;
pub mod marc_record;
pub mod merger;
pub mod reader;
pub mod record;
pub mod recovery;
pub mod source;

#[cfg(test)]
pub(crate) mod test_records;

pub use config::{ConfigError, ListConfig};
pub use directory::{extract_identifier, lookup_field, Directory, DirectoryEntry};
pub use error::{MarcError, Result};
pub use loader::{list_identifiers, Loader, Records};
pub use marc_record::MarcRecord;
pub use merger::{merge_continuations, RecordSource};
pub use reader::{ByteSource, RawRecordReader, ReaderMark};
pub use record::Record;
pub use recovery::{RecoveryMode, RecoveryStats};
pub use source::{data_source, InputLocation};

/// Size of the ASCII decimal length header at the start of every record.
pub const HEADER_LEN: usize = 5;

/// Byte ending each variable field and the directory.
pub const FIELD_TERMINATOR: u8 = 0x1E;

/// Byte ending a whole record.
pub const RECORD_TERMINATOR: u8 = 0x1D;

/// Parse an unsigned ASCII decimal number without allocating.
///
/// Returns `None` for empty input or any non-digit byte.
pub(crate) fn parse_ascii_number(bytes: &[u8]) -> Option<usize> {
    if bytes.is_empty() {
        return None;
    }
    let mut result = 0usize;
    for &byte in bytes {
        if !byte.is_ascii_digit() {
            return None;
        }
        result = result * 10 + usize::from(byte - b'0');
    }
    Some(result)
}
