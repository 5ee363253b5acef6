//! Stateful iteration over the logical records of one file.
//!
//! A [`Loader`] owns one open byte source and the data source tag derived
//! from the input name. It hands out records through [`Loader::first`] and
//! [`Loader::next`], optionally folding continuation records, can validate
//! the framing of a whole file, and is closed with [`Loader::done`].
//!
//! # Examples
//!
//! ```
//! use marcid::{list_identifiers, Loader};
//! use std::io::Cursor;
//!
//! let data = b"00041nam a2200037   4500001000300000\x1eu1\x1e\x1d".to_vec();
//! let mut loader = Loader::from_stream(Cursor::new(data), "unknown");
//!
//! let mut out = Vec::new();
//! assert_eq!(list_identifiers(&mut loader, true, &mut out)?, 1);
//! assert_eq!(out, b"u1\n");
//! # Ok::<(), marcid::MarcError>(())
//! ```

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

use log::{debug, error, info, warn};

use crate::error::{MarcError, Result};
use crate::marc_record::MarcRecord;
use crate::merger::merge_continuations;
use crate::reader::{ByteSource, RawRecordReader};
use crate::record::Record;
use crate::recovery::{RecoveryMode, RecoveryStats};
use crate::source::data_source;

/// Iterates the logical records of one input.
#[derive(Debug)]
pub struct Loader<R> {
    reader: Option<RawRecordReader<R>>,
    source: String,
}

impl Loader<BufReader<File>> {
    /// Open the local file `path`.
    ///
    /// `name` is the input name as given by the user (possibly a remote name
    /// of which `path` is the downloaded copy); the data source tag is derived
    /// from it.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>, name: &str) -> Result<Self> {
        let reader = RawRecordReader::open(path)?;
        Ok(Self::new(reader, data_source(name)))
    }
}

impl<R: ByteSource> Loader<R> {
    /// Create a loader over an already opened reader.
    #[must_use]
    pub fn new(reader: RawRecordReader<R>, source: impl Into<String>) -> Self {
        Loader {
            reader: Some(reader),
            source: source.into(),
        }
    }

    /// Create a loader over any seekable stream.
    #[must_use]
    pub fn from_stream(stream: R, source: impl Into<String>) -> Self {
        Self::new(RawRecordReader::new(stream), source)
    }

    /// Set the recovery mode of the underlying reader.
    #[must_use]
    pub fn with_recovery_mode(mut self, mode: RecoveryMode) -> Self {
        self.reader = self.reader.map(|reader| reader.with_recovery_mode(mode));
        self
    }

    /// The data source tag given to every record.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the stream is still open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    /// Recovery counts so far, if the stream is open.
    #[must_use]
    pub fn recovery_stats(&self) -> Option<RecoveryStats> {
        self.reader.as_ref().map(RawRecordReader::recovery_stats)
    }

    /// Rewind to the start of the stream and read the first record.
    ///
    /// # Errors
    ///
    /// Same as [`Loader::next`].
    pub fn first(&mut self, read_ahead: bool) -> Result<Option<Record>> {
        self.reader_mut()?.seek_start()?;
        self.next(read_ahead)
    }

    /// Read the next record.
    ///
    /// The record's identifier is extracted before it is returned. With
    /// `read_ahead`, following frames carrying the same identifier are folded
    /// into it and the stream is left at the first frame after them.
    ///
    /// Returns `Ok(None)` at the end of the stream.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::StreamNotOpen`] after [`Loader::done`],
    /// [`MarcError::BadFraming`] for a malformed record or one without an
    /// identifier, and [`MarcError::IoError`] for read failures.
    pub fn next(&mut self, read_ahead: bool) -> Result<Option<Record>> {
        let reader = self.reader.as_mut().ok_or(MarcError::StreamNotOpen)?;

        let Some(raw) = reader.read_raw()? else {
            return Ok(None);
        };
        let record = Record::new(raw, self.source.as_str());
        record.identifier()?;

        if !read_ahead {
            return Ok(Some(record));
        }
        merge_continuations(reader, record).map(Some)
    }

    /// Check every record in the file is well framed and has an identifier.
    ///
    /// Continuation records are not folded. Returns the number of records
    /// read; an empty file validates successfully. The stream is left at the
    /// end, so call [`Loader::first`] to start reading afterwards.
    ///
    /// # Errors
    ///
    /// Returns the first failure encountered. The failing record index is
    /// logged.
    pub fn validate(&mut self) -> Result<usize> {
        if !self.is_open() {
            return Err(MarcError::StreamNotOpen);
        }

        match self.first(false) {
            Ok(Some(_)) => {},
            Ok(None) => {
                warn!("EOF on first read, looks like an empty file");
                return Ok(0);
            },
            Err(e) => {
                error!("validation failure on record index 0");
                return Err(e);
            },
        }

        let mut index = 1;
        loop {
            match self.next(false) {
                Ok(Some(_)) => index += 1,
                Ok(None) => break,
                Err(e) => {
                    error!("validation failure on record index {index}");
                    return Err(e);
                },
            }
        }

        info!("validated {index} records");
        Ok(index)
    }

    /// Close the stream. Calling it again does nothing.
    pub fn done(&mut self) {
        if let Some(reader) = self.reader.take() {
            debug!("closing input after {} frames", reader.records_read());
        }
    }

    /// Iterate all records from the start of the stream, folding
    /// continuations.
    pub fn records(&mut self) -> Records<'_, R> {
        Records {
            loader: self,
            started: false,
            finished: false,
        }
    }

    fn reader_mut(&mut self) -> Result<&mut RawRecordReader<R>> {
        self.reader.as_mut().ok_or(MarcError::StreamNotOpen)
    }
}

/// Iterator over the records of a [`Loader`], created by [`Loader::records`].
///
/// Yields at most one error, after which it is exhausted.
#[derive(Debug)]
pub struct Records<'a, R> {
    loader: &'a mut Loader<R>,
    started: bool,
    finished: bool,
}

impl<R: ByteSource> Iterator for Records<'_, R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let result = if self.started {
            self.loader.next(true)
        } else {
            self.started = true;
            self.loader.first(true)
        };

        match result {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.finished = true;
                None
            },
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            },
        }
    }
}

/// Write the identifier of every record to `out`, one per line.
///
/// Starts from the beginning of the stream. Returns the number of
/// identifiers written.
///
/// # Errors
///
/// Any framing or I/O error aborts the listing.
pub fn list_identifiers<R: ByteSource, W: Write>(
    loader: &mut Loader<R>,
    read_ahead: bool,
    out: &mut W,
) -> Result<usize> {
    let mut count = 0;
    let mut next = loader.first(read_ahead)?;
    while let Some(record) = next {
        write_identifier(&record, out)?;
        count += 1;
        next = loader.next(read_ahead)?;
    }
    Ok(count)
}

fn write_identifier<T: MarcRecord, W: Write>(record: &T, out: &mut W) -> Result<()> {
    writeln!(out, "{}", record.identifier()?)?;
    Ok(())
}
