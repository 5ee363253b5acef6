//! Reading length-prefixed MARC frames from a seekable byte stream.
//!
//! This module provides [`RawRecordReader`], which splits a stream into the
//! raw bytes of one framed record per call. Every frame starts with a 5-digit
//! ASCII length that counts the header itself, and a well-formed frame ends
//! with a field terminator (0x1E) followed by a record terminator (0x1D).
//!
//! # Examples
//!
//! Reading from a buffer:
//!
//! ```
//! use marcid::RawRecordReader;
//! use std::io::Cursor;
//!
//! let data = b"00041nam a2200037   4500001000300000\x1eu1\x1e\x1d".to_vec();
//! let mut reader = RawRecordReader::new(Cursor::new(data));
//!
//! let raw = reader.read_raw()?.expect("one record");
//! assert_eq!(raw.len(), 41);
//! assert!(reader.read_raw()?.is_none());
//! # Ok::<(), marcid::MarcError>(())
//! ```

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

use log::{error, warn};

use crate::error::{MarcError, Result};
use crate::recovery::{
    find_terminator_pair, scan_for_record_terminator, RecoveryMode, RecoveryStats, ScanOutcome,
};
use crate::{parse_ascii_number, FIELD_TERMINATOR, HEADER_LEN, RECORD_TERMINATOR};

const SCAN_CHUNK_SIZE: usize = 8 * 1024;

/// A sequentially read, seekable byte stream.
pub trait ByteSource: Read + Seek {}

impl<T: Read + Seek> ByteSource for T {}

/// Reader for length-prefixed binary MARC frames.
///
/// Frames are returned as raw bytes without further decoding. A short read at
/// the end of the stream, whether of the header or of the frame body, is
/// reported as `Ok(None)` rather than an error.
#[derive(Debug)]
pub struct RawRecordReader<R> {
    reader: R,
    header: [u8; HEADER_LEN],
    recovery_mode: RecoveryMode,
    records_read: usize,
    stats: RecoveryStats,
}

/// Reader state saved before a lookahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderMark {
    position: u64,
    records_read: usize,
    stats: RecoveryStats,
}

impl ReaderMark {
    /// Absolute stream position of the mark.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }
}

impl RawRecordReader<BufReader<File>> {
    /// Open a local file for reading.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: ByteSource> RawRecordReader<R> {
    /// Create a new reader over `reader`, positioned wherever `reader` is.
    #[must_use]
    pub fn new(reader: R) -> Self {
        RawRecordReader {
            reader,
            header: [0; HEADER_LEN],
            recovery_mode: RecoveryMode::default(),
            records_read: 0,
            stats: RecoveryStats::default(),
        }
    }

    /// Set the recovery mode for frames with an unreliable length header.
    ///
    /// # Examples
    ///
    /// ```
    /// use marcid::{RawRecordReader, RecoveryMode};
    /// use std::io::Cursor;
    ///
    /// let reader = RawRecordReader::new(Cursor::new(Vec::new()))
    ///     .with_recovery_mode(RecoveryMode::Strict);
    /// assert_eq!(reader.recovery_mode(), RecoveryMode::Strict);
    /// ```
    #[must_use]
    pub fn with_recovery_mode(mut self, mode: RecoveryMode) -> Self {
        self.recovery_mode = mode;
        self
    }

    /// The active recovery mode.
    #[must_use]
    pub fn recovery_mode(&self) -> RecoveryMode {
        self.recovery_mode
    }

    /// Number of frames returned so far.
    #[must_use]
    pub fn records_read(&self) -> usize {
        self.records_read
    }

    /// Frames that needed a recovery strategy so far.
    #[must_use]
    pub fn recovery_stats(&self) -> RecoveryStats {
        self.stats
    }

    /// Current absolute stream position.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the position cannot be queried.
    pub fn position(&mut self) -> Result<u64> {
        Ok(self.reader.stream_position()?)
    }

    /// Move the stream to an absolute position.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the seek fails.
    pub fn rewind_to(&mut self, position: u64) -> Result<()> {
        self.reader.seek(SeekFrom::Start(position))?;
        Ok(())
    }

    /// Save the current position together with the read counters.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the position cannot be queried.
    pub fn mark(&mut self) -> Result<ReaderMark> {
        Ok(ReaderMark {
            position: self.position()?,
            records_read: self.records_read,
            stats: self.stats,
        })
    }

    /// Return to a state saved by [`RawRecordReader::mark`], forgetting any
    /// frames read since.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the seek fails.
    pub fn reset(&mut self, mark: ReaderMark) -> Result<()> {
        self.rewind_to(mark.position)?;
        self.records_read = mark.records_read;
        self.stats = mark.stats;
        Ok(())
    }

    /// Move the stream back to its first byte.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the seek fails.
    pub fn seek_start(&mut self) -> Result<()> {
        self.rewind_to(0)
    }

    /// Consume the reader, returning the underlying stream.
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Read the raw bytes of the next framed record.
    ///
    /// Returns `Ok(Some(bytes))` for a record, `Ok(None)` at the end of the
    /// stream, or `Err` for a malformed frame.
    ///
    /// When the frame read at its declared length does not end with the
    /// terminator pair and the reader is lenient:
    ///
    /// - if the pair occurs earlier in the frame at index `i`, bytes `[0, i)`
    ///   are returned and the stream resumes right after the pair;
    /// - otherwise the stream is scanned forward for the next record
    ///   terminator, and the frame is extended through it.
    ///
    /// # Errors
    ///
    /// Returns [`MarcError::BadFraming`] if:
    /// - The length header is not a decimal number, or is not larger than the
    ///   header itself
    /// - No record terminator can be found
    ///
    /// Returns [`MarcError::IoError`] for any failure of the byte source.
    pub fn read_raw(&mut self) -> Result<Option<Vec<u8>>> {
        let got = read_full(&mut self.reader, &mut self.header)?;
        if got < HEADER_LEN {
            if got > 0 {
                warn!("short header read ({got} trailing bytes). Declaring EOF");
            }
            return Ok(None);
        }

        let Some(length) = parse_ascii_number(&self.header) else {
            let text = String::from_utf8_lossy(&self.header);
            error!("marc record prefix invalid ({text})");
            return Err(MarcError::framing(format!("record length invalid ({text})")));
        };
        if length <= HEADER_LEN {
            let text = String::from_utf8_lossy(&self.header);
            error!("marc record prefix invalid ({text})");
            return Err(MarcError::framing(format!(
                "record length {length} does not exceed the header size"
            )));
        }

        // The header is part of the raw record.
        let mut buffer = vec![0u8; length];
        buffer[..HEADER_LEN].copy_from_slice(&self.header);
        let got = HEADER_LEN + read_full(&mut self.reader, &mut buffer[HEADER_LEN..])?;
        if got != length {
            warn!("short record read. Expected {length}, got {got}. Declaring EOF");
            return Ok(None);
        }

        if buffer[length - 2] == FIELD_TERMINATOR && buffer[length - 1] == RECORD_TERMINATOR {
            self.records_read += 1;
            return Ok(Some(buffer));
        }

        warn!(
            "unexpected marc record suffix. Expected ({FIELD_TERMINATOR:x} {RECORD_TERMINATOR:x}) got ({:x} {:x}). Header length reports {length}",
            buffer[length - 2],
            buffer[length - 1]
        );

        if self.recovery_mode == RecoveryMode::Strict {
            return Err(MarcError::framing(format!(
                "record of declared length {length} does not end with a record terminator"
            )));
        }

        let recovered = self.recover(buffer)?;
        self.records_read += 1;
        Ok(Some(recovered))
    }

    fn recover(&mut self, mut buffer: Vec<u8>) -> Result<Vec<u8>> {
        if let Some(ix) = find_terminator_pair(&buffer) {
            warn!("located record terminator earlier in the buffer at offset {ix}");
            // Resume right after the pair; the rest of the buffer belongs to
            // the next record.
            let unread = buffer.len() - (ix + 2);
            self.reader.seek(SeekFrom::Current(-offset(unread)))?;
            buffer.truncate(ix);
            self.stats.truncated += 1;
            return Ok(buffer);
        }

        match scan_for_record_terminator(&mut self.reader, SCAN_CHUNK_SIZE)? {
            ScanOutcome::Found { bytes, overshoot } => {
                if overshoot > 0 {
                    self.reader.seek(SeekFrom::Current(-offset(overshoot)))?;
                }
                warn!(
                    "record terminator located after an additional {} bytes",
                    bytes.len()
                );
                buffer.extend_from_slice(&bytes);
                self.stats.extended += 1;
                Ok(buffer)
            },
            ScanOutcome::Exhausted { scanned } => {
                error!("reading forward for record terminator, giving up after {scanned} bytes");
                Err(MarcError::framing(format!(
                    "no record terminator found in {scanned} bytes following a record of declared length {}",
                    buffer.len()
                )))
            },
        }
    }
}

/// Fill `buf` from `reader`, stopping early only at end of data.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {},
            Err(e) => return Err(MarcError::IoError(e)),
        }
    }
    Ok(filled)
}

fn offset(len: usize) -> i64 {
    // Frames are bounded by a 5-digit header plus one forward scan chunk.
    i64::try_from(len).unwrap_or(i64::MAX)
}
