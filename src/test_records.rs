//! Builders for well-formed binary records used by unit tests.

use std::cell::Cell;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::rc::Rc;

use crate::{FIELD_TERMINATOR, RECORD_TERMINATOR};

/// Build a framed record holding the given control/data fields in order.
pub fn marc_record(fields: &[(&str, &str)]) -> Vec<u8> {
    let mut directory = Vec::new();
    let mut data = Vec::new();

    for (tag, value) in fields {
        let length = value.len() + 1;
        directory.extend_from_slice(format!("{tag}{length:04}{:05}", data.len()).as_bytes());
        data.extend_from_slice(value.as_bytes());
        data.push(FIELD_TERMINATOR);
    }
    directory.push(FIELD_TERMINATOR);

    let base_address = 24 + directory.len();
    let record_length = base_address + data.len() + 1;

    let mut record = Vec::with_capacity(record_length);
    record.extend_from_slice(format!("{record_length:05}nam a22{base_address:05}   4500").as_bytes());
    record.extend_from_slice(&directory);
    record.extend_from_slice(&data);
    record.push(RECORD_TERMINATOR);
    record
}

/// Build a record whose identifier lives in tag 001.
pub fn record_with_id(id: &str, title: &str) -> Vec<u8> {
    marc_record(&[("001", id), ("245", title)])
}

/// Overwrite the 5-byte length header of a framed record.
pub fn set_declared_length(record: &mut [u8], length: usize) {
    record[..5].copy_from_slice(format!("{length:05}").as_bytes());
}

/// In-memory byte source whose reads fail once they reach `fail_at`.
///
/// Also records the furthest offset any read has reached.
pub struct FailingSource {
    inner: Cursor<Vec<u8>>,
    fail_at: u64,
    furthest: Rc<Cell<u64>>,
}

impl FailingSource {
    pub fn new(bytes: Vec<u8>, fail_at: u64) -> Self {
        FailingSource {
            inner: Cursor::new(bytes),
            fail_at,
            furthest: Rc::new(Cell::new(0)),
        }
    }

    /// Never fails; only tracks how far reads got.
    pub fn tracking(bytes: Vec<u8>) -> Self {
        Self::new(bytes, u64::MAX)
    }

    /// Shared handle to the furthest offset read so far.
    pub fn furthest(&self) -> Rc<Cell<u64>> {
        Rc::clone(&self.furthest)
    }
}

impl Read for FailingSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let position = self.inner.position();
        if position >= self.fail_at {
            return Err(io::Error::new(io::ErrorKind::Other, "device failure"));
        }
        let room = usize::try_from(self.fail_at - position).unwrap_or(usize::MAX);
        let len = buf.len().min(room);
        let n = self.inner.read(&mut buf[..len])?;
        self.furthest.set(self.furthest.get().max(self.inner.position()));
        Ok(n)
    }
}

impl Seek for FailingSource {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}
