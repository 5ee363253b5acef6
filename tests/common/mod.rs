//! Common test helpers shared across the test suite.

#![allow(dead_code)]

use std::io::Write;

use tempfile::NamedTempFile;

const FIELD_TERMINATOR: u8 = 0x1E;
const RECORD_TERMINATOR: u8 = 0x1D;

/// Builds a framed binary record from `(tag, value)` pairs.
pub fn build_record(fields: &[(&str, &str)]) -> Vec<u8> {
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

    let mut record = Vec::new();
    record.extend_from_slice(format!("{record_length:05}").as_bytes()); // 0-4
    record.extend_from_slice(b"nam a22"); // 5-11
    record.extend_from_slice(format!("{base_address:05}").as_bytes()); // 12-16
    record.extend_from_slice(b"   4500"); // 17-23
    record.extend_from_slice(&directory);
    record.extend_from_slice(&data);
    record.push(RECORD_TERMINATOR);
    record
}

/// A record with control number `id` and a title.
pub fn book(id: &str, title: &str) -> Vec<u8> {
    build_record(&[("001", id), ("008", "240101s2024    xxu"), ("245", title)])
}

/// Rewrites the 5-byte length header.
pub fn with_declared_length(mut record: Vec<u8>, length: usize) -> Vec<u8> {
    record[..5].copy_from_slice(format!("{length:05}").as_bytes());
    record
}

/// Writes the concatenated records to a temporary file.
pub fn write_file(records: &[Vec<u8>]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(&records.concat()).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}
