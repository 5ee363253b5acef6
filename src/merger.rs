//! Folding of continuation records.
//!
//! Catalog records too large for one frame are written as consecutive frames
//! sharing one identifier. [`merge_continuations`] reads ahead after a record
//! and appends every following frame with the same identifier, stopping at
//! the first frame that differs, fails to decode, or does not exist. The
//! stream is then left at the first byte after the run.

use log::{debug, info};

use crate::directory::extract_identifier;
use crate::error::Result;
use crate::reader::{ByteSource, RawRecordReader, ReaderMark};
use crate::record::Record;

/// A sequence of raw frames that can be rewound to a saved point.
pub trait RecordSource {
    /// Saved position in the sequence.
    type Mark: Copy;

    /// The current position.
    ///
    /// # Errors
    ///
    /// Returns an error if the position cannot be determined.
    fn mark(&mut self) -> Result<Self::Mark>;

    /// Return to a position obtained from [`RecordSource::mark`].
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be repositioned.
    fn reset(&mut self, mark: Self::Mark) -> Result<()>;

    /// The next raw frame, or `None` at the end.
    ///
    /// # Errors
    ///
    /// Returns an error if the next frame is malformed or cannot be read.
    fn next_raw(&mut self) -> Result<Option<Vec<u8>>>;
}

impl<R: ByteSource> RecordSource for RawRecordReader<R> {
    type Mark = ReaderMark;

    fn mark(&mut self) -> Result<ReaderMark> {
        RawRecordReader::mark(self)
    }

    fn reset(&mut self, mark: ReaderMark) -> Result<()> {
        RawRecordReader::reset(self, mark)
    }

    fn next_raw(&mut self) -> Result<Option<Vec<u8>>> {
        self.read_raw()
    }
}

/// Append every directly following frame that shares `current`'s identifier.
///
/// Lookahead failures are not errors: the source is reset to the point just
/// after the last merged frame and `current` is returned as it stands.
///
/// # Errors
///
/// Returns an error if `current` has no identifier, or the source cannot be
/// reset after a lookahead.
pub fn merge_continuations<S: RecordSource>(source: &mut S, mut current: Record) -> Result<Record> {
    let id = current.identifier()?.to_owned();

    loop {
        let rewind_point = source.mark()?;
        match lookahead(source, &id) {
            Some(continuation) => {
                info!("identified additional marc record for {id}, appending it");
                current.append_raw(&continuation);
            },
            None => {
                source.reset(rewind_point)?;
                return Ok(current);
            },
        }
    }
}

/// The next frame, if it decodes and carries `id`.
fn lookahead<S: RecordSource>(source: &mut S, id: &str) -> Option<Vec<u8>> {
    let next = match source.next_raw() {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            debug!("lookahead after {id} stopped: {e}");
            return None;
        },
    };

    match extract_identifier(&next) {
        Ok(next_id) if next_id == id => Some(next),
        Ok(_) => None,
        Err(e) => {
            debug!("lookahead after {id} has no usable identifier: {e}");
            None
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MarcError;
    use crate::test_records::{marc_record, record_with_id};

    /// Frames held in memory; `None` entries fail to decode.
    struct FrameSource {
        frames: Vec<Option<Vec<u8>>>,
        pos: usize,
        resets: usize,
    }

    impl FrameSource {
        fn new(frames: Vec<Option<Vec<u8>>>) -> Self {
            FrameSource {
                frames,
                pos: 0,
                resets: 0,
            }
        }
    }

    impl RecordSource for FrameSource {
        type Mark = usize;

        fn mark(&mut self) -> Result<usize> {
            Ok(self.pos)
        }

        fn reset(&mut self, mark: usize) -> Result<()> {
            self.pos = mark;
            self.resets += 1;
            Ok(())
        }

        fn next_raw(&mut self) -> Result<Option<Vec<u8>>> {
            let Some(frame) = self.frames.get(self.pos) else {
                return Ok(None);
            };
            self.pos += 1;
            frame
                .clone()
                .map(Some)
                .ok_or_else(|| MarcError::framing("bad frame"))
        }
    }

    fn current(id: &str) -> Record {
        Record::new(record_with_id(id, "Head"), "unknown")
    }

    #[test]
    fn test_merges_run_of_same_identifier() {
        let head = current("u1");
        let tail1 = record_with_id("u1", "Tail one");
        let tail2 = record_with_id("u1", "Tail two");
        let other = record_with_id("u2", "Other");
        let expected_len = head.len() + tail1.len() + tail2.len();
        let mut source = FrameSource::new(vec![Some(tail1), Some(tail2), Some(other)]);

        let merged = merge_continuations(&mut source, head).unwrap();
        assert_eq!(merged.len(), expected_len);
        assert_eq!(merged.identifier().unwrap(), "u1");
        assert_eq!(source.pos, 2);
    }

    #[test]
    fn test_different_identifier_is_unread() {
        let head = current("u1");
        let expected = head.clone();
        let mut source = FrameSource::new(vec![Some(record_with_id("u2", "Other"))]);

        let merged = merge_continuations(&mut source, head).unwrap();
        assert_eq!(merged.raw(), expected.raw());
        assert_eq!(source.pos, 0);
        assert_eq!(source.resets, 1);
    }

    #[test]
    fn test_end_of_source_keeps_record() {
        let head = current("u1");
        let expected = head.raw().to_vec();
        let mut source = FrameSource::new(Vec::new());

        let merged = merge_continuations(&mut source, head).unwrap();
        assert_eq!(merged.raw(), expected.as_slice());
        assert_eq!(source.pos, 0);
    }

    #[test]
    fn test_bad_frame_restores_position() {
        let tail = record_with_id("u1", "Tail");
        let head = current("u1");
        let expected_len = head.len() + tail.len();
        let mut source = FrameSource::new(vec![Some(tail), None]);

        let merged = merge_continuations(&mut source, head).unwrap();
        assert_eq!(merged.len(), expected_len);
        assert_eq!(source.pos, 1);
    }

    #[test]
    fn test_lookahead_without_identifier_restores_position() {
        let head = current("u1");
        let mut source = FrameSource::new(vec![Some(marc_record(&[("245", "No id")]))]);

        let merged = merge_continuations(&mut source, head).unwrap();
        assert_eq!(merged.identifier().unwrap(), "u1");
        assert_eq!(source.pos, 0);
    }

    #[test]
    fn test_current_without_identifier_fails() {
        let head = Record::new(marc_record(&[("245", "No id")]), "unknown");
        let mut source = FrameSource::new(vec![Some(record_with_id("u1", "Tail"))]);
        assert!(merge_continuations(&mut source, head)
            .unwrap_err()
            .is_bad_framing());
    }
}
