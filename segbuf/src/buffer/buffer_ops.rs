// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Whole buffer utilities: equality, append, byte search, and bulk output. Everything
//! here materializes the bytes it looks at.

use std::{io::Write, rc::Rc};

use strum_macros::{Display, EnumString};

use crate::{Buffer, BufferError, BufferResult, ByteRange, BytePos, ResidentSegment,
            Segment, Source, len_to_pos, span_len};

/// Scan direction for [`Buffer::find_byte`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

impl Buffer {
    /// Materializes everything and collects the resident segments, in order.
    fn resident_snapshot(&self) -> BufferResult<Vec<ResidentSegment>> {
        self.materialize(self.range())?;
        let mut acc = vec![];
        self.for_each_segment::<()>(BytePos::MIN, |_, segment| {
            if let Segment::Resident(it) = segment {
                acc.push(it.clone());
            }
            None
        });
        Ok(acc)
    }

    /// `true` if both buffers hold the same bytes. Where both sides reference the same
    /// memory block region the bytes are not compared.
    ///
    /// # Errors
    ///
    /// Returns an error if materializing either buffer fails.
    pub fn content_eq(&self, other: &Buffer) -> BufferResult<bool> {
        if self.len() != other.len() {
            return Ok(false);
        }
        if self.same_as(other) {
            return Ok(true);
        }
        let lhs = self.resident_snapshot()?;
        let rhs = other.resident_snapshot()?;

        let (mut lhs_index, mut lhs_skip) = (0, 0);
        let (mut rhs_index, mut rhs_skip) = (0, 0);
        while let (Some(left), Some(right)) = (lhs.get(lhs_index), rhs.get(rhs_index)) {
            let count = (left.len - lhs_skip).min(right.len - rhs_skip);
            let same_region = Rc::ptr_eq(&left.block, &right.block)
                && left.offset + lhs_skip == right.offset + rhs_skip;
            if !same_region {
                let equal = left.with_bytes(lhs_skip, |lhs_bytes| {
                    right.with_bytes(rhs_skip, |rhs_bytes| lhs_bytes[..count] == rhs_bytes[..count])
                });
                if !equal {
                    return Ok(false);
                }
            }
            lhs_skip += count;
            rhs_skip += count;
            if lhs_skip == left.len {
                lhs_index += 1;
                lhs_skip = 0;
            }
            if rhs_skip == right.len {
                rhs_index += 1;
                rhs_skip = 0;
            }
        }
        Ok(true)
    }

    /// `true` if the buffer holds exactly `bytes`.
    ///
    /// # Errors
    ///
    /// Returns an error if materializing fails.
    pub fn eq_bytes(&self, bytes: &[u8]) -> BufferResult<bool> {
        if self.len() != bytes.len() {
            return Ok(false);
        }
        let mut at = 0;
        for segment in self.resident_snapshot()? {
            let end = at + segment.len;
            if !segment.with_bytes(0, |it| it == &bytes[at..end]) {
                return Ok(false);
            }
            at = end;
        }
        Ok(true)
    }

    /// Appends the bytes of `other` after the end of the range, without copying them:
    /// a sparse segment bound to a view of `other` is linked in.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::RangeFixed`] if the range is fixed.
    pub fn append(&mut self, other: &Buffer) -> BufferResult<()> {
        let range = self.range();
        let appended = ByteRange::new(range.end(), other.len());
        if appended.is_empty() {
            return Ok(());
        }
        if self.is_fixed() {
            return Err(BufferError::RangeFixed {
                fixed: range,
                requested: range.cover(appended),
            });
        }

        // A buffer bound to a view of itself would never be released.
        let other = if self.same_as(other) {
            other.copy(other.range())?
        } else {
            other.handle()
        };
        let segment = Segment::sparse(Some(Rc::new(Source::view_of(&other))), other.range())?;
        self.push_segment(segment);

        tracing::debug!(message = "Appended", range = %appended);
        Ok(())
    }

    /// Position of the first byte equal to `value`, scanning from `from` (inclusive)
    /// in `direction` across segment boundaries. Sparse segments are materialized a
    /// chunk at a time as the scan reaches them.
    ///
    /// # Errors
    ///
    /// Returns an error if materializing fails.
    pub fn find_byte(&self, value: u8, from: BytePos, direction: Direction) -> BufferResult<Option<BytePos>> {
        let range = self.range();
        let mut pos = from;
        while range.contains(pos) {
            let Some(located) = self.locate(pos) else { break };
            if located.sparse {
                self.materialize(ByteRange::new(pos, 1))?;
                continue;
            }

            let skip = span_len(located.range.origin, pos);
            let found = self.with_located(located, |resident| {
                resident.with_bytes(0, |bytes| match direction {
                    Direction::Forward => bytes[skip..]
                        .iter()
                        .position(|&it| it == value)
                        .map(|it| it + skip),
                    Direction::Backward => bytes[..=skip].iter().rposition(|&it| it == value),
                })
            });
            if let Some(index) = found.flatten() {
                return Ok(Some(located.range.origin + len_to_pos(index)));
            }

            pos = match direction {
                Direction::Forward => located.range.end(),
                Direction::Backward => located.range.origin - 1,
            };
        }
        Ok(None)
    }

    /// Writes every byte to `sink`. Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns an error if materializing fails or `sink` fails.
    pub fn dump_to(&self, sink: &mut impl Write) -> BufferResult<usize> {
        let mut written = 0;
        for segment in self.resident_snapshot()? {
            segment.with_bytes(0, |it| sink.write_all(it))?;
            written += segment.len;
        }
        sink.flush()?;
        Ok(written)
    }

    /// Copies every byte into `dst`, which must be exactly as long as the buffer.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidCount`] if the lengths differ, or an error if
    /// materializing fails.
    pub fn copy_to_slice(&self, dst: &mut [u8]) -> BufferResult<()> {
        let range = self.range();
        if dst.len() != range.len {
            return Err(BufferError::InvalidCount {
                operation: "copy_to_slice",
                count: dst.len(),
            });
        }
        self.read_at(range.origin, dst)
    }

    /// # Errors
    ///
    /// Returns an error if materializing fails.
    pub fn to_vec(&self) -> BufferResult<Vec<u8>> {
        let mut acc = vec![0; self.len()];
        self.copy_to_slice(&mut acc)?;
        Ok(acc)
    }

    /// # Errors
    ///
    /// Returns an error if materializing fails.
    pub fn to_string_lossy(&self) -> BufferResult<String> {
        Ok(String::from_utf8_lossy(&self.to_vec()?).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BufferConfig, assert_eq2};
    use std::str::FromStr;
    use test_case::test_case;

    fn chunked(len: usize, chunk_size: usize) -> Buffer {
        let buffer = Buffer::with_config(BufferConfig::default().with_chunk_size(chunk_size));
        buffer.ensure_range(0, len_to_pos(len)).unwrap();
        buffer
    }

    #[test]
    fn test_content_eq_across_different_partitions() {
        let lhs = chunked(12, 4);
        lhs.write_at(0, b"hello ").unwrap();
        lhs.write_at(6, b"world!").unwrap();
        let rhs = Buffer::from_static(b"hello world!");
        assert!(lhs.segment_count() > 1);
        assert!(lhs.content_eq(&rhs).unwrap());
        assert!(rhs.content_eq(&lhs).unwrap());

        rhs.write_at(11, b"?").unwrap();
        assert!(!lhs.content_eq(&rhs).unwrap());
    }

    #[test]
    fn test_content_eq_with_view() {
        let buffer = Buffer::from_vec(b"abcdef".to_vec());
        let view = buffer.extract(buffer.range()).unwrap();
        assert!(view.content_eq(&buffer).unwrap());
        assert!(!view.content_eq(&Buffer::from_static(b"abc")).unwrap());
    }

    #[test]
    fn test_eq_bytes() {
        let buffer = Buffer::from_static(b"abc");
        assert!(buffer.eq_bytes(b"abc").unwrap());
        assert!(!buffer.eq_bytes(b"abd").unwrap());
        assert!(!buffer.eq_bytes(b"ab").unwrap());
    }

    #[test]
    fn test_append_is_zero_copy() {
        let mut buffer = Buffer::from_static(b"head-");
        let tail = Buffer::from_vec(b"tail".to_vec());
        buffer.append(&tail).unwrap();

        assert_eq2!(buffer.range(), ByteRange::new(0, 9));
        assert_eq2!(buffer.resident_len(), 5);
        assert_eq2!(buffer.to_string_lossy().unwrap(), "head-tail");
        assert!(buffer.validate());
    }

    #[test]
    fn test_append_to_itself() {
        let mut buffer = Buffer::from_static(b"ab");
        let same = buffer.handle();
        buffer.append(&same).unwrap();
        assert_eq2!(buffer.to_vec().unwrap(), b"abab".to_vec());
    }

    #[test]
    fn test_append_to_fixed_fails() {
        let mut buffer = Buffer::from_static(b"ab");
        buffer.fix_range();
        let it = buffer.append(&Buffer::from_static(b"cd"));
        assert!(matches!(it, Err(BufferError::RangeFixed { .. })));
    }

    #[test_case(b'c', 0, Direction::Forward => Some(2) ; "forward from start")]
    #[test_case(b'c', 3, Direction::Forward => Some(8) ; "forward skips earlier match")]
    #[test_case(b'c', 9, Direction::Backward => Some(8) ; "backward from end")]
    #[test_case(b'c', 7, Direction::Backward => Some(2) ; "backward across segments")]
    #[test_case(b'z', 0, Direction::Forward => None ; "missing")]
    fn test_find_byte(value: u8, from: BytePos, direction: Direction) -> Option<BytePos> {
        let buffer = chunked(10, 3);
        buffer.write_at(0, b"abcde").unwrap();
        buffer.write_at(5, b"fghcj").unwrap();
        assert_eq2!(buffer.segment_count(), 2);
        buffer.find_byte(value, from, direction).unwrap()
    }

    #[test]
    fn test_find_byte_materializes_lazily() {
        let buffer = Buffer::new_secure();
        buffer.ensure_range(0, 100_000).unwrap();
        assert_eq2!(buffer.find_byte(0, 50_000, Direction::Forward).unwrap(), Some(50_000));
        assert_eq2!(buffer.resident_len(), 4096);
    }

    #[test]
    fn test_direction_parse() {
        assert_eq2!(Direction::from_str("backward").unwrap(), Direction::Backward);
    }

    #[test]
    fn test_dump_to() {
        let mut buffer = Buffer::from_static(b"abc");
        buffer.append(&Buffer::from_static(b"def")).unwrap();
        let mut sink = vec![];
        assert_eq2!(buffer.dump_to(&mut sink).unwrap(), 6);
        assert_eq2!(sink, b"abcdef".to_vec());
    }

    #[test]
    fn test_copy_to_slice_length_mismatch() {
        let buffer = Buffer::from_static(b"abc");
        let mut dst = [0_u8; 2];
        let it = buffer.copy_to_slice(&mut dst);
        assert!(matches!(it, Err(BufferError::InvalidCount { .. })));
    }
}
