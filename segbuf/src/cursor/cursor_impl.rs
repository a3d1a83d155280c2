// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! [`Cursor`], the traversal handle that drives on demand materialization.
//!
//! A cursor tracks an absolute byte position, a sub byte bit offset (for bit I/O), and
//! a count of parsed lines. It also remembers the leaf it was last positioned on, so
//! that sequential access only needs a tree search when it crosses into a segment that
//! isn't adjacent, or when the tree changed underneath it (detected through the
//! [`crate::SegmentTree::generation`] counter).
//!
//! # Modes
//!
//! | Mode       | Created by             | Writes | Grows the range                     |
//! | :--------- | :--------------------- | :----- | :---------------------------------- |
//! | [`Read`]   | [`Buffer::reader`]     | No     | Only if a source is bound           |
//! | [`Mutate`] | [`Buffer::writer`]     | Yes    | Only if a source is bound           |
//! | [`Modify`] | [`Buffer::modifier`]   | Yes    | Yes                                 |
//!
//! No mode grows a buffer whose range is fixed. Writing cursors borrow the buffer
//! mutably, so there is never more than one of them, and never one alongside readers.

use std::marker::PhantomData;

use crate::{Buffer, BufferError, BufferResult, ByteRange, BytePos, LocatedSegment,
            len_to_pos, ok, span_len};

mod sealed {
    pub trait Sealed {}
}

/// Type level cursor mode. See the [module docs](self) for what each mode allows.
pub trait CursorMode: sealed::Sealed {
    /// `true` if the cursor may grow a buffer that has no bound source.
    const GROWS: bool;
    const NAME: &'static str;
}

/// Modes that can write.
pub trait Writable: CursorMode {}

/// Read only access.
#[derive(Debug, Clone, Copy, Default)]
pub struct Read;

/// Writes in place, never changes the structure of the range.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mutate;

/// Writes, growing the range as needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct Modify;

impl sealed::Sealed for Read {}
impl sealed::Sealed for Mutate {}
impl sealed::Sealed for Modify {}

impl CursorMode for Read {
    const GROWS: bool = false;
    const NAME: &'static str = "read";
}

impl CursorMode for Mutate {
    const GROWS: bool = false;
    const NAME: &'static str = "mutate";
}

impl CursorMode for Modify {
    const GROWS: bool = true;
    const NAME: &'static str = "modify";
}

impl Writable for Mutate {}
impl Writable for Modify {}

/// Where a cursor is relative to the buffer's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    BeforeFirst,
    OnSegment,
    AfterLast,
}

#[derive(Debug)]
pub struct Cursor<'a, M: CursorMode = Read> {
    pub(crate) buffer: &'a Buffer,
    pub(crate) position: BytePos,
    pub(crate) bit_offset: u8,
    pub(crate) lines: usize,
    located: Option<LocatedSegment>,
    _mode: PhantomData<M>,
}

impl Buffer {
    /// Read only cursor at the start of the range.
    #[must_use]
    pub fn reader(&self) -> Cursor<'_, Read> { Cursor::new(self) }

    /// Cursor that writes in place, at the start of the range.
    #[must_use]
    pub fn writer(&mut self) -> Cursor<'_, Mutate> { Cursor::new(self) }

    /// Cursor that writes and grows the range, at the start of the range.
    #[must_use]
    pub fn modifier(&mut self) -> Cursor<'_, Modify> { Cursor::new(self) }
}

impl<'a, M: CursorMode> Cursor<'a, M> {
    fn new(buffer: &'a Buffer) -> Self {
        Self {
            buffer,
            position: buffer.range().origin,
            bit_offset: 0,
            lines: 0,
            located: None,
            _mode: PhantomData,
        }
    }

    #[must_use]
    pub fn buffer(&self) -> &'a Buffer { self.buffer }

    #[must_use]
    pub fn mode(&self) -> &'static str { M::NAME }

    /// Absolute byte position.
    #[must_use]
    pub fn position(&self) -> BytePos { self.position }

    /// Bit position inside the current byte, `0..=7`.
    #[must_use]
    pub fn bit_offset(&self) -> u8 { self.bit_offset }

    #[must_use]
    pub fn is_aligned(&self) -> bool { self.bit_offset == 0 }

    /// Lines consumed by [`Cursor::parse_line`] so far.
    #[must_use]
    pub fn lines(&self) -> usize { self.lines }

    pub fn reset_lines(&mut self) { self.lines = 0; }

    #[must_use]
    pub fn state(&self) -> CursorState {
        let range = self.buffer.range();
        if self.position < range.origin {
            CursorState::BeforeFirst
        } else if self.position >= range.end() {
            CursorState::AfterLast
        } else {
            CursorState::OnSegment
        }
    }

    /// Bytes between the position and the end of the range.
    #[must_use]
    pub fn remaining(&self) -> usize { span_len(self.position, self.buffer.range().end()) }

    /// `true` if [`Cursor::prepare`] may grow the range.
    #[must_use]
    pub fn can_grow(&self) -> bool {
        !self.buffer.is_fixed() && (M::GROWS || self.buffer.has_source())
    }

    /// Moves to absolute `pos`, resetting the bit offset. Positions outside of the
    /// range are allowed, the next access will grow the range (if allowed) or fail.
    pub fn locate(&mut self, pos: BytePos) -> CursorState {
        self.position = pos;
        self.bit_offset = 0;
        self.located = None;
        self.current_segment();
        self.state()
    }

    /// [`Cursor::locate`] for use in a builder chain.
    #[must_use]
    pub fn at(mut self, pos: BytePos) -> Self {
        self.locate(pos);
        self
    }

    /// Moves by `delta` bytes. Crossing into an adjacent segment doesn't need a tree
    /// search.
    pub fn step(&mut self, delta: i64) -> CursorState {
        self.position += delta;
        self.current_segment();
        self.state()
    }

    /// Makes the `count` bytes at the position resident. If they aren't all inside the
    /// range, the range is grown first, when this cursor is allowed to grow it.
    ///
    /// # Errors
    ///
    /// - [`BufferError::InvalidCount`] if `count` is 0.
    /// - [`BufferError::OutOfRange`] if the bytes are outside of a range this cursor
    ///   can't grow.
    /// - [`BufferError::RangeFixed`] if a [`Modify`] cursor needs to grow a fixed range.
    /// - Any error from the sources involved in materialization.
    pub fn prepare(&mut self, count: usize) -> BufferResult<()> {
        if count == 0 {
            return Err(BufferError::InvalidCount {
                operation: "prepare",
                count,
            });
        }
        let wanted = ByteRange::new(self.position, count);
        let range = self.buffer.range();
        if !range.contains_range(wanted) {
            if !M::GROWS && !self.can_grow() {
                return Err(BufferError::OutOfRange {
                    requested: wanted,
                    available: range,
                });
            }
            self.buffer.ensure_range(wanted.origin, wanted.end())?;
        }
        self.buffer.materialize(wanted)?;
        // Materialization splits segments, find ours again.
        self.located = None;
        ok!()
    }

    /// The leaf at the position, reusing the remembered one (or its neighbor) while the
    /// tree hasn't changed.
    pub(crate) fn current_segment(&mut self) -> Option<LocatedSegment> {
        let generation = self.buffer.generation();
        if let Some(it) = self.located
            && it.generation == generation
        {
            if it.range.contains(self.position) {
                return Some(it);
            }
            let forward = self.position == it.range.end();
            let backward = self.position == it.range.origin - 1;
            if (forward || backward)
                && let Some(adjacent) = self.buffer.adjacent(it, forward)
            {
                self.located = Some(adjacent);
                return self.located;
            }
        }
        self.located = self.buffer.locate(self.position);
        self.located
    }

    /// The byte at the position, materializing (and growing, if allowed) as needed.
    /// Does not advance.
    pub(crate) fn current_byte(&mut self) -> BufferResult<u8> {
        if let Some(located) = self.current_segment()
            && let Some(byte) = self.buffer.byte_at(located, self.position)
        {
            return Ok(byte);
        }
        self.prepare(1)?;
        self.current_segment()
            .and_then(|located| self.buffer.byte_at(located, self.position))
            .ok_or_else(|| BufferError::OutOfRange {
                requested: ByteRange::new(self.position, 1),
                available: self.buffer.range(),
            })
    }

    /// The byte at the position, or [`None`] at the end of the range. Never grows.
    ///
    /// # Errors
    ///
    /// Returns an error if materializing fails.
    pub fn peek_u8(&mut self) -> BufferResult<Option<u8>> {
        if !self.buffer.range().contains(self.position) {
            return Ok(None);
        }
        self.current_byte().map(Some)
    }

    pub(crate) fn require_aligned(&self) -> BufferResult<()> {
        if self.bit_offset == 0 {
            ok!()
        } else {
            Err(BufferError::BitMisaligned {
                bit_offset: self.bit_offset,
            })
        }
    }

    /// Copies `dst.len()` bytes at the position into `dst` and advances.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::BitMisaligned`] in the middle of a byte, or see
    /// [`Cursor::prepare`].
    pub fn read_bytes(&mut self, dst: &mut [u8]) -> BufferResult<()> {
        self.require_aligned()?;
        if dst.is_empty() {
            return ok!();
        }
        self.prepare(dst.len())?;
        self.buffer.read_at(self.position, dst)?;
        self.position += len_to_pos(dst.len());
        ok!()
    }

    /// View of the bytes from `start` up to the position. No bytes are copied.
    ///
    /// # Errors
    ///
    /// See [`Buffer::extract`].
    pub fn extract_since(&self, start: BytePos) -> BufferResult<Buffer> {
        self.buffer.extract(ByteRange::from_bounds(start, self.position))
    }
}

impl<M: Writable> Cursor<'_, M> {
    /// Copies `src` into the buffer at the position and advances.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::BitMisaligned`] in the middle of a byte, or see
    /// [`Cursor::prepare`].
    pub fn write_bytes(&mut self, src: &[u8]) -> BufferResult<()> {
        self.require_aligned()?;
        if src.is_empty() {
            return ok!();
        }
        self.prepare(src.len())?;
        self.buffer.write_at(self.position, src)?;
        self.position += len_to_pos(src.len());
        ok!()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Source, assert_eq2};

    #[test]
    fn test_modify_grows_empty_buffer() {
        let mut buffer = Buffer::new();
        let mut cursor = buffer.modifier();
        cursor.write_bytes(b"Hello").unwrap();
        assert_eq2!(cursor.position(), 5);
        assert_eq2!(cursor.state(), CursorState::AfterLast);
        assert_eq2!(buffer.to_vec().unwrap(), b"Hello".to_vec());
    }

    #[test]
    fn test_mutate_does_not_grow() {
        let mut buffer = Buffer::from_vec(b"abc".to_vec());
        let mut cursor = buffer.writer();
        cursor.locate(2);
        let it = cursor.write_bytes(b"XY");
        assert!(matches!(it, Err(BufferError::OutOfRange { .. })));
        cursor.write_bytes(b"Z").unwrap();
        assert_eq2!(buffer.to_vec().unwrap(), b"abZ".to_vec());
    }

    #[test]
    fn test_modify_respects_fixed_range() {
        let mut buffer = Buffer::from_vec(b"abc".to_vec());
        buffer.fix_range();
        let mut cursor = buffer.modifier().at(3);
        let it = cursor.write_bytes(b"d");
        assert!(matches!(it, Err(BufferError::RangeFixed { .. })));
        assert!(it.is_err_and(|it| it.is_precondition()));
    }

    #[test]
    fn test_reader_grows_source_backed_buffer() {
        let buffer = Buffer::from_source(Source::from_fn(|dest, offset| {
            dest.fill(u8::try_from(offset % 7).unwrap_or_default());
            Ok(())
        }), 0);
        assert!(buffer.is_empty());
        let mut cursor = buffer.reader().at(10);
        let mut dst = [0_u8; 1];
        cursor.read_bytes(&mut dst).unwrap();
        assert_eq2!(dst, [3]);
        assert_eq2!(buffer.range(), ByteRange::new(10, 1));
    }

    #[test]
    fn test_reader_does_not_grow_plain_buffer() {
        let buffer = Buffer::from_static(b"abc");
        let mut cursor = buffer.reader().at(1);
        let mut dst = [0_u8; 4];
        assert!(cursor.read_bytes(&mut dst).is_err());
        assert_eq2!(cursor.position(), 1);
    }

    #[test]
    fn test_states_and_step() {
        let mut buffer = Buffer::from_static(b"abc");
        buffer.append(&Buffer::from_static(b"def")).unwrap();
        let mut cursor = buffer.reader();
        assert_eq2!(cursor.state(), CursorState::OnSegment);
        assert_eq2!(cursor.step(-1), CursorState::BeforeFirst);
        assert_eq2!(cursor.step(4), CursorState::OnSegment);
        assert_eq2!(cursor.peek_u8().unwrap(), Some(b'd'));
        assert_eq2!(cursor.step(-2), CursorState::OnSegment);
        assert_eq2!(cursor.peek_u8().unwrap(), Some(b'b'));
        assert_eq2!(cursor.step(5), CursorState::AfterLast);
        assert_eq2!(cursor.peek_u8().unwrap(), None);
        assert_eq2!(cursor.remaining(), 0);
    }

    #[test]
    fn test_prepare_zero_is_invalid() {
        let buffer = Buffer::from_static(b"abc");
        let it = buffer.reader().prepare(0);
        assert!(matches!(it, Err(BufferError::InvalidCount { .. })));
    }

    #[test]
    fn test_read_across_segments() {
        let mut buffer = Buffer::from_static(b"ab");
        buffer.append(&Buffer::from_static(b"cd")).unwrap();
        buffer.append(&Buffer::from_static(b"ef")).unwrap();
        let mut cursor = buffer.reader().at(1);
        let mut dst = [0_u8; 4];
        cursor.read_bytes(&mut dst).unwrap();
        assert_eq2!(&dst, b"bcde");
        assert_eq2!(cursor.position(), 5);
    }

    #[test]
    fn test_extract_since() {
        let buffer = Buffer::from_static(b"key=value");
        let mut cursor = buffer.reader();
        cursor.step(3);
        let key = cursor.extract_since(0).unwrap();
        assert_eq2!(key.to_vec().unwrap(), b"key".to_vec());
    }
}
