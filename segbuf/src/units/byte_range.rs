// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Byte ranges in the absolute address space of a [`crate::Buffer`].
//!
//! A range is `{origin, len}`. Its [`ByteRange::end`] is `origin + len` (exclusive) and
//! its [`ByteRange::max`] is `end - 1` (inclusive), which is only meaningful when
//! `len > 0`. Positions are signed because a buffer's range can grow backwards past
//! zero (see [`crate::Buffer::ensure_range`]); consumers normally see ranges that
//! start at `0`.

use std::fmt::{Display, Formatter};

/// Absolute byte position inside a buffer's address space.
pub type BytePos = i64;

/// Contiguous run of bytes, `[origin, origin + len)`.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct ByteRange {
    pub origin: BytePos,
    pub len: usize,
}

#[must_use]
pub fn byte_range(origin: BytePos, len: usize) -> ByteRange { ByteRange::new(origin, len) }

impl ByteRange {
    #[must_use]
    pub fn new(origin: BytePos, len: usize) -> Self { Self { origin, len } }

    /// Range spanning `[start, end)`. An inverted pair yields an empty range at `start`.
    #[must_use]
    pub fn from_bounds(start: BytePos, end: BytePos) -> Self {
        Self {
            origin: start,
            len: span_len(start, end),
        }
    }

    /// Exclusive end position.
    #[must_use]
    pub fn end(&self) -> BytePos { self.origin + len_to_pos(self.len) }

    /// Inclusive last position, [`None`] for an empty range.
    #[must_use]
    pub fn max(&self) -> Option<BytePos> {
        if self.is_empty() {
            None
        } else {
            Some(self.end() - 1)
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.len == 0 }

    #[must_use]
    pub fn contains(&self, pos: BytePos) -> bool { pos >= self.origin && pos < self.end() }

    #[must_use]
    pub fn contains_range(&self, other: ByteRange) -> bool {
        other.origin >= self.origin && other.end() <= self.end()
    }

    /// Overlap of the two ranges, [`None`] when they do not overlap.
    #[must_use]
    pub fn intersect(&self, other: ByteRange) -> Option<ByteRange> {
        let start = self.origin.max(other.origin);
        let end = self.end().min(other.end());
        if start < end {
            Some(ByteRange::from_bounds(start, end))
        } else {
            None
        }
    }

    /// Smallest range covering both. An empty `self` is ignored.
    #[must_use]
    pub fn cover(&self, other: ByteRange) -> ByteRange {
        if self.is_empty() {
            return other;
        }
        ByteRange::from_bounds(
            self.origin.min(other.origin),
            self.end().max(other.end()),
        )
    }

    #[must_use]
    pub fn shift(&self, delta: BytePos) -> ByteRange {
        ByteRange::new(self.origin + delta, self.len)
    }

    /// Resolves the negative offset / negative length conventions against a range of
    /// `total` bytes that starts at `0`:
    ///
    /// - A negative `offset` counts from the end (`-1` is the last byte).
    /// - A negative `length` extends up to and including a position counted from the
    ///   end (`-1` means "through the last byte", `-2` "through the second to last").
    ///
    /// The result is clamped to `[0, total)`.
    ///
    /// ```
    /// use r3bl_segbuf::ByteRange;
    /// assert_eq!(ByteRange::resolve(-3, -1, 10), ByteRange::new(7, 3));
    /// assert_eq!(ByteRange::resolve(2, 100, 10), ByteRange::new(2, 8));
    /// ```
    #[must_use]
    pub fn resolve(offset: i64, length: i64, total: usize) -> ByteRange {
        let total = len_to_pos(total);
        let start = if offset < 0 {
            (total + offset).max(0)
        } else {
            offset.min(total)
        };
        let end = if length < 0 {
            total + 1 + length
        } else {
            start.saturating_add(length)
        };
        ByteRange::from_bounds(start, end.clamp(start, total))
    }
}

impl Display for ByteRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.origin, self.end())
    }
}

/// Converts a byte count to a signed position delta, saturating at [`i64::MAX`].
#[must_use]
pub fn len_to_pos(len: usize) -> BytePos { BytePos::try_from(len).unwrap_or(BytePos::MAX) }

/// Number of bytes in `[start, end)`, `0` if inverted.
#[must_use]
pub fn span_len(start: BytePos, end: BytePos) -> usize {
    if end <= start {
        0
    } else {
        usize::try_from(end - start).unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_eq2;
    use test_case::test_case;

    #[test]
    fn test_end_and_max() {
        let it = byte_range(5, 3);
        assert_eq2!(it.end(), 8);
        assert_eq2!(it.max(), Some(7));
        assert_eq2!(byte_range(5, 0).max(), None);
    }

    #[test]
    fn test_intersect_and_cover() {
        let a = byte_range(0, 10);
        let b = byte_range(5, 10);
        assert_eq2!(a.intersect(b), Some(byte_range(5, 5)));
        assert_eq2!(a.intersect(byte_range(10, 2)), None);
        assert_eq2!(a.cover(b), byte_range(0, 15));
        assert_eq2!(ByteRange::default().cover(b), b);
    }

    #[test]
    fn test_negative_origin() {
        let it = ByteRange::from_bounds(-4, 2);
        assert_eq2!(it.len, 6);
        assert!(it.contains(-4));
        assert!(!it.contains(2));
        assert_eq2!(ByteRange::from_bounds(3, 1).len, 0);
    }

    #[test_case(0, 10, 10, 0, 10)]
    #[test_case(2, 3, 10, 2, 3)]
    #[test_case(-1, 1, 10, 9, 1)]
    #[test_case(-3, -1, 10, 7, 3)]
    #[test_case(0, -2, 10, 0, 9)]
    #[test_case(8, 100, 10, 8, 2)]
    #[test_case(-100, 2, 10, 0, 2)]
    #[test_case(4, -9, 10, 4, 0)]
    fn test_resolve(offset: i64, length: i64, total: usize, origin: i64, len: usize) {
        assert_eq2!(ByteRange::resolve(offset, length, total), byte_range(origin, len));
    }
}
