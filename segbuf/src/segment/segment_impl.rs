// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The unit of content in a [`crate::SegmentTree`].
//!
//! A [`Segment`] is either [`SparseSegment`] (described but not loaded, its bytes come
//! from a bound [`crate::Source`] on demand) or [`ResidentSegment`] (its bytes live in
//! a [`crate::MemoryBlock`] at a given offset). A segment never has zero length once it
//! is in a tree.

use std::rc::Rc;

use crate::{BufferResult, ByteRange, BytePos, MemoryBlock, SharedBlock, SharedSource,
            len_to_pos};

#[derive(Debug, Clone)]
pub struct SparseSegment {
    /// [`None`] means the bytes are zeros.
    pub source: Option<SharedSource>,
    /// Source offset of the first byte.
    pub source_offset: BytePos,
    pub len: usize,
}

#[derive(Debug, Clone)]
pub struct ResidentSegment {
    pub block: SharedBlock,
    /// Offset of the first byte inside `block`.
    pub offset: usize,
    pub len: usize,
    /// The block belongs to a source's cache. It is copied before the first write.
    pub borrowed: bool,
}

#[derive(Debug, Clone)]
pub enum Segment {
    Sparse(SparseSegment),
    Resident(ResidentSegment),
}

impl SparseSegment {
    /// The source offsets this segment describes.
    #[must_use]
    pub fn source_range(&self) -> ByteRange { ByteRange::new(self.source_offset, self.len) }

    /// `true` if this segment is bound to exactly `source`.
    #[must_use]
    pub fn is_bound_to(&self, source: Option<&SharedSource>) -> bool {
        match (&self.source, source) {
            (None, None) => true,
            (Some(lhs), Some(rhs)) => Rc::ptr_eq(lhs, rhs),
            _ => false,
        }
    }
}

impl ResidentSegment {
    #[must_use]
    pub fn new(block: SharedBlock, offset: usize, len: usize) -> Self {
        Self {
            block,
            offset,
            len,
            borrowed: false,
        }
    }

    /// Marks the bytes as owned by a source's cache.
    #[must_use]
    pub fn into_borrowed(mut self) -> Self {
        self.borrowed = true;
        self
    }

    /// Runs `f` over the bytes of this segment starting `skip` bytes in.
    pub fn with_bytes<R>(&self, skip: usize, f: impl FnOnce(&[u8]) -> R) -> R {
        self.block.with_bytes(self.offset + skip, self.len - skip, f)
    }

    /// Replaces the block with a private copy of the bytes this segment references.
    pub fn decouple(&mut self) {
        self.block = self.block.copy_of(self.offset, self.len);
        self.offset = 0;
        self.borrowed = false;
    }
}

impl Segment {
    /// Sparse segment bound to `source` covering `source_range`.
    ///
    /// # Errors
    ///
    /// Returns an error if `source_range` is outside of the source's limit, or the
    /// source's cache can't be extended to cover it.
    pub fn sparse(source: Option<SharedSource>, source_range: ByteRange) -> BufferResult<Self> {
        if let Some(source) = &source {
            source.admit(source_range)?;
        }
        Ok(Self::Sparse(SparseSegment {
            source,
            source_offset: source_range.origin,
            len: source_range.len,
        }))
    }

    #[must_use]
    pub fn resident(block: SharedBlock, offset: usize, len: usize) -> Self {
        Self::Resident(ResidentSegment::new(block, offset, len))
    }

    /// Resident segment over the whole of `block`.
    #[must_use]
    pub fn whole(block: SharedBlock) -> Self {
        let len = block.len();
        Self::resident(block, 0, len)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Sparse(it) => it.len,
            Self::Resident(it) => it.len,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    #[must_use]
    pub fn is_sparse(&self) -> bool { matches!(self, Self::Sparse(_)) }

    #[must_use]
    pub fn is_resident(&self) -> bool { matches!(self, Self::Resident(_)) }

    #[must_use]
    pub fn as_resident(&self) -> Option<&ResidentSegment> {
        match self {
            Self::Resident(it) => Some(it),
            Self::Sparse(_) => None,
        }
    }

    #[must_use]
    pub fn as_sparse(&self) -> Option<&SparseSegment> {
        match self {
            Self::Sparse(it) => Some(it),
            Self::Resident(_) => None,
        }
    }

    /// Shrinks `self` to its first `at` bytes and returns the rest. A resident tail
    /// shares the block with `self`.
    ///
    /// # Panics
    ///
    /// Panics if `at` is not strictly inside the segment.
    pub fn split_off(&mut self, at: usize) -> Segment {
        assert!(at > 0 && at < self.len(), "Split point must be inside the segment");
        match self {
            Self::Sparse(it) => {
                let tail = SparseSegment {
                    source: it.source.clone(),
                    source_offset: it.source_offset + len_to_pos(at),
                    len: it.len - at,
                };
                it.len = at;
                Self::Sparse(tail)
            }
            Self::Resident(it) => {
                let tail = ResidentSegment {
                    block: Rc::clone(&it.block),
                    offset: it.offset + at,
                    len: it.len - at,
                    borrowed: it.borrowed,
                };
                it.len = at;
                Self::Resident(tail)
            }
        }
    }

    /// Grows a sparse segment by `by` bytes at its front, if it is bound to `source`.
    /// Returns `false` (and leaves `self` untouched) if the segment is resident or bound
    /// to some other source.
    ///
    /// # Errors
    ///
    /// Returns an error if the grown part is outside of the source's limit.
    pub fn enlarge_front(&mut self, source: Option<&SharedSource>, by: usize) -> BufferResult<bool> {
        let Self::Sparse(it) = self else { return Ok(false) };
        if !it.is_bound_to(source) {
            return Ok(false);
        }
        let grown = ByteRange::new(it.source_offset - len_to_pos(by), by);
        if let Some(source) = source {
            source.admit(grown)?;
        }
        it.source_offset = grown.origin;
        it.len += by;
        Ok(true)
    }

    /// Grows a sparse segment by `by` bytes at its back. Same rules as
    /// [`Segment::enlarge_front`].
    ///
    /// # Errors
    ///
    /// Returns an error if the grown part is outside of the source's limit.
    pub fn enlarge_back(&mut self, source: Option<&SharedSource>, by: usize) -> BufferResult<bool> {
        let Self::Sparse(it) = self else { return Ok(false) };
        if !it.is_bound_to(source) {
            return Ok(false);
        }
        let grown = ByteRange::new(it.source_range().end(), by);
        if let Some(source) = source {
            source.admit(grown)?;
        }
        it.len += by;
        Ok(true)
    }

    /// `true` if this segment's bytes are visible through anything else: its block is
    /// shared, read only, or owned by a source's cache.
    #[must_use]
    pub fn needs_decouple(&self) -> bool {
        match self {
            Self::Resident(it) => it.borrowed || !MemoryBlock::is_exclusive(&it.block),
            Self::Sparse(_) => false,
        }
    }

    /// `true` if writing to this segment requires a private copy first. Blocks that are
    /// merely shared with views are written in place.
    #[must_use]
    pub fn needs_copy_on_write(&self) -> bool {
        match self {
            Self::Resident(it) => it.borrowed || it.block.is_read_only(),
            Self::Sparse(_) => false,
        }
    }
}
