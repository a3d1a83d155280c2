// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! [`Buffer`], the addressable range.
//!
//! A buffer owns a [`SegmentTree`] whose leaves exactly partition its logical range,
//! an optional bound [`Source`] (plus a constant offset into it), a fixed range flag,
//! and per buffer settings.
//!
//! Positions are absolute: position `p` of a buffer maps to relative offset
//! `p - range.origin` in its tree, and (for a sparse segment that was created by range
//! growth) to source offset `p + source_offset`.
//!
//! # Handles
//!
//! All state lives in a reference counted core. A [`Source::view_of`] another buffer
//! holds a second handle to the same core, which is how an extraction keeps the buffer
//! it is a view of alive, and how its materialization reaches into that buffer's
//! memory blocks without copying them.
//!
//! # Growth
//!
//! [`Buffer::ensure_range`] is the only way the range grows. Cursors call it when they
//! are allowed to (see [`crate::Cursor`]). Once [`Buffer::fix_range`] is called, growth
//! is rejected with [`BufferError::RangeFixed`].

use std::{cell::{Cell, RefCell},
          fmt::{Debug, Formatter},
          path::Path,
          rc::Rc};

use smallvec::smallvec;

use crate::{BufferConfig, BufferError, BufferResult, ByteRange, BytePos, Endianness,
            FetchedPieces, MemoryBlock, Newline, NodeId, ResidentSegment, Segment,
            SegmentTree, SharedBlock, SharedSource, Source, SparseSegment, len_to_pos,
            span_len};

pub struct Buffer {
    core: Rc<BufferCore>,
}

struct BufferCore {
    state: RefCell<BufferState>,
    endianness: Cell<Endianness>,
    newline: Cell<Newline>,
    chunk_size: usize,
    secure: bool,
}

struct BufferState {
    tree: SegmentTree,
    range: ByteRange,
    source: Option<SharedSource>,
    source_offset: BytePos,
    fixed: bool,
}

/// A leaf of a buffer's tree, with the absolute range it covers. Only valid while
/// `generation` matches [`Buffer::generation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LocatedSegment {
    pub leaf: NodeId,
    pub range: ByteRange,
    pub sparse: bool,
    pub generation: u64,
}

impl Default for Buffer {
    fn default() -> Self { Self::new() }
}

// Constructors.
impl Buffer {
    /// Empty buffer with the default [`BufferConfig`]. Bytes that are written into
    /// with a [`crate::Modify`] cursor are allocated on demand.
    #[must_use]
    pub fn new() -> Self { Self::with_config(BufferConfig::default()) }

    /// Empty buffer whose bytes are always zero until written, and whose memory is wiped
    /// when released. Binds an implicit zero fill [`Source`].
    #[must_use]
    pub fn new_secure() -> Self { Self::with_config(BufferConfig::default().with_secure(true)) }

    #[must_use]
    pub fn with_config(config: BufferConfig) -> Self {
        let source = config.secure.then(|| Rc::new(Source::zero_fill()));
        Self::from_parts(config, source, 0)
    }

    /// Empty buffer bound to `source`. Position `p` maps to source offset
    /// `p + source_offset`. The range is not fixed, so cursors may grow it.
    #[must_use]
    pub fn from_source(source: impl Into<SharedSource>, source_offset: BytePos) -> Self {
        Self::from_parts(BufferConfig::default(), Some(source.into()), source_offset)
    }

    /// Fixed range buffer covering the whole file at `path`. Nothing is read until a
    /// cursor touches the bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be opened.
    pub fn from_file(path: impl AsRef<Path>) -> BufferResult<Self> {
        let source = Source::from_file(path)?;
        let limit = source.limit().unwrap_or_default();
        let buffer = Self::from_source(source, 0);
        buffer.ensure_range(limit.origin, limit.end())?;
        buffer.fix_range();
        Ok(buffer)
    }

    /// Wraps constant data without copying it. Writes decouple first.
    #[must_use]
    pub fn from_static(bytes: &'static [u8]) -> Self {
        Self::from_block(MemoryBlock::from_static(bytes))
    }

    /// Wraps mutable caller data without copying it.
    #[must_use]
    pub fn from_vec(bytes: Vec<u8>) -> Self { Self::from_block(MemoryBlock::from_vec(bytes)) }

    /// Like [`Buffer::from_vec`], and `on_release` gets the bytes back once nothing
    /// references them anymore.
    #[must_use]
    pub fn from_vec_with_release(bytes: Vec<u8>, on_release: impl FnOnce(Vec<u8>) + 'static) -> Self {
        Self::from_block(MemoryBlock::from_vec_with_release(bytes, on_release))
    }

    fn from_block(block: SharedBlock) -> Self {
        let buffer = Self::new();
        if !block.is_empty() {
            let mut state = buffer.core.state.borrow_mut();
            state.range = ByteRange::new(0, block.len());
            state.tree.push_last(Segment::whole(block));
        }
        buffer
    }

    fn from_parts(config: BufferConfig, source: Option<SharedSource>, source_offset: BytePos) -> Self {
        Self {
            core: Rc::new(BufferCore {
                state: RefCell::new(BufferState {
                    tree: SegmentTree::new(),
                    range: ByteRange::default(),
                    source,
                    source_offset,
                    fixed: false,
                }),
                endianness: Cell::new(config.endianness),
                newline: Cell::new(config.newline),
                chunk_size: config.chunk_size(),
                secure: config.secure,
            }),
        }
    }

    /// Settings of this buffer, for creating related buffers.
    #[must_use]
    pub fn config(&self) -> BufferConfig {
        BufferConfig::default()
            .with_chunk_size(self.core.chunk_size)
            .with_endianness(self.endianness())
            .with_newline(self.newline())
            .with_secure(self.core.secure)
    }

    /// View of the bytes at `range` of this buffer, re-indexed to start at 0, with a
    /// fixed range. No bytes are copied: once materialized, the view references this
    /// buffer's memory blocks.
    ///
    /// # Errors
    ///
    /// Returns an error if this buffer's range is fixed and doesn't cover `range`.
    pub fn extract(&self, range: ByteRange) -> BufferResult<Self> {
        let view = Self::from_parts(self.config(), Some(Rc::new(Source::view_of(self))), range.origin);
        view.ensure_range(0, len_to_pos(range.len))?;
        view.fix_range();
        Ok(view)
    }

    /// [`Buffer::extract`] using the negative offset and length conventions of
    /// [`ByteRange::resolve`] relative to this buffer's range.
    ///
    /// # Errors
    ///
    /// See [`Buffer::extract`].
    pub fn extract_resolved(&self, offset: i64, length: i64) -> BufferResult<Self> {
        let range = self.range();
        self.extract(ByteRange::resolve(offset, length, range.len).shift(range.origin))
    }

    /// Exact, independent copy of the bytes at `range`. The copy shares no memory
    /// with this buffer.
    ///
    /// # Errors
    ///
    /// See [`Buffer::extract`].
    pub fn copy(&self, range: ByteRange) -> BufferResult<Self> {
        let copy = self.extract(range)?;
        copy.decouple()?;
        Ok(copy)
    }

    /// Second handle to the same buffer state.
    pub(crate) fn handle(&self) -> Self {
        Self {
            core: Rc::clone(&self.core),
        }
    }

    /// `true` if both handles refer to the same buffer state.
    #[must_use]
    pub fn same_as(&self, other: &Buffer) -> bool { Rc::ptr_eq(&self.core, &other.core) }
}

// Range and settings.
impl Buffer {
    #[must_use]
    pub fn range(&self) -> ByteRange { self.core.state.borrow().range }

    #[must_use]
    pub fn len(&self) -> usize { self.range().len }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.range().is_empty() }

    #[must_use]
    pub fn is_fixed(&self) -> bool { self.core.state.borrow().fixed }

    #[must_use]
    pub fn is_secure(&self) -> bool { self.core.secure }

    #[must_use]
    pub fn chunk_size(&self) -> usize { self.core.chunk_size }

    /// `true` if a source is bound, which lets read and mutate cursors grow the range.
    #[must_use]
    pub fn has_source(&self) -> bool { self.core.state.borrow().source.is_some() }

    #[must_use]
    pub fn source(&self) -> Option<SharedSource> { self.core.state.borrow().source.clone() }

    #[must_use]
    pub fn source_offset(&self) -> BytePos { self.core.state.borrow().source_offset }

    #[must_use]
    pub fn endianness(&self) -> Endianness { self.core.endianness.get() }

    pub fn set_endianness(&mut self, endianness: Endianness) { self.core.endianness.set(endianness); }

    #[must_use]
    pub fn newline(&self) -> Newline { self.core.newline.get() }

    pub fn set_newline(&mut self, newline: Newline) { self.core.newline.set(newline); }

    /// Freezes the range. Further growth is rejected.
    pub fn fix_range(&self) { self.core.state.borrow_mut().fixed = true; }

    /// Grows the range so it covers `[start, end)`.
    ///
    /// An empty buffer gets one sparse segment covering the whole new range. Otherwise
    /// a leading (trailing) sparse segment bound to this buffer's source is enlarged in
    /// place, or a new sparse segment is prepended (appended). Calling this again with
    /// the same bounds does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::RangeFixed`] if growth is needed and the range is fixed,
    /// or a source error if the new bytes are outside of the source's limit.
    pub fn ensure_range(&self, start: BytePos, end: BytePos) -> BufferResult<()> {
        if end <= start {
            return Ok(());
        }
        let requested = ByteRange::from_bounds(start, end);
        let mut state = self.core.state.borrow_mut();
        let current = state.range;

        if !state.tree.is_empty() && current.contains_range(requested) {
            return Ok(());
        }
        if state.fixed {
            return Err(BufferError::RangeFixed {
                fixed: current,
                requested,
            });
        }

        let source = state.source.clone();
        let offset = state.source_offset;

        if state.tree.is_empty() {
            let segment = Segment::sparse(source, requested.shift(offset))?;
            state.tree.push_last(segment);
            state.range = requested;
            tracing::debug!(message = "Installed range", range = %requested);
            return Ok(());
        }

        if start < current.origin {
            let grown = ByteRange::from_bounds(start, current.origin);
            state.grow_front(source.as_ref(), grown)?;
        }
        if end > current.end() {
            let grown = ByteRange::from_bounds(current.end(), end);
            state.grow_back(source.as_ref(), grown)?;
        }
        tracing::debug!(
            message = "Grew range",
            from = %current,
            to = %state.range
        );
        Ok(())
    }
}

impl BufferState {
    fn grow_front(&mut self, source: Option<&SharedSource>, grown: ByteRange) -> BufferResult<()> {
        let enlarged = match self.tree.first_leaf() {
            Some(first) => self
                .tree
                .modify_segment(first, |it| it.enlarge_front(source, grown.len))
                .transpose()?
                .unwrap_or(false),
            None => false,
        };
        if !enlarged {
            let segment = Segment::sparse(source.cloned(), grown.shift(self.source_offset))?;
            self.tree.push_first(segment);
        }
        self.range = ByteRange::from_bounds(grown.origin, self.range.end());
        Ok(())
    }

    fn grow_back(&mut self, source: Option<&SharedSource>, grown: ByteRange) -> BufferResult<()> {
        let enlarged = match self.tree.last_leaf() {
            Some(last) => self
                .tree
                .modify_segment(last, |it| it.enlarge_back(source, grown.len))
                .transpose()?
                .unwrap_or(false),
            None => false,
        };
        if !enlarged {
            let segment = Segment::sparse(source.cloned(), grown.shift(self.source_offset))?;
            self.tree.push_last(segment);
        }
        self.range = ByteRange::from_bounds(self.range.origin, grown.end());
        Ok(())
    }

    fn relative(&self, pos: BytePos) -> Option<usize> {
        self.range.contains(pos).then(|| span_len(self.range.origin, pos))
    }

    fn locate(&self, pos: BytePos) -> Option<LocatedSegment> {
        let found = self.tree.find(self.relative(pos)?)?;
        let segment = self.tree.segment(found.leaf)?;
        Some(LocatedSegment {
            leaf: found.leaf,
            range: ByteRange::new(self.range.origin + len_to_pos(found.base), found.len),
            sparse: segment.is_sparse(),
            generation: self.tree.generation(),
        })
    }

    /// Replaces the sparse segment in `leaf` with resident `pieces`, unless the leaf
    /// changed while the pieces were being fetched.
    fn install(&mut self, leaf: NodeId, expected_len: usize, pieces: FetchedPieces) {
        let unchanged = self
            .tree
            .segment(leaf)
            .is_some_and(|it| it.is_sparse() && it.len() == expected_len);
        if !unchanged {
            return;
        }
        let mut pieces = pieces.into_iter().filter(|it| it.len > 0);
        let Some(first) = pieces.next() else { return };
        self.tree.replace_segment(leaf, Segment::Resident(first));
        let mut anchor = leaf;
        for piece in pieces {
            anchor = self.tree.insert_after(anchor, Segment::Resident(piece));
        }
    }
}

// Tree access for cursors and whole buffer operations.
impl Buffer {
    pub(crate) fn generation(&self) -> u64 { self.core.state.borrow().tree.generation() }

    /// The leaf containing absolute position `pos`.
    pub(crate) fn locate(&self, pos: BytePos) -> Option<LocatedSegment> { self.core.state.borrow().locate(pos) }

    /// The leaf right after (`forward`) or before `located`, without a tree search.
    pub(crate) fn adjacent(&self, located: LocatedSegment, forward: bool) -> Option<LocatedSegment> {
        let state = self.core.state.borrow();
        if located.generation != state.tree.generation() {
            return None;
        }
        let leaf = if forward {
            state.tree.next_leaf(located.leaf)?
        } else {
            state.tree.prev_leaf(located.leaf)?
        };
        let segment = state.tree.segment(leaf)?;
        let origin = if forward {
            located.range.end()
        } else {
            located.range.origin - len_to_pos(segment.len())
        };
        Some(LocatedSegment {
            leaf,
            range: ByteRange::new(origin, segment.len()),
            sparse: segment.is_sparse(),
            generation: located.generation,
        })
    }

    /// Byte at `pos` inside a resident `located` segment. [`None`] if the segment is
    /// sparse or `located` is stale.
    pub(crate) fn byte_at(&self, located: LocatedSegment, pos: BytePos) -> Option<u8> {
        let state = self.core.state.borrow();
        if located.generation != state.tree.generation() || !located.range.contains(pos) {
            return None;
        }
        let resident = state.tree.segment(located.leaf)?.as_resident()?;
        let skip = span_len(located.range.origin, pos);
        Some(resident.with_bytes(skip, |it| it[0]))
    }

    /// Runs `f` over `located` if it is still current and resident.
    pub(crate) fn with_located<R>(
        &self,
        located: LocatedSegment,
        f: impl FnOnce(&ResidentSegment) -> R,
    ) -> Option<R> {
        let state = self.core.state.borrow();
        if located.generation != state.tree.generation() {
            return None;
        }
        state.tree.segment(located.leaf)?.as_resident().map(f)
    }

    /// Adds `segment` after the end of the range.
    pub(crate) fn push_segment(&mut self, segment: Segment) {
        let mut state = self.core.state.borrow_mut();
        state.range.len += segment.len();
        state.tree.push_last(segment);
    }

    /// Runs `f` over the segments in the tree, in address order, with the absolute range
    /// of each, starting with the segment that contains `from`. Stops as soon as `f`
    /// returns [`Some`].
    pub(crate) fn for_each_segment<R>(
        &self,
        from: BytePos,
        mut f: impl FnMut(ByteRange, &Segment) -> Option<R>,
    ) -> Option<R> {
        let state = self.core.state.borrow();
        let origin = state.range.origin;
        for (_, base, segment) in state.tree.iter_from(span_len(origin, from)) {
            let range = ByteRange::new(origin + len_to_pos(base), segment.len());
            if let Some(result) = f(range, segment) {
                return Some(result);
            }
        }
        None
    }

    /// Snapshot of all segments with their absolute ranges, in address order.
    #[must_use]
    pub fn segments(&self) -> Vec<(ByteRange, Segment)> {
        let mut acc = vec![];
        self.for_each_segment::<()>(BytePos::MIN, |range, segment| {
            acc.push((range, segment.clone()));
            None
        });
        acc
    }

    #[must_use]
    pub fn segment_count(&self) -> usize { self.core.state.borrow().tree.leaf_count() }

    /// Number of bytes that are backed by memory.
    #[must_use]
    pub fn resident_len(&self) -> usize {
        let mut acc = 0;
        self.for_each_segment::<()>(BytePos::MIN, |_, segment| {
            if segment.is_resident() {
                acc += segment.len();
            }
            None
        });
        acc
    }

    /// Checks the tree invariants and that the tree exactly covers the range.
    #[must_use]
    pub fn validate(&self) -> bool {
        let state = self.core.state.borrow();
        state.tree.validate() && state.tree.total_len() == state.range.len
    }
}

// Materialization.
impl Buffer {
    fn out_of_range(&self, requested: ByteRange) -> BufferError {
        BufferError::OutOfRange {
            requested,
            available: self.range(),
        }
    }

    /// Makes every byte of `requested` resident. `requested` must be inside the range.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] if `requested` isn't inside the range, or a
    /// source error if fetching fails.
    pub fn materialize(&self, requested: ByteRange) -> BufferResult<()> {
        let end = requested.end();
        let mut pos = requested.origin;
        while pos < end {
            let located = self.locate(pos).ok_or_else(|| self.out_of_range(requested))?;
            if located.sparse {
                self.materialize_leaf(located, ByteRange::from_bounds(pos, end))?;
            } else {
                pos = located.range.end();
            }
        }
        Ok(())
    }

    /// Makes the chunk aligned window around `wanted` (clipped to the leaf) resident.
    /// The leaf is split so that only the window is fetched. Its head stays on the same
    /// leaf, so cursors positioned on it by reference remain valid.
    fn materialize_leaf(&self, located: LocatedSegment, wanted: ByteRange) -> BufferResult<()> {
        let Some(window) = chunk_window(wanted, self.core.chunk_size).intersect(located.range) else {
            return Ok(());
        };

        let (middle, sparse) = {
            let mut state = self.core.state.borrow_mut();
            let start = span_len(located.range.origin, window.origin);
            let middle = state.tree.isolate(located.leaf, start, start + window.len);
            match state.tree.segment(middle) {
                Some(Segment::Sparse(it)) => (middle, it.clone()),
                Some(Segment::Resident(_)) | None => return Ok(()),
            }
        };

        // The borrow is released while fetching: a source may reach back into buffers
        // that share memory with this one.
        let pieces = self.fetch_sparse(&sparse)?;

        tracing::debug!(
            message = "Materialized",
            window = %window,
            pieces = pieces.len()
        );
        self.core.state.borrow_mut().install(middle, sparse.len, pieces);
        Ok(())
    }

    fn fetch_sparse(&self, sparse: &SparseSegment) -> BufferResult<FetchedPieces> {
        match &sparse.source {
            Some(source) => source.fetch(sparse.source_range(), self.core.secure),
            None => {
                let block = if self.core.secure {
                    MemoryBlock::allocate_secure(sparse.len)
                } else {
                    MemoryBlock::allocate(sparse.len)
                };
                Ok(smallvec![ResidentSegment::new(block, 0, sparse.len)])
            }
        }
    }

    /// Resident pieces referencing this buffer's memory blocks directly, which together
    /// hold the bytes at `requested`. Grows (if allowed) and materializes as needed.
    /// This is how a [`Source`] with a cache fetches.
    ///
    /// # Errors
    ///
    /// Returns an error if the range can't grow to cover `requested`, or fetching fails.
    pub fn resident_pieces(&self, requested: ByteRange) -> BufferResult<FetchedPieces> {
        let mut pieces = FetchedPieces::new();
        if requested.is_empty() {
            return Ok(pieces);
        }
        self.ensure_range(requested.origin, requested.end())?;
        self.materialize(requested)?;

        self.for_each_segment::<()>(requested.origin, |range, segment| {
            if range.origin >= requested.end() {
                return Some(());
            }
            if let (Some(overlap), Some(resident)) = (range.intersect(requested), segment.as_resident()) {
                pieces.push(ResidentSegment {
                    block: Rc::clone(&resident.block),
                    offset: resident.offset + span_len(range.origin, overlap.origin),
                    len: overlap.len,
                    borrowed: resident.borrowed,
                });
            }
            None
        });
        Ok(pieces)
    }

    /// Copies the bytes at `pos` into `dst`, materializing first.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] if the bytes are outside of the range.
    pub fn read_at(&self, pos: BytePos, dst: &mut [u8]) -> BufferResult<()> {
        let requested = ByteRange::new(pos, dst.len());
        if dst.is_empty() {
            return Ok(());
        }
        self.materialize(requested)?;

        let mut copied = 0;
        self.for_each_segment::<()>(requested.origin, |range, segment| {
            if range.origin >= requested.end() {
                return Some(());
            }
            if let (Some(overlap), Some(resident)) = (range.intersect(requested), segment.as_resident()) {
                let skip = span_len(range.origin, overlap.origin);
                let at = span_len(pos, overlap.origin);
                resident.block.read(resident.offset + skip, &mut dst[at..at + overlap.len]);
                copied += overlap.len;
            }
            None
        });
        debug_assert_eq!(copied, dst.len());
        Ok(())
    }

    /// Copies `src` into the buffer at `pos`, materializing first. Blocks shared with
    /// views are written in place, so every view of these bytes sees the write. Segments
    /// over constant data, or over bytes borrowed from a source's cache, are decoupled
    /// before they are written to.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::OutOfRange`] if the bytes are outside of the range.
    pub(crate) fn write_at(&self, pos: BytePos, src: &[u8]) -> BufferResult<()> {
        let requested = ByteRange::new(pos, src.len());
        if src.is_empty() {
            return Ok(());
        }
        self.materialize(requested)?;

        let mut current = pos;
        while current < requested.end() {
            let located = self.locate(current).ok_or_else(|| self.out_of_range(requested))?;
            let overlap = located.range.intersect(requested).ok_or_else(|| self.out_of_range(requested))?;

            let mut state = self.core.state.borrow_mut();
            if state.tree.segment(located.leaf).is_some_and(Segment::needs_copy_on_write) {
                state.tree.modify_segment(located.leaf, decouple_segment);
                tracing::debug!(message = "Decoupled before write", range = %located.range);
            }
            if let Some(resident) = state.tree.segment(located.leaf).and_then(Segment::as_resident) {
                let skip = span_len(located.range.origin, overlap.origin);
                let from = span_len(pos, overlap.origin);
                resident.block.write(resident.offset + skip, &src[from..from + overlap.len]);
            }
            current = overlap.end();
        }
        Ok(())
    }

    /// Materializes every byte and gives every segment a private copy of its bytes.
    /// Afterwards the buffer shares no memory with any other buffer, and is no longer
    /// bound to a source (bytes gained by growing it later are zeros).
    ///
    /// # Errors
    ///
    /// Returns an error if fetching fails.
    pub fn decouple(&self) -> BufferResult<()> {
        self.materialize(self.range())?;
        let mut state = self.core.state.borrow_mut();
        let leaves: Vec<NodeId> = state
            .tree
            .iter()
            .filter(|(_, _, segment)| segment.needs_decouple())
            .map(|(leaf, _, _)| leaf)
            .collect();
        for leaf in &leaves {
            state.tree.modify_segment(*leaf, decouple_segment);
        }
        state.source = None;
        tracing::debug!(message = "Decoupled buffer", segments = leaves.len());
        Ok(())
    }
}

fn decouple_segment(segment: &mut Segment) {
    if let Segment::Resident(it) = segment {
        it.decouple();
    }
}

/// Smallest range made of whole chunks (aligned on absolute position) that covers
/// `wanted`.
fn chunk_window(wanted: ByteRange, chunk_size: usize) -> ByteRange {
    let chunk = len_to_pos(chunk_size);
    let start = wanted.origin.div_euclid(chunk) * chunk;
    let end = wanted.end().saturating_add(chunk - 1).div_euclid(chunk) * chunk;
    ByteRange::from_bounds(start, end)
}

impl Debug for Buffer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let state = self.core.state.borrow();
        f.debug_struct("Buffer")
            .field("range", &state.range)
            .field("fixed", &state.fixed)
            .field("segments", &state.tree.leaf_count())
            .field("source", &state.source)
            .field("source_offset", &state.source_offset)
            .finish_non_exhaustive()
    }
}
