// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Pluggable providers of bytes for sparse [`crate::Segment`]s.
//!
//! A [`Source`] is made of up to three parts:
//!
//! 1. A fill callback ([`SourceFill`]) that writes the requested bytes into a caller
//!    supplied slice.
//! 2. An optional cache [`Buffer`]. When present, every fetch is redirected through the
//!    cache, which keeps previously fetched bytes resident, so repeated access to the
//!    same bytes never calls the fill again. Segments that are materialized through a
//!    cache reference the cache's memory blocks directly instead of copying them.
//! 3. An optional limit, the range of source offsets that are valid (eg: a file's
//!    size). Access outside of the limit is reported as
//!    [`BufferError::OutsideSourceLimit`].
//!
//! A view of another buffer (see [`crate::Buffer::extract`]) is simply a source with
//! no fill whose cache is that other buffer.
//!
//! # Writes
//!
//! Pieces fetched from a view reference the other buffer's blocks, and writes through
//! either buffer are visible through both. Pieces fetched from a cache that the source
//! owns (see [`Source::cached`]) are marked as borrowed instead, so writing to them
//! makes a private copy first and the cache keeps the bytes the fill produced.
//!
//! # Recursion
//!
//! Fetching through a cache can materialize the cache buffer, whose own segments may
//! be bound to another source with a cache, and so on. The call depth is bounded by
//! the number of composition layers the caller has built (view of a view of a file
//! is 3 deep), never by the amount of data.

use std::{cell::RefCell,
          fmt::{Debug, Formatter},
          fs::File,
          io::{Read, Seek, SeekFrom},
          path::{Path, PathBuf},
          rc::Rc};

use smallvec::{SmallVec, smallvec};

use crate::{Buffer, BufferError, BufferResult, ByteRange, BytePos, MemoryBlock,
            ResidentSegment};

/// Reference counted handle to a [`Source`].
pub type SharedSource = Rc<Source>;

/// Resident pieces produced by a single fetch. Most fetches produce exactly one piece,
/// fetches through a cache produce one piece per cache segment they overlap.
pub type FetchedPieces = SmallVec<[ResidentSegment; 4]>;

/// The fill contract.
///
/// Implementations must fully populate `dest` with the bytes at
/// `[source_offset, source_offset + dest.len())` and must produce the same bytes for
/// the same offsets every time they are called, regardless of call order.
pub trait SourceFill {
    /// # Errors
    ///
    /// Returns an error if the bytes can't be produced (eg: an I/O failure).
    fn fill(&self, dest: &mut [u8], source_offset: BytePos) -> BufferResult<()>;

    /// Short description used in logs and `Debug` output.
    fn describe(&self) -> String { "fill".to_string() }
}

/// Produces zeros. Bound implicitly by secure buffers.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZeroFill;

impl SourceFill for ZeroFill {
    fn fill(&self, dest: &mut [u8], _source_offset: BytePos) -> BufferResult<()> {
        dest.fill(0);
        Ok(())
    }

    fn describe(&self) -> String { "zero".to_string() }
}

/// Adapts a closure to [`SourceFill`], for programmatically generated data.
pub struct FnFill<F>(pub F);

impl<F> SourceFill for FnFill<F>
where
    F: Fn(&mut [u8], BytePos) -> BufferResult<()>,
{
    fn fill(&self, dest: &mut [u8], source_offset: BytePos) -> BufferResult<()> {
        (self.0)(dest, source_offset)
    }

    fn describe(&self) -> String { "fn".to_string() }
}

impl<F> Debug for FnFill<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str("FnFill") }
}

/// Positioned reads from an open file.
#[derive(Debug)]
pub struct FileFill {
    file: RefCell<File>,
    path: PathBuf,
    size: u64,
}

impl FileFill {
    /// # Errors
    ///
    /// Returns an error if the file can't be opened or its size can't be queried.
    pub fn open(path: impl AsRef<Path>) -> BufferResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path)?;
        let size = file.seek(SeekFrom::End(0))?;
        Ok(Self {
            file: RefCell::new(file),
            path,
            size,
        })
    }

    #[must_use]
    pub fn size(&self) -> u64 { self.size }
}

impl SourceFill for FileFill {
    fn fill(&self, dest: &mut [u8], source_offset: BytePos) -> BufferResult<()> {
        let start = u64::try_from(source_offset).map_err(|_| BufferError::Fill {
            requested: ByteRange::new(source_offset, dest.len()),
            message: "negative file offset".to_string(),
        })?;
        let mut file = self.file.borrow_mut();
        file.seek(SeekFrom::Start(start))?;
        file.read_exact(dest)?;
        Ok(())
    }

    fn describe(&self) -> String { format!("file {}", self.path.display()) }
}

pub struct Source {
    fill: Option<Box<dyn SourceFill>>,
    cache: Option<Buffer>,
    /// `cache` was created by [`Source::cached`], nothing else writes to it.
    owns_cache: bool,
    limit: Option<ByteRange>,
}

impl Source {
    /// Source that fetches by calling `fill` directly on every access.
    #[must_use]
    pub fn from_fill(fill: impl SourceFill + 'static) -> Self {
        Self {
            fill: Some(Box::new(fill)),
            cache: None,
            owns_cache: false,
            limit: None,
        }
    }

    /// Source for programmatically generated data.
    ///
    /// ```
    /// use r3bl_segbuf::{Buffer, Source};
    /// let source = Source::from_fn(|dest, offset| {
    ///     for (index, byte) in dest.iter_mut().enumerate() {
    ///         *byte = ((offset + index as i64) % 251) as u8;
    ///     }
    ///     Ok(())
    /// });
    /// let buffer = Buffer::from_source(source, 0);
    /// buffer.ensure_range(0, 1000).unwrap();
    /// assert_eq!(buffer.reader().at(300).read_u8().unwrap(), 49);
    /// ```
    #[must_use]
    pub fn from_fn<F>(fill: F) -> Self
    where
        F: Fn(&mut [u8], BytePos) -> BufferResult<()> + 'static,
    {
        Self::from_fill(FnFill(fill))
    }

    #[must_use]
    pub fn zero_fill() -> Self { Self::from_fill(ZeroFill) }

    /// File backed source, limited to the file's size.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be opened.
    pub fn from_file(path: impl AsRef<Path>) -> BufferResult<Self> {
        let fill = FileFill::open(path)?;
        let size = usize::try_from(fill.size()).unwrap_or(usize::MAX);
        Ok(Self::from_fill(fill).with_limit(ByteRange::new(0, size)))
    }

    /// Source whose bytes are those of `buffer`, at the same absolute positions.
    #[must_use]
    pub fn view_of(buffer: &Buffer) -> Self {
        Self {
            fill: None,
            cache: Some(buffer.handle()),
            owns_cache: false,
            limit: None,
        }
    }

    /// Attaches a cache. The fill moves into an inner source that backs a new, growable
    /// cache buffer; this source then fetches exclusively through that cache.
    #[must_use]
    pub fn cached(self) -> Self {
        if self.cache.is_some() {
            return self;
        }
        let limit = self.limit;
        let cache = Buffer::from_source(self, 0);
        Self {
            fill: None,
            cache: Some(cache),
            owns_cache: true,
            limit,
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: ByteRange) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn limit(&self) -> Option<ByteRange> { self.limit }

    #[must_use]
    pub fn cache(&self) -> Option<&Buffer> { self.cache.as_ref() }

    #[must_use]
    pub fn has_fill(&self) -> bool { self.fill.is_some() }

    /// # Errors
    ///
    /// Returns [`BufferError::OutsideSourceLimit`] if `requested` isn't inside the
    /// limit.
    pub fn check_limit(&self, requested: ByteRange) -> BufferResult<()> {
        match self.limit {
            Some(limit) if !requested.is_empty() && !limit.contains_range(requested) => {
                Err(BufferError::OutsideSourceLimit { requested, limit })
            }
            _ => Ok(()),
        }
    }

    /// Called whenever a sparse segment bound to this source is created or enlarged:
    /// validates the limit and pre-extends the cache so that it covers `requested`.
    ///
    /// # Errors
    ///
    /// Returns an error if `requested` is outside of the limit, or the cache can't grow
    /// to cover it.
    pub fn admit(&self, requested: ByteRange) -> BufferResult<()> {
        self.check_limit(requested)?;
        if let Some(cache) = &self.cache {
            cache.ensure_range(requested.origin, requested.end())?;
        }
        Ok(())
    }

    /// Produces resident pieces that together hold the bytes at `requested`.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are outside of the limit, the cache can't provide
    /// them, or the fill fails.
    pub fn fetch(&self, requested: ByteRange, secure: bool) -> BufferResult<FetchedPieces> {
        self.check_limit(requested)?;

        if let Some(cache) = &self.cache {
            tracing::trace!(
                message = "Fetch through cache",
                requested = %requested,
                cache_range = %cache.range()
            );
            let pieces = cache.resident_pieces(requested)?;
            return Ok(if self.owns_cache {
                pieces.into_iter().map(ResidentSegment::into_borrowed).collect()
            } else {
                pieces
            });
        }

        let block = if secure {
            MemoryBlock::allocate_secure(requested.len)
        } else {
            MemoryBlock::allocate(requested.len)
        };

        if let Some(fill) = &self.fill {
            tracing::trace!(
                message = "Fetch through fill",
                requested = %requested,
                fill = %fill.describe()
            );
            block.with_bytes_mut(0, requested.len, |dest| fill.fill(dest, requested.origin))?;
        }

        Ok(smallvec![ResidentSegment::new(block, 0, requested.len)])
    }
}

impl Debug for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source")
            .field("fill", &self.fill.as_ref().map(|it| it.describe()))
            .field("cache", &self.cache.as_ref().map(Buffer::range))
            .field("limit", &self.limit)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assert_eq2, try_create_temp_dir};
    use std::cell::Cell;

    fn counting_source(calls: Rc<Cell<usize>>) -> Source {
        Source::from_fn(move |dest, offset| {
            calls.set(calls.get() + 1);
            for (index, byte) in dest.iter_mut().enumerate() {
                *byte = u8::try_from((offset + index as i64) % 256).unwrap_or_default();
            }
            Ok(())
        })
    }

    fn piece_bytes(pieces: &FetchedPieces) -> Vec<u8> {
        let mut acc = vec![];
        for piece in pieces {
            piece
                .block
                .with_bytes(piece.offset, piece.len, |it| acc.extend_from_slice(it));
        }
        acc
    }

    #[test]
    fn test_zero_fill() {
        let pieces = Source::zero_fill().fetch(ByteRange::new(10, 4), false).unwrap();
        assert_eq2!(pieces.len(), 1);
        assert_eq2!(piece_bytes(&pieces), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_fn_fill_receives_source_offset() {
        let calls = Rc::new(Cell::new(0));
        let source = counting_source(Rc::clone(&calls));
        let pieces = source.fetch(ByteRange::new(5, 3), false).unwrap();
        assert_eq2!(piece_bytes(&pieces), vec![5, 6, 7]);
        assert_eq2!(calls.get(), 1);
    }

    #[test]
    fn test_limit_is_enforced() {
        let source = Source::zero_fill().with_limit(ByteRange::new(0, 10));
        assert!(source.check_limit(ByteRange::new(2, 8)).is_ok());
        let it = source.fetch(ByteRange::new(8, 4), false);
        assert!(matches!(it, Err(BufferError::OutsideSourceLimit { .. })));
    }

    #[test]
    fn test_cached_source_fetches_once() {
        let calls = Rc::new(Cell::new(0));
        let source = counting_source(Rc::clone(&calls)).cached();
        assert!(source.cache().is_some());
        assert!(!source.has_fill());

        let first = source.fetch(ByteRange::new(0, 16), false).unwrap();
        let second = source.fetch(ByteRange::new(4, 8), false).unwrap();
        assert_eq2!(calls.get(), 1);
        assert_eq2!(piece_bytes(&second), (4..12).collect::<Vec<u8>>());

        // Both fetches reference the same physical block owned by the cache.
        assert!(Rc::ptr_eq(&first[0].block, &second[0].block));
        assert!(first.iter().chain(second.iter()).all(|it| it.borrowed));
    }

    #[test]
    fn test_view_pieces_are_not_borrowed() {
        let buffer = Buffer::from_vec(b"0123456789".to_vec());
        let pieces = Source::view_of(&buffer).fetch(ByteRange::new(2, 3), false).unwrap();
        assert_eq2!(piece_bytes(&pieces), b"234".to_vec());
        assert!(pieces.iter().all(|it| !it.borrowed));
    }

    #[test]
    fn test_admit_pre_extends_cache() {
        let source = Source::zero_fill().cached();
        source.admit(ByteRange::new(0, 100)).unwrap();
        assert_eq2!(source.cache().map(Buffer::range), Some(ByteRange::new(0, 100)));
        // Nothing was fetched.
        assert_eq2!(source.cache().map(Buffer::resident_len), Some(0));
    }

    #[test]
    fn test_file_fill() {
        let dir = try_create_temp_dir().unwrap();
        let path = dir.join("data.bin");
        std::fs::write(&path, b"0123456789").unwrap();

        let source = Source::from_file(&path).unwrap();
        assert_eq2!(source.limit(), Some(ByteRange::new(0, 10)));
        let pieces = source.fetch(ByteRange::new(3, 4), false).unwrap();
        assert_eq2!(piece_bytes(&pieces), b"3456".to_vec());
        assert!(source.fetch(ByteRange::new(8, 4), false).is_err());
    }
}
