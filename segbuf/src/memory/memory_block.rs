// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Physical storage behind resident [`crate::Segment`]s.
//!
//! A [`MemoryBlock`] is always handled through a [`SharedBlock`] ([`Rc`]). The
//! reference count is the retain / release discipline: a block is shared as soon as
//! more than one segment points into it (after a split, or when a segment references
//! the bytes of a source's cache) and it is destroyed when the last segment lets go.
//!
//! A write through one segment is visible through every segment that shares the block.
//! [`crate::Buffer`] copies a block first only when it is read only, or when it belongs
//! to a source's cache. [`crate::Buffer::copy`] uses [`MemoryBlock::is_exclusive`] to
//! find every block it has to copy to become independent.

use std::{cell::RefCell,
          fmt::{Debug, Formatter},
          rc::Rc};

/// Reference counted handle to a [`MemoryBlock`].
pub type SharedBlock = Rc<MemoryBlock>;

/// Hook that receives the bytes of a block that wraps caller data, when the last
/// reference to the block is released.
pub type ReleaseFn = Box<dyn FnOnce(Vec<u8>)>;

enum BlockBytes {
    Owned(Vec<u8>),
    Static(&'static [u8]),
}

pub struct MemoryBlock {
    bytes: RefCell<BlockBytes>,
    on_release: RefCell<Option<ReleaseFn>>,
    wipe_on_release: bool,
}

impl MemoryBlock {
    /// Exclusive, zero initialized block of `len` bytes.
    #[must_use]
    pub fn allocate(len: usize) -> SharedBlock { Self::new(BlockBytes::Owned(vec![0; len]), None, false) }

    /// Like [`MemoryBlock::allocate`], and the bytes are zeroed again on release.
    #[must_use]
    pub fn allocate_secure(len: usize) -> SharedBlock {
        Self::new(BlockBytes::Owned(vec![0; len]), None, true)
    }

    /// Wraps mutable caller data without copying it.
    #[must_use]
    pub fn from_vec(bytes: Vec<u8>) -> SharedBlock { Self::new(BlockBytes::Owned(bytes), None, false) }

    /// Wraps mutable caller data, handing it back to `on_release` once the block is
    /// released.
    #[must_use]
    pub fn from_vec_with_release(
        bytes: Vec<u8>,
        on_release: impl FnOnce(Vec<u8>) + 'static,
    ) -> SharedBlock {
        Self::new(BlockBytes::Owned(bytes), Some(Box::new(on_release)), false)
    }

    /// Wraps constant data. The block is read only, writers have to decouple.
    #[must_use]
    pub fn from_static(bytes: &'static [u8]) -> SharedBlock {
        Self::new(BlockBytes::Static(bytes), None, false)
    }

    fn new(bytes: BlockBytes, on_release: Option<ReleaseFn>, wipe_on_release: bool) -> SharedBlock {
        Rc::new(Self {
            bytes: RefCell::new(bytes),
            on_release: RefCell::new(on_release),
            wipe_on_release,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match &*self.bytes.borrow() {
            BlockBytes::Owned(it) => it.len(),
            BlockBytes::Static(it) => it.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// `true` for blocks that wrap constant data.
    #[must_use]
    pub fn is_read_only(&self) -> bool { matches!(&*self.bytes.borrow(), BlockBytes::Static(_)) }

    #[must_use]
    pub fn is_secure(&self) -> bool { self.wipe_on_release }

    /// Number of live references (segments) to this block.
    #[must_use]
    pub fn ref_count(this: &SharedBlock) -> usize { Rc::strong_count(this) }

    /// `true` when the block can be written through `this` without affecting anyone
    /// else: it is writable and nothing else references it.
    #[must_use]
    pub fn is_exclusive(this: &SharedBlock) -> bool {
        Rc::strong_count(this) == 1 && !this.is_read_only()
    }

    /// Runs `f` over `len` bytes starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the requested bytes are outside of the block.
    pub fn with_bytes<R>(&self, offset: usize, len: usize, f: impl FnOnce(&[u8]) -> R) -> R {
        match &*self.bytes.borrow() {
            BlockBytes::Owned(it) => f(&it[offset..offset + len]),
            BlockBytes::Static(it) => f(&it[offset..offset + len]),
        }
    }

    /// Runs `f` over `len` writable bytes starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the block is read only, or the bytes are outside of the block.
    pub fn with_bytes_mut<R>(
        &self,
        offset: usize,
        len: usize,
        f: impl FnOnce(&mut [u8]) -> R,
    ) -> R {
        match &mut *self.bytes.borrow_mut() {
            BlockBytes::Owned(it) => f(&mut it[offset..offset + len]),
            BlockBytes::Static(_) => panic!("Can't write to a read only memory block"),
        }
    }

    /// Copies `dst.len()` bytes starting at `offset` into `dst`.
    pub fn read(&self, offset: usize, dst: &mut [u8]) {
        self.with_bytes(offset, dst.len(), |src| dst.copy_from_slice(src));
    }

    /// Copies `src` into the block starting at `offset`.
    ///
    /// # Panics
    ///
    /// Panics if the block is read only, or the bytes are outside of the block.
    pub fn write(&self, offset: usize, src: &[u8]) {
        self.with_bytes_mut(offset, src.len(), |dst| dst.copy_from_slice(src));
    }

    /// Private, writable copy of `len` bytes starting at `offset`. The copy inherits
    /// the secure flag.
    #[must_use]
    pub fn copy_of(&self, offset: usize, len: usize) -> SharedBlock {
        let bytes = self.with_bytes(offset, len, <[u8]>::to_vec);
        Self::new(BlockBytes::Owned(bytes), None, self.wipe_on_release)
    }
}

impl Drop for MemoryBlock {
    fn drop(&mut self) {
        let bytes = std::mem::replace(self.bytes.get_mut(), BlockBytes::Static(&[]));
        if let BlockBytes::Owned(mut vec) = bytes {
            if self.wipe_on_release {
                vec.fill(0);
                std::hint::black_box(&vec);
            }
            if let Some(on_release) = self.on_release.get_mut().take() {
                on_release(vec);
            }
        }
    }
}

impl Debug for MemoryBlock {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBlock")
            .field("len", &self.len())
            .field("read_only", &self.is_read_only())
            .field("secure", &self.wipe_on_release)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_eq2;
    use std::cell::Cell;

    #[test]
    fn test_allocate_is_zeroed_and_exclusive() {
        let block = MemoryBlock::allocate(8);
        assert_eq2!(block.len(), 8);
        assert!(MemoryBlock::is_exclusive(&block));
        block.with_bytes(0, 8, |it| assert!(it.iter().all(|&b| b == 0)));
    }

    #[test]
    fn test_read_write() {
        let block = MemoryBlock::allocate(4);
        block.write(1, &[7, 8]);
        let mut dst = [0_u8; 4];
        block.read(0, &mut dst);
        assert_eq2!(dst, [0, 7, 8, 0]);
    }

    #[test]
    fn test_ref_count_tracks_sharing() {
        let block = MemoryBlock::allocate(4);
        let other = Rc::clone(&block);
        assert_eq2!(MemoryBlock::ref_count(&block), 2);
        assert!(!MemoryBlock::is_exclusive(&block));
        drop(other);
        assert!(MemoryBlock::is_exclusive(&block));
    }

    #[test]
    fn test_static_is_read_only() {
        let block = MemoryBlock::from_static(b"abc");
        assert!(block.is_read_only());
        assert!(!MemoryBlock::is_exclusive(&block));

        let copy = block.copy_of(1, 2);
        assert!(MemoryBlock::is_exclusive(&copy));
        copy.with_bytes(0, 2, |it| assert_eq2!(it, b"bc"));
    }

    #[test]
    #[should_panic(expected = "read only")]
    fn test_write_to_static_panics() { MemoryBlock::from_static(b"abc").write(0, b"x"); }

    #[test]
    fn test_release_hook_runs_once_last_reference_drops() {
        let released = Rc::new(Cell::new(0_usize));
        let released_clone = Rc::clone(&released);
        let block = MemoryBlock::from_vec_with_release(vec![1, 2, 3], move |bytes| {
            released_clone.set(bytes.len());
        });
        let other = Rc::clone(&block);
        drop(block);
        assert_eq2!(released.get(), 0);
        drop(other);
        assert_eq2!(released.get(), 3);
    }

    #[test]
    fn test_secure_block_is_wiped_before_release() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let block = MemoryBlock::new(
            BlockBytes::Owned(vec![9, 9]),
            Some(Box::new(move |bytes| *seen_clone.borrow_mut() = bytes)),
            true,
        );
        drop(block);
        assert_eq2!(*seen.borrow(), vec![0, 0]);
    }
}
