// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! # r3bl_segbuf
//!
//! A virtual, byte addressable storage abstraction. A [`Buffer`] presents a linear
//! range of bytes which may only be partially resident in memory at any time. Files,
//! views of other buffers, raw constant data, and programmatically generated data are
//! all treated uniformly as one addressable byte range, and only the bytes that are
//! actually touched get fetched and materialized.
//!
//! # Table of contents
//!
//! <!-- TOC -->
//!
//! - [Architecture](#architecture)
//! - [Materialization](#materialization)
//! - [Cursors](#cursors)
//! - [Example](#example)
//!
//! <!-- /TOC -->
//!
//! # Architecture
//!
//! From the leaves up:
//!
//! | Layer           | Type              | What it does                                          |
//! | :-------------- | :---------------- | :---------------------------------------------------- |
//! | Memory Block    | [`MemoryBlock`]   | Owned or wrapped bytes, shared via [`std::rc::Rc`]    |
//! | Segment         | [`Segment`]       | Sparse (not fetched yet) or resident (backed by bytes) |
//! | Segment Tree    | [`SegmentTree`]   | AVL order statistics tree, offset to segment lookup   |
//! | Backing Source  | [`Source`]        | Fill callback + optional cache + optional limit       |
//! | Buffer          | [`Buffer`]        | The addressable range                                 |
//! | Cursor          | [`Cursor`]        | Traversal, typed I/O, bit I/O, text scanning          |
//!
//! # Materialization
//!
//! A [`Segment`] is either sparse or resident. When a [`Cursor`] touches a sparse
//! segment, the segment is split on chunk aligned boundaries (see
//! [`BufferConfig::chunk_size`]) and only the touched chunks are fetched from the
//! segment's [`Source`]. A source may itself be backed by another [`Buffer`] (its
//! cache), which may be backed by another source, and so on. The recursion depth is
//! bounded by the number of buffer composition layers a caller builds, not by the
//! size of the data.
//!
//! # Cursors
//!
//! A [`Cursor`] borrows its [`Buffer`], so a buffer can never be dropped while a cursor
//! is alive. Cursors that write borrow the buffer mutably, which makes them exclusive.
//! There are three modes, expressed as type parameters: [`Read`], [`Mutate`] and
//! [`Modify`].
//!
//! # Example
//!
//! ```
//! use r3bl_segbuf::{Buffer, BufferResult};
//!
//! fn example() -> BufferResult<()> {
//!     let mut buffer = Buffer::new();
//!     buffer.modifier().write_bytes(b"Hello")?;
//!
//!     let view = buffer.extract(buffer.range())?;
//!     assert_eq!(view.to_vec()?, b"Hello".to_vec());
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

// https://github.com/rust-lang/rust-clippy
// https://rust-lang.github.io/rust-clippy/master/index.html
#![cfg_attr(not(test), deny(clippy::unwrap_in_result))]

// Attach.
pub mod buffer;
pub mod common;
pub mod cursor;
pub mod log;
pub mod memory;
pub mod segment;
pub mod source;
pub mod tree;
pub mod units;

// Re-export.
pub use buffer::*;
pub use common::*;
pub use cursor::*;
pub use log::*;
pub use memory::*;
pub use segment::*;
pub use source::*;
pub use tree::*;
pub use units::*;
