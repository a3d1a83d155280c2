// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use std::num::NonZeroUsize;

use crate::{Endianness, Newline};

/// Materialization granularity used when nothing else is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024;

const DEFAULT_CHUNK: NonZeroUsize = match NonZeroUsize::new(DEFAULT_CHUNK_SIZE) {
    Some(it) => it,
    None => panic!("Default chunk size must be greater than 0"),
};

/// Per buffer settings. Use [`crate::Buffer::with_config`] to apply them.
///
/// ```
/// use r3bl_segbuf::{Buffer, BufferConfig, Endianness};
/// let buffer = Buffer::with_config(
///     BufferConfig::default()
///         .with_chunk_size(512)
///         .with_endianness(Endianness::Big),
/// );
/// assert_eq!(buffer.endianness(), Endianness::Big);
/// assert_eq!(buffer.chunk_size(), 512);
/// ```
///
/// The chunk size can only be set through [`BufferConfig::with_chunk_size`], so it is
/// never 0:
///
/// ```compile_fail
/// use r3bl_segbuf::BufferConfig;
/// let config = BufferConfig { chunk_size: 0, ..BufferConfig::default() };
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BufferConfig {
    chunk_size: NonZeroUsize,
    pub endianness: Endianness,
    pub newline: Newline,
    /// Bind an implicit zero fill source and wipe owned blocks when they're released.
    pub secure: bool,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK,
            endianness: Endianness::default(),
            newline: Newline::default(),
            secure: false,
        }
    }
}

impl BufferConfig {
    /// Sparse segments are split on multiples of this many bytes (in absolute
    /// position), and only the touched chunks are fetched.
    #[must_use]
    pub fn chunk_size(&self) -> usize { self.chunk_size.get() }

    /// # Panics
    ///
    /// Panics if `chunk_size` is 0.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        let Some(chunk_size) = NonZeroUsize::new(chunk_size) else {
            panic!("Chunk size must be greater than 0");
        };
        self.chunk_size = chunk_size;
        self
    }

    #[must_use]
    pub fn with_endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = endianness;
        self
    }

    #[must_use]
    pub fn with_newline(mut self, newline: Newline) -> Self {
        self.newline = newline;
        self
    }

    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }
}
