// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! For more information on error types, see:
//!
//! 1. [Article](https://developerlife.com/2024/06/10/rust-miette-error-handling/)
//! 2. [Video](https://youtu.be/TmLF7vI8lKk)

use crate::{ByteRange, BytePos};

/// Type alias to make it easy to work with [`BufferError`].
pub type BufferResult<T> = Result<T, BufferError>;

/// Everything that can go wrong while growing, materializing, reading or writing a
/// [`crate::Buffer`].
///
/// There are two families of errors, which you can tell apart with
/// [`BufferError::is_precondition`]:
///
/// | Family       | Variants                                                                  |
/// | :----------- | :------------------------------------------------------------------------ |
/// | Data         | [`OutOfRange`], [`OutsideSourceLimit`], [`MalformedBase64`], [`Fill`], [`Io`] |
/// | Precondition | [`RangeFixed`], [`BitMisaligned`], [`InvalidCount`]                       |
///
/// Data errors depend on the bytes or the environment and are expected at runtime.
/// Precondition errors mean the caller broke a contract of the API.
///
/// [`OutOfRange`]: Self::OutOfRange
/// [`OutsideSourceLimit`]: Self::OutsideSourceLimit
/// [`MalformedBase64`]: Self::MalformedBase64
/// [`Fill`]: Self::Fill
/// [`Io`]: Self::Io
/// [`RangeFixed`]: Self::RangeFixed
/// [`BitMisaligned`]: Self::BitMisaligned
/// [`InvalidCount`]: Self::InvalidCount
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum BufferError {
    /// The requested bytes lie outside the buffer and it can't grow to cover them.
    #[error("Bytes {requested} are outside of buffer range {available}")]
    #[diagnostic(
        code(r3bl_segbuf::out_of_range),
        help("Use a Modify cursor, or a source backed buffer whose range isn't fixed")
    )]
    OutOfRange {
        requested: ByteRange,
        available: ByteRange,
    },

    /// A source was asked for bytes outside of its valid limit.
    #[error("Source bytes {requested} are outside of source limit {limit}")]
    #[diagnostic(code(r3bl_segbuf::outside_source_limit))]
    OutsideSourceLimit {
        requested: ByteRange,
        limit: ByteRange,
    },

    /// Input to the Base64 decoder isn't valid Base64.
    #[error("Malformed Base64 input at byte {position}: {reason}")]
    #[diagnostic(code(r3bl_segbuf::malformed_base64))]
    MalformedBase64 {
        position: BytePos,
        reason: &'static str,
    },

    /// A source's fill callback failed.
    #[error("Source could not fill {requested}: {message}")]
    #[diagnostic(code(r3bl_segbuf::fill))]
    Fill {
        requested: ByteRange,
        message: String,
    },

    #[error("IO error")]
    #[diagnostic(code(r3bl_segbuf::io))]
    Io(#[from] std::io::Error),

    /// Growth was requested after [`crate::Buffer::fix_range`].
    #[error("Buffer range {fixed} is fixed, can't grow it to {requested}")]
    #[diagnostic(
        code(r3bl_segbuf::range_fixed),
        help("Create a new buffer, or don't fix the range of this one")
    )]
    RangeFixed {
        fixed: ByteRange,
        requested: ByteRange,
    },

    /// A byte level operation was attempted in the middle of a byte.
    #[error("Bit cursor is at bit {bit_offset}, byte access needs it to be 0")]
    #[diagnostic(
        code(r3bl_segbuf::bit_misaligned),
        help("Call `Cursor::align_to_byte()` after bit I/O")
    )]
    BitMisaligned { bit_offset: u8 },

    /// A count argument was out of its accepted range.
    #[error("Invalid count {count} for {operation}")]
    #[diagnostic(code(r3bl_segbuf::invalid_count))]
    InvalidCount {
        operation: &'static str,
        count: usize,
    },
}

impl BufferError {
    /// `true` when the error is a broken API contract rather than bad data.
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            BufferError::RangeFixed { .. }
                | BufferError::BitMisaligned { .. }
                | BufferError::InvalidCount { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assert_eq2, byte_range};

    #[test]
    fn test_families() {
        let it = BufferError::BitMisaligned { bit_offset: 3 };
        assert!(it.is_precondition());

        let it = BufferError::OutOfRange {
            requested: byte_range(10, 2),
            available: byte_range(0, 10),
        };
        assert!(!it.is_precondition());
        assert_eq2!(
            it.to_string(),
            "Bytes [10, 12) are outside of buffer range [0, 10)".to_string()
        );
    }

    #[test]
    fn test_diagnostic_code() {
        use miette::Diagnostic;
        let it = BufferError::InvalidCount {
            operation: "read_bits",
            count: 33,
        };
        assert_eq2!(
            it.code().map(|code| code.to_string()),
            Some("r3bl_segbuf::invalid_count".to_string())
        );
    }
}
