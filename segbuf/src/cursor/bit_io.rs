// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Bit level reads and writes.
//!
//! Bits are consumed least significant bit first within each byte, and a multi bit
//! value is assembled little endian: the first bit read is bit 0 of the result. This
//! is the layout used by deflate style bit streams.
//!
//! Byte level operations are rejected with [`BufferError::BitMisaligned`] while the
//! bit offset isn't 0. Use [`Cursor::align_to_byte`] (readers) or
//! [`Cursor::pad_to_byte`] (writers) to get back on a byte boundary.

use crate::{BufferError, BufferResult, Cursor, CursorMode, Writable, ok};

/// Most bits a single [`Cursor::read_bits`] / [`Cursor::write_bits`] can move.
pub const MAX_BIT_COUNT: u8 = 32;

fn check_bit_count(operation: &'static str, count: u8) -> BufferResult<()> {
    if (1..=MAX_BIT_COUNT).contains(&count) {
        ok!()
    } else {
        Err(BufferError::InvalidCount {
            operation,
            count: usize::from(count),
        })
    }
}

impl<M: CursorMode> Cursor<'_, M> {
    fn advance_bit(&mut self) {
        self.bit_offset += 1;
        if self.bit_offset == 8 {
            self.bit_offset = 0;
            self.position += 1;
        }
    }

    /// Reads one bit and advances.
    ///
    /// # Errors
    ///
    /// See [`Cursor::prepare`].
    pub fn read_bit(&mut self) -> BufferResult<bool> {
        let byte = self.current_byte()?;
        let bit = (byte >> self.bit_offset) & 1 == 1;
        self.advance_bit();
        Ok(bit)
    }

    /// Reads `count` bits (`1..=32`) and advances.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidCount`] if `count` is out of bounds, or see
    /// [`Cursor::prepare`].
    pub fn read_bits(&mut self, count: u8) -> BufferResult<u32> {
        check_bit_count("read_bits", count)?;
        let mut acc = 0_u32;
        for index in 0..count {
            if self.read_bit()? {
                acc |= 1 << index;
            }
        }
        Ok(acc)
    }

    /// Skips the rest of the current byte. Returns the number of bits skipped.
    pub fn align_to_byte(&mut self) -> u8 {
        if self.bit_offset == 0 {
            return 0;
        }
        let skipped = 8 - self.bit_offset;
        self.bit_offset = 0;
        self.position += 1;
        skipped
    }
}

impl<M: Writable> Cursor<'_, M> {
    /// Writes one bit, leaving the other bits of the byte untouched, and advances.
    ///
    /// # Errors
    ///
    /// See [`Cursor::prepare`].
    pub fn write_bit(&mut self, bit: bool) -> BufferResult<()> {
        let byte = self.current_byte()?;
        let mask = 1_u8 << self.bit_offset;
        let byte = if bit { byte | mask } else { byte & !mask };
        self.buffer.write_at(self.position, &[byte])?;
        self.advance_bit();
        ok!()
    }

    /// Writes the low `count` bits (`1..=32`) of `value`, bit 0 first, and advances.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidCount`] if `count` is out of bounds, or see
    /// [`Cursor::prepare`].
    pub fn write_bits(&mut self, value: u32, count: u8) -> BufferResult<()> {
        check_bit_count("write_bits", count)?;
        for index in 0..count {
            self.write_bit((value >> index) & 1 == 1)?;
        }
        ok!()
    }

    /// Writes zero bits up to the next byte boundary. Returns the number of bits
    /// written.
    ///
    /// # Errors
    ///
    /// See [`Cursor::prepare`].
    pub fn pad_to_byte(&mut self) -> BufferResult<u8> {
        let mut padded = 0;
        while self.bit_offset != 0 {
            self.write_bit(false)?;
            padded += 1;
        }
        Ok(padded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Buffer, assert_eq2};
    use test_case::test_case;

    #[test]
    fn test_read_bits_lsb_first() {
        let buffer = Buffer::from_static(&[0b1010_1101, 0b0000_0001]);
        let mut cursor = buffer.reader();
        assert!(cursor.read_bit().unwrap());
        assert!(!cursor.read_bit().unwrap());
        assert_eq2!(cursor.read_bits(3).unwrap(), 0b011);
        assert_eq2!(cursor.bit_offset(), 5);
        // Crosses the byte boundary: bits 5..8 of byte 0, then bit 0 of byte 1.
        assert_eq2!(cursor.read_bits(4).unwrap(), 0b1101);
        assert_eq2!(cursor.position(), 1);
        assert_eq2!(cursor.bit_offset(), 1);
    }

    #[test]
    fn test_write_then_read_bits() {
        let mut buffer = Buffer::new();
        {
            let mut cursor = buffer.modifier();
            cursor.write_bits(0b101, 3).unwrap();
            cursor.write_bits(0x1FF, 9).unwrap();
            assert_eq2!(cursor.pad_to_byte().unwrap(), 4);
            cursor.write_u8(0xAA).unwrap();
        }
        assert_eq2!(buffer.len(), 3);

        let mut cursor = buffer.reader();
        assert_eq2!(cursor.read_bits(3).unwrap(), 0b101);
        assert_eq2!(cursor.read_bits(9).unwrap(), 0x1FF);
        assert_eq2!(cursor.align_to_byte(), 4);
        assert_eq2!(cursor.read_u8().unwrap(), 0xAA);
    }

    #[test]
    fn test_write_bit_preserves_neighbors() {
        let mut buffer = Buffer::from_vec(vec![0b1111_0000]);
        let mut cursor = buffer.writer();
        cursor.write_bit(true).unwrap();
        cursor.write_bit(false).unwrap();
        drop(cursor);
        assert_eq2!(buffer.to_vec().unwrap(), vec![0b1111_0001]);
    }

    #[test]
    fn test_read_32_bits() {
        let buffer = Buffer::from_static(&[0x78, 0x56, 0x34, 0x12]);
        assert_eq2!(buffer.reader().read_bits(32).unwrap(), 0x1234_5678);
    }

    #[test_case(0 ; "zero")]
    #[test_case(33 ; "too many")]
    fn test_invalid_bit_count(count: u8) {
        let buffer = Buffer::from_static(&[0; 8]);
        let it = buffer.reader().read_bits(count);
        assert!(it.is_err_and(|it| it.is_precondition()));
    }
}
