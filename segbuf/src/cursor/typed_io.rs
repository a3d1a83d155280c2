// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Typed numeric reads and writes. The buffer's [`crate::Endianness`] is applied to
//! every value; raw byte copies ([`Cursor::read_bytes`]) are never converted.

use crate::{BufferResult, ByteOrdered, Cursor, CursorMode, Writable};

/// Largest [`ByteOrdered::SIZE`].
const MAX_VALUE_SIZE: usize = 8;

macro_rules! typed_reads {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            #[doc = concat!("Reads a `", stringify!($ty), "` and advances.")]
            ///
            /// # Errors
            ///
            /// See [`Cursor::read_bytes`].
            pub fn $name(&mut self) -> BufferResult<$ty> { self.read::<$ty>() }
        )*
    };
}

macro_rules! typed_writes {
    ($($name:ident => $ty:ty),* $(,)?) => {
        $(
            #[doc = concat!("Writes a `", stringify!($ty), "` and advances.")]
            ///
            /// # Errors
            ///
            /// See [`Cursor::write_bytes`].
            pub fn $name(&mut self, value: $ty) -> BufferResult<()> { self.write::<$ty>(value) }
        )*
    };
}

impl<M: CursorMode> Cursor<'_, M> {
    /// Reads `T::SIZE` bytes, converting from the buffer's byte order.
    ///
    /// # Errors
    ///
    /// See [`Cursor::read_bytes`].
    pub fn read<T: ByteOrdered>(&mut self) -> BufferResult<T> {
        let mut raw = [0_u8; MAX_VALUE_SIZE];
        let bytes = &mut raw[..T::SIZE];
        self.read_bytes(bytes)?;
        Ok(T::decode(bytes, self.buffer.endianness()))
    }

    typed_reads! {
        read_u8 => u8,
        read_i8 => i8,
        read_u16 => u16,
        read_i16 => i16,
        read_u32 => u32,
        read_i32 => i32,
        read_u64 => u64,
        read_i64 => i64,
        read_f32 => f32,
        read_f64 => f64,
    }
}

impl<M: Writable> Cursor<'_, M> {
    /// Writes `T::SIZE` bytes, converting to the buffer's byte order.
    ///
    /// # Errors
    ///
    /// See [`Cursor::write_bytes`].
    pub fn write<T: ByteOrdered>(&mut self, value: T) -> BufferResult<()> {
        let mut raw = [0_u8; MAX_VALUE_SIZE];
        let bytes = &mut raw[..T::SIZE];
        value.encode(bytes, self.buffer.endianness());
        self.write_bytes(bytes)
    }

    typed_writes! {
        write_u8 => u8,
        write_i8 => i8,
        write_u16 => u16,
        write_i16 => i16,
        write_u32 => u32,
        write_i32 => i32,
        write_u64 => u64,
        write_i64 => i64,
        write_f32 => f32,
        write_f64 => f64,
    }
}
