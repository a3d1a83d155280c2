// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use strum_macros::{Display, EnumString};

/// Byte order used by the typed numeric reads and writes of a [`crate::Cursor`]. Raw
/// byte copies are never affected by this setting.
///
/// Parses from configuration strings, case insensitively:
///
/// ```
/// use r3bl_segbuf::Endianness;
/// use std::str::FromStr;
/// assert_eq!(Endianness::from_str("network").unwrap(), Endianness::Big);
/// assert_eq!(Endianness::Little.to_string(), "little");
/// ```
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Endianness {
    /// Whatever the host uses.
    #[default]
    #[strum(to_string = "native", serialize = "host")]
    Native,
    Little,
    #[strum(to_string = "big", serialize = "network")]
    Big,
}

impl Endianness {
    /// Collapses [`Endianness::Native`] into the concrete order of the host.
    #[must_use]
    pub fn resolved(self) -> Self {
        match self {
            Endianness::Native => {
                if cfg!(target_endian = "big") {
                    Endianness::Big
                } else {
                    Endianness::Little
                }
            }
            it => it,
        }
    }
}

/// Bridges the primitive numeric types to their `to_*_bytes` / `from_*_bytes`
/// functions so that typed cursor I/O can be written once.
pub trait ByteOrdered: Sized + Copy {
    const SIZE: usize;

    /// Decodes from exactly [`Self::SIZE`] bytes.
    fn decode(bytes: &[u8], order: Endianness) -> Self;

    /// Encodes into exactly [`Self::SIZE`] bytes.
    fn encode(self, bytes: &mut [u8], order: Endianness);
}

macro_rules! impl_byte_ordered {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ByteOrdered for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                fn decode(bytes: &[u8], order: Endianness) -> Self {
                    let mut raw = [0_u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(&bytes[..Self::SIZE]);
                    match order.resolved() {
                        Endianness::Big => <$ty>::from_be_bytes(raw),
                        _ => <$ty>::from_le_bytes(raw),
                    }
                }

                fn encode(self, bytes: &mut [u8], order: Endianness) {
                    let raw = match order.resolved() {
                        Endianness::Big => self.to_be_bytes(),
                        _ => self.to_le_bytes(),
                    };
                    bytes[..Self::SIZE].copy_from_slice(&raw);
                }
            }
        )*
    };
}

impl_byte_ordered!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);
