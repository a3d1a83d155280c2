// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Base64 (standard alphabet) encoding and decoding, implemented with cursors so that
//! both sides can be lazily materialized buffers of any size.

use crate::{Buffer, BufferError, BufferResult, Cursor, Modify, is_whitespace,
            ok};

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
const PADDING: u8 = b'=';

fn sextet_of(byte: u8) -> Option<u8> {
    match byte {
        b'A'..=b'Z' => Some(byte - b'A'),
        b'a'..=b'z' => Some(byte - b'a' + 26),
        b'0'..=b'9' => Some(byte - b'0' + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}

impl Buffer {
    /// Encodes every byte into a new buffer, 3 bytes to 4 characters. With `pad`, a
    /// trailing partial group is completed with `=`.
    ///
    /// ```
    /// use r3bl_segbuf::Buffer;
    /// let buffer = Buffer::from_static(&[0x4D, 0x61]);
    /// assert_eq!(buffer.to_base64(true).unwrap().to_string_lossy().unwrap(), "TWE=");
    /// assert_eq!(buffer.to_base64(false).unwrap().to_string_lossy().unwrap(), "TWE");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if materializing fails.
    pub fn to_base64(&self, pad: bool) -> BufferResult<Buffer> {
        let mut encoded = Buffer::with_config(self.config().with_secure(false));
        {
            let mut reader = self.reader();
            let mut writer = encoded.modifier();
            let mut remaining = self.len();
            while remaining > 0 {
                let count = remaining.min(3);
                let mut group = [0_u8; 3];
                reader.read_bytes(&mut group[..count])?;
                encode_group(&mut writer, group, count, pad)?;
                remaining -= count;
            }
        }
        encoded.fix_range();
        Ok(encoded)
    }

    /// # Errors
    ///
    /// Returns an error if materializing fails.
    pub fn to_base64_string(&self, pad: bool) -> BufferResult<String> {
        self.to_base64(pad)?.to_string_lossy()
    }

    /// Decodes `encoded` into a new buffer. Whitespace is ignored, padding is optional.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::MalformedBase64`] for characters outside of the alphabet,
    /// data after padding, or a dangling single character.
    pub fn from_base64(encoded: &Buffer) -> BufferResult<Buffer> {
        let mut decoded = Buffer::new();
        {
            let mut reader = encoded.reader();
            let mut writer = decoded.modifier();
            let mut quad = [0_u8; 4];
            let mut filled = 0;
            let mut padding_seen = false;

            while let Some(byte) = reader.peek_u8()? {
                let position = reader.position();
                reader.step(1);
                if is_whitespace(byte) {
                    continue;
                }
                if byte == PADDING {
                    padding_seen = true;
                    continue;
                }
                if padding_seen {
                    return Err(BufferError::MalformedBase64 {
                        position,
                        reason: "data after padding",
                    });
                }
                quad[filled] = sextet_of(byte).ok_or(BufferError::MalformedBase64 {
                    position,
                    reason: "character outside of the alphabet",
                })?;
                filled += 1;
                if filled == 4 {
                    decode_quad(&mut writer, quad, filled)?;
                    filled = 0;
                }
            }

            match filled {
                0 => {}
                1 => {
                    return Err(BufferError::MalformedBase64 {
                        position: reader.position(),
                        reason: "dangling character",
                    });
                }
                _ => decode_quad(&mut writer, quad, filled)?,
            }
        }
        decoded.fix_range();
        Ok(decoded)
    }

    /// # Errors
    ///
    /// See [`Buffer::from_base64`].
    pub fn from_base64_str(encoded: &str) -> BufferResult<Buffer> {
        Self::from_base64(&Buffer::from_vec(encoded.as_bytes().to_vec()))
    }
}

fn encode_group(
    writer: &mut Cursor<'_, Modify>,
    group: [u8; 3],
    count: usize,
    pad: bool,
) -> BufferResult<()> {
    let sextets = [
        group[0] >> 2,
        ((group[0] & 0b11) << 4) | (group[1] >> 4),
        ((group[1] & 0b1111) << 2) | (group[2] >> 6),
        group[2] & 0b11_1111,
    ];
    let mut chars = [PADDING; 4];
    for (char, sextet) in chars.iter_mut().zip(sextets).take(count + 1) {
        *char = ALPHABET[usize::from(sextet)];
    }
    let len = if pad { 4 } else { count + 1 };
    writer.write_bytes(&chars[..len])
}

/// Writes the `filled - 1` bytes that `filled` sextets encode.
fn decode_quad(
    writer: &mut Cursor<'_, Modify>,
    quad: [u8; 4],
    filled: usize,
) -> BufferResult<()> {
    let bytes = [
        (quad[0] << 2) | (quad[1] >> 4),
        (quad[1] << 4) | (quad[2] >> 2),
        (quad[2] << 6) | quad[3],
    ];
    writer.write_bytes(&bytes[..filled - 1])?;
    ok!()
}
