// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Text writing helpers. Unlike parsing, these honor the buffer's [`crate::Newline`].

use std::fmt::Display;

use crate::{BufferResult, Cursor, Writable};

impl<M: Writable> Cursor<'_, M> {
    /// # Errors
    ///
    /// See [`Cursor::write_bytes`].
    pub fn write_str(&mut self, text: &str) -> BufferResult<()> { self.write_bytes(text.as_bytes()) }

    /// Writes the buffer's newline sequence.
    ///
    /// # Errors
    ///
    /// See [`Cursor::write_bytes`].
    pub fn write_newline(&mut self) -> BufferResult<()> {
        self.write_bytes(self.buffer.newline().as_bytes())
    }

    /// Writes `text` followed by the buffer's newline sequence.
    ///
    /// # Errors
    ///
    /// See [`Cursor::write_bytes`].
    pub fn write_line(&mut self, text: &str) -> BufferResult<()> {
        self.write_str(text)?;
        self.write_newline()
    }

    /// Writes the [`Display`] form of `value`, eg: a decimal number.
    ///
    /// # Errors
    ///
    /// See [`Cursor::write_bytes`].
    pub fn write_display(&mut self, value: &impl Display) -> BufferResult<()> {
        self.write_str(&value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Buffer, BufferConfig, Newline, assert_eq2};
    use test_case::test_case;

    #[test_case(Newline::Unix, b"a\nb\n" ; "unix")]
    #[test_case(Newline::Mac, b"a\rb\r" ; "mac")]
    #[test_case(Newline::Windows, b"a\r\nb\r\n" ; "windows")]
    fn test_write_line(newline: Newline, expected: &[u8]) {
        let mut buffer = Buffer::with_config(BufferConfig::default().with_newline(newline));
        {
            let mut cursor = buffer.modifier();
            cursor.write_line("a").unwrap();
            cursor.write_line("b").unwrap();
        }
        assert_eq2!(buffer.to_vec().unwrap(), expected.to_vec());
    }

    #[test]
    fn test_written_lines_parse_back() {
        let mut buffer = Buffer::with_config(BufferConfig::default().with_newline(Newline::Windows));
        {
            let mut cursor = buffer.modifier();
            cursor.write_str("answer=").unwrap();
            cursor.write_display(&42).unwrap();
            cursor.write_newline().unwrap();
        }
        let mut cursor = buffer.reader();
        let line = cursor.parse_line(false).unwrap().unwrap();
        assert_eq2!(line.to_string_lossy().unwrap(), "answer=42");

        let mut fields = line.reader();
        fields.parse_token_with_delimiter(b'=').unwrap();
        assert_eq2!(fields.parse_unsigned(10, 100).unwrap().value, 42);
    }
}
