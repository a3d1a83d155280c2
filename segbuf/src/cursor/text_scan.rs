// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Text scanning primitives.
//!
//! Parsing is newline agnostic: `\r`, `\n` and `\r\n` all end a line, whatever
//! [`crate::Newline`] the buffer is configured with. Tokens are returned as views
//! ([`Buffer::extract`]) of the scanned buffer, so no bytes are copied.
//!
//! None of these grow the buffer: the end of the range is the end of the text.

use crate::{Buffer, BufferResult, ByteRange, BytePos, CARRIAGE_RETURN_BYTE, Cursor,
            CursorMode, LINE_FEED_BYTE, ok};

/// Result of [`Cursor::parse_unsigned`] and [`Cursor::parse_signed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedInt<T> {
    /// The parsed value, clamped to the caller's bounds.
    pub value: T,
    /// Bytes consumed, including a sign. 0 means there was no number.
    pub consumed: usize,
    /// `true` if `value` was clamped.
    pub overflowed: bool,
}

#[must_use]
pub fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r' | 0x0B | 0x0C)
}

#[must_use]
pub fn is_line_end(byte: u8) -> bool { byte == LINE_FEED_BYTE || byte == CARRIAGE_RETURN_BYTE }

#[must_use]
pub fn is_path_separator(byte: u8) -> bool { byte == b'/' || byte == b'\\' }

impl<M: CursorMode> Cursor<'_, M> {
    /// Advances past bytes matching `predicate`. Returns how many were skipped.
    fn skip_while(&mut self, predicate: impl Fn(u8) -> bool) -> BufferResult<usize> {
        self.require_aligned()?;
        let mut skipped = 0;
        while let Some(byte) = self.peek_u8()? {
            if !predicate(byte) {
                break;
            }
            self.position += 1;
            skipped += 1;
        }
        Ok(skipped)
    }

    /// Advances if the next byte is `byte`.
    fn skip_byte(&mut self, byte: u8) -> BufferResult<bool> {
        if self.peek_u8()? == Some(byte) {
            self.position += 1;
            return ok!(true);
        }
        ok!(false)
    }

    fn view(&self, start: BytePos, end: BytePos) -> BufferResult<Buffer> {
        self.buffer.extract(ByteRange::from_bounds(start, end))
    }

    /// Returns the number of bytes skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if materializing fails.
    pub fn skip_whitespace(&mut self) -> BufferResult<usize> { self.skip_while(is_whitespace) }

    /// Skips whitespace, then `delimiter` if it is next. Returns `true` if a delimiter
    /// was skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if materializing fails.
    pub fn skip_delimiter(&mut self, delimiter: u8) -> BufferResult<bool> {
        if !is_whitespace(delimiter) {
            self.skip_whitespace()?;
        }
        self.skip_byte(delimiter)
    }

    /// The next line, without its terminator. The terminator (`\r`, `\n` or `\r\n`) is
    /// consumed and the line counter incremented. With `skip_empty`, empty lines are
    /// consumed (and counted) without being returned. [`None`] at the end of the text.
    ///
    /// # Errors
    ///
    /// Returns an error if materializing fails.
    pub fn parse_line(&mut self, skip_empty: bool) -> BufferResult<Option<Buffer>> {
        loop {
            if self.peek_u8()?.is_none() {
                return Ok(None);
            }
            let start = self.position;
            self.skip_while(|it| !is_line_end(it))?;
            let end = self.position;

            // Any of CR, LF, CRLF.
            self.skip_byte(CARRIAGE_RETURN_BYTE)?;
            self.skip_byte(LINE_FEED_BYTE)?;
            self.lines += 1;

            if skip_empty && start == end {
                continue;
            }
            return self.view(start, end).map(Some);
        }
    }

    /// The next whitespace delimited token. [`None`] if only whitespace is left.
    ///
    /// # Errors
    ///
    /// Returns an error if materializing fails.
    pub fn parse_token(&mut self) -> BufferResult<Option<Buffer>> {
        self.skip_whitespace()?;
        let start = self.position;
        if self.skip_while(|it| !is_whitespace(it))? == 0 {
            return Ok(None);
        }
        self.view(start, self.position).map(Some)
    }

    /// The next token ending at `delimiter` (which is consumed) or at the end of the
    /// line (which is not). Surrounding whitespace is trimmed, so `"a , b"` yields
    /// `"a"` and `"b"`. Two delimiters in a row yield an empty token. [`None`] at the end
    /// of the text.
    ///
    /// # Errors
    ///
    /// Returns an error if materializing fails.
    pub fn parse_token_with_delimiter(&mut self, delimiter: u8) -> BufferResult<Option<Buffer>> {
        self.skip_while(|it| it == b' ' || it == b'\t')?;
        if self.peek_u8()?.is_none_or(is_line_end) {
            return Ok(None);
        }
        let start = self.position;
        let mut end = start;
        while let Some(byte) = self.peek_u8()? {
            if byte == delimiter || is_line_end(byte) {
                break;
            }
            self.position += 1;
            if !is_whitespace(byte) {
                end = self.position;
            }
        }
        self.skip_byte(delimiter)?;
        self.view(start, end).map(Some)
    }

    /// The next component of a path, separated by `/` or `\`. Leading separators are
    /// skipped. [`None`] if only separators are left.
    ///
    /// # Errors
    ///
    /// Returns an error if materializing fails.
    pub fn parse_path_component(&mut self) -> BufferResult<Option<Buffer>> {
        self.skip_while(is_path_separator)?;
        let start = self.position;
        if self.skip_while(|it| !is_path_separator(it))? == 0 {
            return Ok(None);
        }
        self.view(start, self.position).map(Some)
    }

    /// Parses up to `max_digits` decimal digits. A value above `max` is clamped to
    /// `max`, the remaining digits are still consumed, and a warning is logged.
    ///
    /// # Errors
    ///
    /// Returns an error if materializing fails.
    pub fn parse_unsigned(&mut self, max_digits: usize, max: u64) -> BufferResult<ParsedInt<u64>> {
        let (magnitude, consumed, overflowed) = self.parse_digits(max_digits, u128::from(max))?;
        let value = u64::try_from(magnitude).unwrap_or(max);
        if overflowed {
            tracing::warn!(
                message = "Clamped unsigned integer",
                max,
                consumed,
                position = self.position
            );
        }
        Ok(ParsedInt {
            value,
            consumed,
            overflowed,
        })
    }

    /// Parses an optional `+` or `-` followed by up to `max_digits` decimal digits. A
    /// value outside of `[min, max]` is clamped, the remaining digits are still
    /// consumed, and a warning is logged. A sign that isn't followed by a digit isn't
    /// consumed.
    ///
    /// # Errors
    ///
    /// Returns an error if materializing fails.
    pub fn parse_signed(&mut self, max_digits: usize, min: i64, max: i64) -> BufferResult<ParsedInt<i64>> {
        let start = self.position;
        let negative = match self.peek_u8()? {
            Some(b'-') => true,
            Some(b'+') => false,
            _ => return self.parse_signed_digits(max_digits, min, max, false, 0),
        };
        self.position += 1;
        let parsed = self.parse_signed_digits(max_digits, min, max, negative, 1)?;
        if parsed.consumed == 0 {
            self.position = start;
        }
        Ok(parsed)
    }

    fn parse_signed_digits(
        &mut self,
        max_digits: usize,
        min: i64,
        max: i64,
        negative: bool,
        sign_len: usize,
    ) -> BufferResult<ParsedInt<i64>> {
        let limit = if negative {
            (-i128::from(min)).max(0)
        } else {
            i128::from(max).max(0)
        };
        let limit = u128::try_from(limit).unwrap_or_default();
        let (magnitude, digits, mut overflowed) = self.parse_digits(max_digits, limit)?;
        if digits == 0 {
            return Ok(ParsedInt {
                value: 0,
                consumed: 0,
                overflowed: false,
            });
        }

        let magnitude = i128::try_from(magnitude).unwrap_or(i128::MAX);
        let signed = if negative { -magnitude } else { magnitude };
        let value = if signed < i128::from(min) {
            overflowed = true;
            min
        } else if signed > i128::from(max) {
            overflowed = true;
            max
        } else {
            i64::try_from(signed).unwrap_or(max)
        };

        let consumed = sign_len + digits;
        if overflowed {
            tracing::warn!(
                message = "Clamped signed integer",
                min,
                max,
                consumed,
                position = self.position
            );
        }
        Ok(ParsedInt {
            value,
            consumed,
            overflowed,
        })
    }

    /// Returns `(magnitude clamped to limit, digits consumed, clamped)`.
    fn parse_digits(&mut self, max_digits: usize, limit: u128) -> BufferResult<(u128, usize, bool)> {
        self.require_aligned()?;
        let mut magnitude = 0_u128;
        let mut digits = 0;
        let mut overflowed = false;
        while digits < max_digits {
            let Some(byte) = self.peek_u8()? else { break };
            if !byte.is_ascii_digit() {
                break;
            }
            if !overflowed {
                magnitude = magnitude * 10 + u128::from(byte - b'0');
                if magnitude > limit {
                    magnitude = limit;
                    overflowed = true;
                }
            }
            self.position += 1;
            digits += 1;
        }
        Ok((magnitude, digits, overflowed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_eq2;
    use test_case::test_case;

    fn text(option: Option<Buffer>) -> Option<String> {
        option.map(|it| it.to_string_lossy().unwrap())
    }

    #[test]
    fn test_parse_line_terminators() {
        let buffer = Buffer::from_static(b"one\rtwo\nthree\r\n\r\nfour");
        let mut cursor = buffer.reader();
        assert_eq2!(text(cursor.parse_line(false).unwrap()), Some("one".to_string()));
        assert_eq2!(text(cursor.parse_line(false).unwrap()), Some("two".to_string()));
        assert_eq2!(text(cursor.parse_line(false).unwrap()), Some("three".to_string()));
        assert_eq2!(text(cursor.parse_line(false).unwrap()), Some(String::new()));
        assert_eq2!(text(cursor.parse_line(false).unwrap()), Some("four".to_string()));
        assert_eq2!(cursor.parse_line(false).unwrap().is_none(), true);
        assert_eq2!(cursor.lines(), 5);
    }

    #[test]
    fn test_parse_line_skip_empty() {
        let buffer = Buffer::from_static(b"\n\na\n\nb\n\n");
        let mut cursor = buffer.reader();
        assert_eq2!(text(cursor.parse_line(true).unwrap()), Some("a".to_string()));
        assert_eq2!(text(cursor.parse_line(true).unwrap()), Some("b".to_string()));
        assert_eq2!(cursor.parse_line(true).unwrap().is_none(), true);
        assert_eq2!(cursor.lines(), 6);
    }

    #[test]
    fn test_parse_token() {
        let buffer = Buffer::from_static(b"  alpha\tbeta\n gamma  ");
        let mut cursor = buffer.reader();
        let mut tokens = vec![];
        while let Some(token) = cursor.parse_token().unwrap() {
            tokens.push(token.to_string_lossy().unwrap());
        }
        assert_eq2!(tokens, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_parse_token_with_delimiter() {
        let buffer = Buffer::from_static(b"a , bc,,d\nnext");
        let mut cursor = buffer.reader();
        let mut tokens = vec![];
        while let Some(token) = cursor.parse_token_with_delimiter(b',').unwrap() {
            tokens.push(token.to_string_lossy().unwrap());
        }
        assert_eq2!(tokens, vec!["a", "bc", "", "d"]);
        assert_eq2!(cursor.peek_u8().unwrap(), Some(b'\n'));
    }

    #[test]
    fn test_parse_path_component() {
        let buffer = Buffer::from_static(b"/usr\\local//bin/");
        let mut cursor = buffer.reader();
        let mut parts = vec![];
        while let Some(part) = cursor.parse_path_component().unwrap() {
            parts.push(part.to_string_lossy().unwrap());
        }
        assert_eq2!(parts, vec!["usr", "local", "bin"]);
    }

    #[test]
    fn test_skip_delimiter() {
        let buffer = Buffer::from_static(b"  =x");
        let mut cursor = buffer.reader();
        assert!(!cursor.skip_delimiter(b':').unwrap());
        assert!(cursor.skip_delimiter(b'=').unwrap());
        assert_eq2!(cursor.peek_u8().unwrap(), Some(b'x'));
    }

    #[test]
    fn test_tokens_are_views() {
        let buffer = Buffer::from_vec(b"word".to_vec());
        let token = buffer.reader().parse_token().unwrap().unwrap();
        assert!(token.is_fixed());
        let source = token.source().unwrap();
        assert!(source.cache().is_some_and(|it| it.same_as(&buffer)));
    }

    #[test_case(b"12345", 10, 100 => (100, 5, true) ; "clamps and consumes all digits")]
    #[test_case(b"42abc", 10, 100 => (42, 2, false) ; "stops at non digit")]
    #[test_case(b"123456", 3, u64::MAX => (123, 3, false) ; "max digits")]
    #[test_case(b"x", 10, 100 => (0, 0, false) ; "no digits")]
    #[test_case(b"99999999999999999999999", 30, u64::MAX => (u64::MAX, 23, true) ; "beyond u64")]
    fn test_parse_unsigned(input: &'static [u8], max_digits: usize, max: u64) -> (u64, usize, bool) {
        let buffer = Buffer::from_static(input);
        let it = buffer.reader().parse_unsigned(max_digits, max).unwrap();
        (it.value, it.consumed, it.overflowed)
    }

    #[test_case(b"-42", -100, 100 => (-42, 3, false) ; "negative")]
    #[test_case(b"+7", -100, 100 => (7, 2, false) ; "explicit plus")]
    #[test_case(b"-500", -100, 100 => (-100, 4, true) ; "clamps to min")]
    #[test_case(b"500", -100, 100 => (100, 3, true) ; "clamps to max")]
    #[test_case(b"-5", 0, 100 => (0, 2, true) ; "negative below zero min")]
    #[test_case(b"-x", -100, 100 => (0, 0, false) ; "lone sign")]
    fn test_parse_signed(input: &'static [u8], min: i64, max: i64) -> (i64, usize, bool) {
        let buffer = Buffer::from_static(input);
        let mut cursor = buffer.reader();
        let it = cursor.parse_signed(10, min, max).unwrap();
        if it.consumed == 0 {
            assert_eq2!(cursor.position(), 0);
        }
        (it.value, it.consumed, it.overflowed)
    }
}
