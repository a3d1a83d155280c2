// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use strum_macros::{Display, EnumString};

pub const LINE_FEED_BYTE: u8 = b'\n';
pub const CARRIAGE_RETURN_BYTE: u8 = b'\r';

/// Line terminator written by the text helpers of a [`crate::Cursor`]. Parsing ignores
/// this setting and treats `\r`, `\n` and `\r\n` uniformly.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Newline {
    /// `\r\n` on Windows, `\n` everywhere else.
    #[default]
    Native,
    /// `\n`.
    Unix,
    /// `\r`, classic Mac OS.
    #[strum(to_string = "mac", serialize = "legacy-mac")]
    Mac,
    /// `\r\n`.
    #[strum(to_string = "windows", serialize = "crlf")]
    Windows,
}

impl Newline {
    #[must_use]
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            Newline::Native => {
                if cfg!(windows) {
                    b"\r\n"
                } else {
                    b"\n"
                }
            }
            Newline::Unix => b"\n",
            Newline::Mac => b"\r",
            Newline::Windows => b"\r\n",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_eq2;
    use std::str::FromStr;
    use test_case::test_case;

    #[test_case(Newline::Unix, b"\n")]
    #[test_case(Newline::Mac, b"\r")]
    #[test_case(Newline::Windows, b"\r\n")]
    fn test_as_bytes(newline: Newline, expected: &[u8]) {
        assert_eq2!(newline.as_bytes(), expected);
    }

    #[test]
    fn test_parse() {
        assert_eq2!(Newline::from_str("crlf").unwrap(), Newline::Windows);
        assert_eq2!(Newline::from_str("Unix").unwrap(), Newline::Unix);
        assert!(Newline::from_str("vms").is_err());
    }
}
