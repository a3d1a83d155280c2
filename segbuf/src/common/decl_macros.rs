// Copyright (c) 2022-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

/// Wrapper for [`pretty_assertions::assert_eq!`] macro.
#[macro_export]
macro_rules! assert_eq2 {
    ($($params:tt)*) => {
        pretty_assertions::assert_eq!($($params)*)
    };
}

/// Syntactic sugar that helps having to write `Ok(())` or `Ok(it)` repeatedly.
///
/// ```
/// use r3bl_segbuf::{ok, BufferResult};
/// fn noop() -> BufferResult<()> { ok!() }
/// fn answer() -> BufferResult<u8> { ok!(42) }
/// # assert!(noop().is_ok());
/// # assert_eq!(answer().unwrap(), 42);
/// ```
#[macro_export]
macro_rules! ok {
    // No args.
    () => {
        Ok(())
    };
    // With arg.
    ($value:expr) => {
        Ok($value)
    };
}
