// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach.
pub mod bit_io;
pub mod cursor_impl;
pub mod text_scan;
pub mod text_write;
pub mod typed_io;

// Re-export.
pub use bit_io::*;
pub use cursor_impl::*;
pub use text_scan::*;
