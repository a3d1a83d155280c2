// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach.
pub mod base64;
pub mod buffer_impl;
pub mod buffer_ops;

// Re-export.
pub use buffer_impl::*;
pub use buffer_ops::*;
