// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach.
pub mod source_impl;

// Re-export.
pub use source_impl::*;
