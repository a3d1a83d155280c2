// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach.
pub mod byte_range;
pub mod byte_order;
pub mod newline;

// Re-export.
pub use byte_range::*;
pub use byte_order::*;
pub use newline::*;
