// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach.
pub mod segment_tree;

// Re-export.
pub use segment_tree::*;
