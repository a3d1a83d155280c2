// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// Attach.
pub mod memory_block;

// Re-export.
pub use memory_block::*;
